use std::collections::HashSet;

use winit::event::ElementState;
use winit::keyboard::{KeyCode, PhysicalKey};

/// DOM-style code for a physical key (`ArrowLeft`, `Space`, `Digit2`).
///
/// winit's `KeyCode` variants already follow the W3C `code` names, so the
/// debug name is the wire name.
pub fn key_code_name(key: PhysicalKey) -> Option<String> {
    match key {
        PhysicalKey::Code(code) => Some(format!("{code:?}")),
        PhysicalKey::Unidentified(_) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyTransition {
    Down,
    Up,
}

/// Collapses OS auto-repeat so scenes see one down per physical press.
#[derive(Debug, Default)]
pub(crate) struct HeldKeys {
    down: HashSet<KeyCode>,
}

impl HeldKeys {
    pub(crate) fn transition(
        &mut self,
        key: PhysicalKey,
        state: ElementState,
    ) -> Option<KeyTransition> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };
        match state {
            ElementState::Pressed => self.down.insert(code).then_some(KeyTransition::Down),
            ElementState::Released => self.down.remove(&code).then_some(KeyTransition::Up),
        }
    }

    pub(crate) fn release_all(&mut self) -> Vec<KeyCode> {
        self.down.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::NativeKeyCode;

    use super::*;

    #[test]
    fn key_codes_use_dom_names() {
        assert_eq!(
            key_code_name(PhysicalKey::Code(KeyCode::ArrowLeft)).as_deref(),
            Some("ArrowLeft")
        );
        assert_eq!(
            key_code_name(PhysicalKey::Code(KeyCode::Space)).as_deref(),
            Some("Space")
        );
        assert_eq!(
            key_code_name(PhysicalKey::Code(KeyCode::Digit2)).as_deref(),
            Some("Digit2")
        );
        assert_eq!(
            key_code_name(PhysicalKey::Code(KeyCode::KeyA)).as_deref(),
            Some("KeyA")
        );
        assert_eq!(
            key_code_name(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            None
        );
    }

    #[test]
    fn held_key_does_not_repeat_down_edges() {
        let mut held = HeldKeys::default();
        let space = PhysicalKey::Code(KeyCode::Space);

        assert_eq!(
            held.transition(space, ElementState::Pressed),
            Some(KeyTransition::Down)
        );
        assert_eq!(held.transition(space, ElementState::Pressed), None);
        assert_eq!(
            held.transition(space, ElementState::Released),
            Some(KeyTransition::Up)
        );
        assert_eq!(held.transition(space, ElementState::Released), None);
        assert_eq!(
            held.transition(space, ElementState::Pressed),
            Some(KeyTransition::Down)
        );
    }

    #[test]
    fn release_all_clears_held_keys() {
        let mut held = HeldKeys::default();
        held.transition(PhysicalKey::Code(KeyCode::ArrowUp), ElementState::Pressed);

        assert_eq!(held.release_all(), vec![KeyCode::ArrowUp]);
        assert_eq!(
            held.transition(PhysicalKey::Code(KeyCode::ArrowUp), ElementState::Pressed),
            Some(KeyTransition::Down)
        );
    }
}
