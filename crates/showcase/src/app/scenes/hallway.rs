use futures::future;
use showcase_engine::{Scene, SceneError, SceneFuture};
use tracing::{debug, info};

use super::{Destination, GeometryWatch, PressedKeys, RoomSceneParams, SceneContext};

// Design-space measurements, scaled through the geometry engine for display.
const PLAYER_SPEED: f32 = 150.0;
const PLAYER_WIDTH: f32 = 32.0;
const PLAYER_START_X: f32 = 100.0;
const DOOR_WIDTH: f32 = 80.0;
const ELEVATOR_WIDTH: f32 = 100.0;
const ELEVATOR_MARGIN: f32 = 50.0;
const SIDE_MARGIN: f32 = 50.0;
const INTERACTION_DISTANCE: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Nearby {
    Door { room: u32 },
    Elevator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FloorSelector {
    selected: u32,
}

/// Door and elevator x positions for one floor, in screen pixels.
#[derive(Debug, Clone, PartialEq)]
struct ScreenLayout {
    door_x: Vec<f32>,
    elevator_x: f32,
}

pub(crate) struct HallwayScene {
    context: SceneContext,
    watch: GeometryWatch,
    keys: PressedKeys,
    floor: u32,
    floor_count: u32,
    /// Player position in design-space units.
    player_x: f32,
    nearby: Option<Nearby>,
    selector: Option<FloorSelector>,
    screen: ScreenLayout,
}

impl HallwayScene {
    pub(crate) fn new(
        context: SceneContext,
        floor: u32,
        from_room: Option<u32>,
    ) -> Result<Self, SceneError> {
        let floor_count = context.building.floor_count() as u32;
        if context.building.floor(floor).is_none() {
            return Err(SceneError::Construct(format!(
                "floor {floor} does not exist ({floor_count} floors)"
            )));
        }

        let watch = GeometryWatch::new(context.geometry.clone());
        let mut scene = Self {
            context,
            watch,
            keys: PressedKeys::default(),
            floor,
            floor_count,
            player_x: PLAYER_START_X,
            nearby: None,
            selector: None,
            screen: ScreenLayout {
                door_x: Vec::new(),
                elevator_x: 0.0,
            },
        };
        if let Some(room) = from_room {
            scene.player_x = scene.door_spacing() * room as f32 - PLAYER_WIDTH / 2.0;
        }
        scene.player_x = scene.clamp_to_corridor(scene.player_x);
        scene.refresh_screen_layout();
        Ok(scene)
    }

    fn base_width(&self) -> f32 {
        self.context.geometry.constants().base_width
    }

    fn rooms_per_floor(&self) -> u32 {
        self.context.building.room_count(self.floor) as u32
    }

    fn door_spacing(&self) -> f32 {
        self.base_width() / (self.rooms_per_floor() + 1) as f32
    }

    fn door_x(&self, room: u32) -> f32 {
        self.door_spacing() * room as f32 - DOOR_WIDTH / 2.0
    }

    fn elevator_x(&self) -> f32 {
        self.base_width() - ELEVATOR_WIDTH - ELEVATOR_MARGIN
    }

    fn clamp_to_corridor(&self, x: f32) -> f32 {
        let right = self.base_width() - PLAYER_WIDTH - SIDE_MARGIN;
        x.clamp(SIDE_MARGIN, right.max(SIDE_MARGIN))
    }

    fn refresh_screen_layout(&mut self) {
        let geometry = self.watch.geometry();
        self.screen = ScreenLayout {
            door_x: (1..=self.rooms_per_floor())
                .map(|room| geometry.scaled(self.door_x(room)))
                .collect(),
            elevator_x: geometry.scaled(self.elevator_x()),
        };
        debug!(floor = self.floor, scale = geometry.scale(), "hallway_layout_refreshed");
    }

    fn detect_nearby(&self) -> Option<Nearby> {
        let door = (1..=self.rooms_per_floor())
            .find(|&room| (self.player_x - self.door_x(room)).abs() < INTERACTION_DISTANCE)
            .map(|room| Nearby::Door { room });
        door.or_else(|| {
            ((self.player_x - self.elevator_x()).abs() < INTERACTION_DISTANCE)
                .then_some(Nearby::Elevator)
        })
    }

    fn interact(&mut self) {
        match self.nearby {
            Some(Nearby::Door { room }) => {
                match self.context.building.patron_in_room(self.floor, room) {
                    Some(patron) => {
                        info!(floor = self.floor, room, patron = %patron.id, "room_entering");
                        self.context
                            .navigator
                            .request(Destination::Room(RoomSceneParams {
                                floor: self.floor,
                                room,
                            }));
                    }
                    None => info!(floor = self.floor, room, "room_empty"),
                }
            }
            Some(Nearby::Elevator) => {
                if self.floor_count <= 1 {
                    info!("elevator_goes_nowhere");
                } else {
                    self.selector = Some(FloorSelector {
                        selected: self.floor,
                    });
                    debug!(floors = self.floor_count, "floor_selector_opened");
                }
            }
            None => {}
        }
    }

    /// Returns whether the selector consumed the key.
    fn handle_selector_key(&mut self, code: &str) -> bool {
        let Some(selector) = self.selector.as_mut() else {
            return false;
        };
        match code {
            "Escape" => self.selector = None,
            "ArrowUp" => selector.selected = selector.selected.saturating_sub(1).max(1),
            "ArrowDown" => selector.selected = (selector.selected + 1).min(self.floor_count),
            "Enter" => {
                let floor = selector.selected;
                self.select_floor(floor);
            }
            _ => match parse_digit(code) {
                Some(floor) if (1..=self.floor_count).contains(&floor) => self.select_floor(floor),
                _ => return false,
            },
        }
        true
    }

    fn select_floor(&mut self, floor: u32) {
        self.selector = None;
        if floor == self.floor {
            return;
        }
        info!(from = self.floor, to = floor, "elevator_floor_selected");
        self.context.navigator.request(Destination::Hallway {
            floor,
            from_room: None,
        });
    }
}

fn parse_digit(code: &str) -> Option<u32> {
    code.strip_prefix("Digit")?.parse().ok()
}

impl Scene for HallwayScene {
    fn name(&self) -> &str {
        "hallway"
    }

    fn enter(&mut self) -> SceneFuture<'_> {
        self.watch.attach();
        let occupied = (1..=self.rooms_per_floor())
            .filter(|&room| !self.context.building.is_room_empty(self.floor, room))
            .count();
        info!(floor = self.floor, occupied, "hallway_entered");
        Box::pin(future::ready(Ok(())))
    }

    fn update(&mut self, dt_seconds: f32) {
        if self.watch.take_stale() {
            self.refresh_screen_layout();
        }
        if self.selector.is_none() {
            let step = self.keys.horizontal_axis() * PLAYER_SPEED * dt_seconds;
            self.player_x = self.clamp_to_corridor(self.player_x + step);
        }
        let nearby = self.detect_nearby();
        if nearby != self.nearby {
            let screen_x = match nearby {
                Some(Nearby::Door { room }) => self.screen.door_x.get(room as usize - 1).copied(),
                Some(Nearby::Elevator) => Some(self.screen.elevator_x),
                None => None,
            };
            debug!(?nearby, ?screen_x, "hallway_focus_changed");
            self.nearby = nearby;
        }
    }

    fn handle_key_down(&mut self, code: &str) {
        self.keys.press(code);
        if self.handle_selector_key(code) {
            return;
        }
        if code == "Space" {
            self.interact();
        }
    }

    fn handle_key_up(&mut self, code: &str) {
        self.keys.release(code);
    }

    fn destroy(&mut self) {
        self.watch.detach();
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, patron};
    use super::*;

    fn hallway(patrons: Vec<showcase_engine::Patron>, floor: u32) -> (HallwayScene, SceneContext) {
        let context = context(patrons);
        let scene = HallwayScene::new(context.clone(), floor, None).expect("hallway");
        (scene, context)
    }

    fn walk_to(scene: &mut HallwayScene, x: f32) {
        scene.player_x = x;
        scene.update(0.0);
    }

    #[test]
    fn missing_floor_fails_construction() {
        let context = context(vec![patron("a", None)]);
        assert!(matches!(
            HallwayScene::new(context, 2, None),
            Err(SceneError::Construct(_))
        ));
    }

    #[test]
    fn arrows_move_player_within_corridor() {
        let (mut scene, _) = hallway(Vec::new(), 1);
        assert_eq!(scene.player_x, PLAYER_START_X);

        scene.handle_key_down("ArrowRight");
        scene.update(1.0);
        assert_eq!(scene.player_x, PLAYER_START_X + PLAYER_SPEED);

        scene.update(100.0);
        assert_eq!(scene.player_x, 1200.0 - PLAYER_WIDTH - SIDE_MARGIN);

        scene.handle_key_up("ArrowRight");
        scene.handle_key_down("ArrowLeft");
        scene.update(100.0);
        assert_eq!(scene.player_x, SIDE_MARGIN);
    }

    #[test]
    fn space_at_occupied_door_requests_room() {
        let (mut scene, context) = hallway(vec![patron("a", Some((1, 2)))], 1);

        let target = scene.door_x(2);
        walk_to(&mut scene, target);
        assert_eq!(scene.nearby, Some(Nearby::Door { room: 2 }));
        scene.handle_key_down("Space");

        assert_eq!(
            context.navigator.take(),
            Some(Destination::Room(RoomSceneParams { floor: 1, room: 2 }))
        );
    }

    #[test]
    fn space_at_empty_door_does_nothing() {
        let (mut scene, context) = hallway(vec![patron("a", Some((1, 2)))], 1);

        let target = scene.door_x(1);
        walk_to(&mut scene, target);
        scene.handle_key_down("Space");
        assert_eq!(context.navigator.peek(), None);
    }

    #[test]
    fn elevator_on_single_floor_building_opens_nothing() {
        let (mut scene, context) = hallway(vec![patron("a", None)], 1);

        let target = scene.elevator_x();
        walk_to(&mut scene, target);
        assert_eq!(scene.nearby, Some(Nearby::Elevator));
        scene.handle_key_down("Space");

        assert_eq!(scene.selector, None);
        assert_eq!(context.navigator.peek(), None);
    }

    #[test]
    fn floor_selector_accepts_arrows_enter_and_digits() {
        let patrons = (0..7).map(|index| patron(&format!("p{index}"), None)).collect();
        let (mut scene, context) = hallway(patrons, 1);
        assert_eq!(scene.floor_count, 3);

        let target = scene.elevator_x();
        walk_to(&mut scene, target);
        scene.handle_key_down("Space");
        assert_eq!(scene.selector, Some(FloorSelector { selected: 1 }));

        scene.handle_key_down("ArrowUp");
        assert_eq!(scene.selector, Some(FloorSelector { selected: 1 }));
        scene.handle_key_down("ArrowDown");
        scene.handle_key_down("ArrowDown");
        scene.handle_key_down("ArrowDown");
        assert_eq!(scene.selector, Some(FloorSelector { selected: 3 }));

        scene.handle_key_down("Enter");
        assert_eq!(scene.selector, None);
        assert_eq!(
            context.navigator.take(),
            Some(Destination::Hallway {
                floor: 3,
                from_room: None
            })
        );

        scene.handle_key_down("Space");
        scene.handle_key_down("Digit9");
        assert!(scene.selector.is_some());
        scene.handle_key_down("Digit2");
        assert_eq!(
            context.navigator.take(),
            Some(Destination::Hallway {
                floor: 2,
                from_room: None
            })
        );
    }

    #[test]
    fn selector_escape_and_same_floor_just_close() {
        let patrons = (0..4).map(|index| patron(&format!("p{index}"), None)).collect();
        let (mut scene, context) = hallway(patrons, 1);
        let target = scene.elevator_x();
        walk_to(&mut scene, target);

        scene.handle_key_down("Space");
        scene.handle_key_down("Escape");
        assert_eq!(scene.selector, None);

        scene.handle_key_down("Space");
        scene.handle_key_down("Digit1");
        assert_eq!(scene.selector, None);
        assert_eq!(context.navigator.peek(), None);
    }

    #[test]
    fn movement_is_frozen_while_selector_is_open() {
        let patrons = (0..4).map(|index| patron(&format!("p{index}"), None)).collect();
        let (mut scene, _) = hallway(patrons, 1);
        let target = scene.elevator_x();
        walk_to(&mut scene, target);
        scene.handle_key_down("Space");

        let before = scene.player_x;
        scene.handle_key_down("ArrowLeft");
        scene.update(1.0);
        assert_eq!(scene.player_x, before);
    }

    #[test]
    fn returning_from_room_starts_at_its_door() {
        let context = context(vec![patron("a", None), patron("b", None)]);
        let scene = HallwayScene::new(context, 1, Some(2)).expect("hallway");

        assert_eq!(scene.player_x, 600.0 - PLAYER_WIDTH / 2.0);
    }

    #[test]
    fn screen_layout_tracks_scale() {
        let (mut scene, context) = hallway(Vec::new(), 1);
        assert_eq!(scene.screen.door_x, vec![260.0, 560.0, 860.0]);

        let t0 = std::time::Instant::now();
        context
            .geometry
            .on_viewport_change(super::super::test_support::viewport(600, 400), t0);
        context
            .geometry
            .tick(t0 + std::time::Duration::from_millis(300));
        scene.watch.attach();
        scene.update(0.0);

        assert_eq!(scene.screen.door_x, vec![130.0, 280.0, 430.0]);
        assert_eq!(scene.screen.elevator_x, 525.0);
        scene.destroy();
    }
}
