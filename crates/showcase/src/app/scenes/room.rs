use futures::future;
use showcase_engine::{Patron, Scene, SceneError, SceneFuture};
use tracing::{debug, info};

use super::{Destination, GeometryWatch, PressedKeys, RoomSceneParams, SceneContext};

const PLAYER_SPEED: f32 = 150.0;
const PLAYER_WIDTH: f32 = 32.0;
const PLAYER_START_X: f32 = 40.0;
const NPC_SPEED: f32 = 50.0;
const POSTER_WIDTH: f32 = 60.0;
const SIDE_MARGIN: f32 = 25.0;
const INTERACTION_DISTANCE: f32 = 50.0;
const DIALOG_FONT_SIZE: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Npc,
    Item,
    Poster,
}

/// One patron's room. Positions are design-space units along the floor.
pub(crate) struct RoomScene {
    context: SceneContext,
    watch: GeometryWatch,
    keys: PressedKeys,
    params: RoomSceneParams,
    patron: Patron,
    player_x: f32,
    npc_x: f32,
    npc_direction: f32,
    focus: Option<Focus>,
    dialog: Option<String>,
    dialog_font_size: f32,
    laid_out: bool,
}

impl RoomScene {
    pub(crate) fn new(context: SceneContext, params: RoomSceneParams) -> Result<Self, SceneError> {
        let patron = context
            .building
            .patron_in_room(params.floor, params.room)
            .cloned()
            .ok_or_else(|| {
                SceneError::Construct(format!(
                    "no patron in room {}-{}",
                    params.floor, params.room
                ))
            })?;
        let watch = GeometryWatch::new(context.geometry.clone());
        let room_width = context.geometry.constants().room_width;
        Ok(Self {
            context,
            watch,
            keys: PressedKeys::default(),
            params,
            patron,
            player_x: PLAYER_START_X,
            npc_x: room_width * 0.5,
            npc_direction: 1.0,
            focus: None,
            dialog: None,
            dialog_font_size: DIALOG_FONT_SIZE,
            laid_out: false,
        })
    }

    fn room_width(&self) -> f32 {
        self.context.geometry.constants().room_width
    }

    fn item_x(&self) -> f32 {
        self.room_width() * 0.25
    }

    fn poster_x(&self) -> f32 {
        self.room_width() * 0.75 - POSTER_WIDTH / 2.0
    }

    fn pace_bounds(&self) -> (f32, f32) {
        (self.room_width() * 0.3, self.room_width() * 0.7)
    }

    fn move_player(&mut self, dt_seconds: f32) {
        let right = (self.room_width() - PLAYER_WIDTH - SIDE_MARGIN).max(SIDE_MARGIN);
        let step = self.keys.horizontal_axis() * PLAYER_SPEED * dt_seconds;
        self.player_x = (self.player_x + step).clamp(SIDE_MARGIN, right);
    }

    fn pace_npc(&mut self, dt_seconds: f32) {
        let (min, max) = self.pace_bounds();
        self.npc_x += NPC_SPEED * dt_seconds * self.npc_direction;
        if self.npc_x >= max {
            self.npc_x = max;
            self.npc_direction = -1.0;
        } else if self.npc_x <= min {
            self.npc_x = min;
            self.npc_direction = 1.0;
        }
    }

    fn detect_focus(&self) -> Option<Focus> {
        let near = |x: f32| (self.player_x - x).abs() < INTERACTION_DISTANCE;
        if near(self.npc_x) {
            Some(Focus::Npc)
        } else if near(self.item_x()) {
            Some(Focus::Item)
        } else if near(self.poster_x()) {
            Some(Focus::Poster)
        } else {
            None
        }
    }

    fn interact(&mut self) {
        if self.dialog.take().is_some() {
            debug!("dialog_closed");
            return;
        }
        let name = &self.patron.name;
        let text = match self.focus {
            Some(Focus::Npc) => self.patron.dialog_text.clone(),
            Some(Focus::Item) => {
                format!("This is {name}'s special item. It holds great meaning to them!")
            }
            Some(Focus::Poster) => format!(
                "A beautiful poster chosen by {name}. It reflects their personality and interests."
            ),
            None => return,
        };
        info!(
            patron = %self.patron.id,
            focus = ?self.focus,
            font_size = self.dialog_font_size,
            text = %text,
            "dialog_opened"
        );
        self.dialog = Some(text);
    }
}

impl Scene for RoomScene {
    fn name(&self) -> &str {
        "room"
    }

    fn enter(&mut self) -> SceneFuture<'_> {
        self.watch.attach();
        info!(
            floor = self.params.floor,
            room = self.params.room,
            patron = %self.patron.id,
            tier = ?self.patron.tier,
            "room_entered"
        );
        Box::pin(future::ready(Ok(())))
    }

    fn exit(&mut self) -> SceneFuture<'_> {
        let patron = self.patron.name.clone();
        Box::pin(async move {
            info!(patron = %patron, "room_left");
            Ok(())
        })
    }

    fn update(&mut self, dt_seconds: f32) {
        if self.watch.take_stale() {
            self.dialog_font_size = self.watch.geometry().font_size(DIALOG_FONT_SIZE);
            if self.laid_out && self.dialog.take().is_some() {
                debug!("dialog_closed_on_relayout");
            }
            self.laid_out = true;
        }
        if self.dialog.is_none() {
            self.move_player(dt_seconds);
            self.pace_npc(dt_seconds);
        }
        self.focus = self.detect_focus();
    }

    fn handle_key_down(&mut self, code: &str) {
        self.keys.press(code);
        match code {
            "Space" => self.interact(),
            "Escape" => {
                if self.dialog.take().is_some() {
                    debug!("dialog_closed");
                } else {
                    self.context.navigator.request(Destination::Hallway {
                        floor: self.params.floor,
                        from_room: Some(self.params.room),
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_key_up(&mut self, code: &str) {
        self.keys.release(code);
    }

    fn destroy(&mut self) {
        self.watch.detach();
        self.keys.clear();
        self.dialog = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::super::test_support::{context, patron, viewport};
    use super::*;

    fn room_with_ada() -> (RoomScene, SceneContext) {
        let context = context(vec![patron("ada", Some((1, 2)))]);
        let scene = RoomScene::new(context.clone(), RoomSceneParams { floor: 1, room: 2 })
            .expect("room scene");
        (scene, context)
    }

    #[test]
    fn empty_room_cannot_be_constructed() {
        let context = context(vec![patron("ada", Some((1, 2)))]);
        let result = RoomScene::new(context, RoomSceneParams { floor: 1, room: 1 });
        assert!(matches!(result, Err(SceneError::Construct(_))));
    }

    #[test]
    fn space_near_npc_opens_and_closes_dialog() {
        let (mut scene, _) = room_with_ada();
        scene.player_x = scene.npc_x;
        scene.update(0.0);
        assert_eq!(scene.focus, Some(Focus::Npc));

        scene.handle_key_down("Space");
        assert_eq!(scene.dialog.as_deref(), Some("ada says hi"));

        scene.handle_key_down("Space");
        assert_eq!(scene.dialog, None);
    }

    #[test]
    fn item_and_poster_have_their_own_lines() {
        let (mut scene, _) = room_with_ada();
        scene.npc_x = 0.0;

        scene.player_x = scene.item_x();
        scene.focus = scene.detect_focus();
        scene.handle_key_down("Space");
        assert!(scene.dialog.as_deref().is_some_and(|text| text.contains("special item")));
        scene.handle_key_down("Escape");

        scene.player_x = scene.poster_x();
        scene.focus = scene.detect_focus();
        scene.handle_key_down("Space");
        assert!(scene.dialog.as_deref().is_some_and(|text| text.contains("poster")));
    }

    #[test]
    fn escape_closes_dialog_before_leaving() {
        let (mut scene, context) = room_with_ada();
        scene.dialog = Some("hello".to_string());

        scene.handle_key_down("Escape");
        assert_eq!(scene.dialog, None);
        assert_eq!(context.navigator.peek(), None);

        scene.handle_key_down("Escape");
        assert_eq!(
            context.navigator.take(),
            Some(Destination::Hallway {
                floor: 1,
                from_room: Some(2)
            })
        );
    }

    #[test]
    fn relayout_closes_open_dialog() {
        let (mut scene, context) = room_with_ada();
        let _ = futures::executor::block_on(scene.enter());
        scene.dialog = Some("hello".to_string());
        scene.update(0.0);
        assert_eq!(scene.dialog.as_deref(), Some("hello"));

        context
            .geometry
            .on_viewport_change(viewport(600, 400), Instant::now());
        scene.update(0.0);

        assert_eq!(scene.dialog, None);
        assert_eq!(context.navigator.peek(), None);
        scene.destroy();
    }

    #[test]
    fn dialog_freezes_movement() {
        let (mut scene, _) = room_with_ada();
        scene.dialog = Some("hello".to_string());
        scene.handle_key_down("ArrowRight");
        let (player, npc) = (scene.player_x, scene.npc_x);

        scene.update(1.0);
        assert_eq!((scene.player_x, scene.npc_x), (player, npc));
    }

    #[test]
    fn npc_paces_between_bounds() {
        let (mut scene, _) = room_with_ada();
        let (min, max) = scene.pace_bounds();

        scene.update(10.0);
        assert_eq!(scene.npc_x, max);
        assert_eq!(scene.npc_direction, -1.0);

        scene.update(10.0);
        assert_eq!(scene.npc_x, min);
        assert_eq!(scene.npc_direction, 1.0);
    }

    #[test]
    fn player_stays_inside_room() {
        let (mut scene, _) = room_with_ada();
        scene.handle_key_down("ArrowLeft");
        scene.update(10.0);
        assert_eq!(scene.player_x, SIDE_MARGIN);

        scene.handle_key_up("ArrowLeft");
        scene.handle_key_down("ArrowRight");
        scene.update(10.0);
        assert_eq!(scene.player_x, 800.0 - PLAYER_WIDTH - SIDE_MARGIN);
    }
}
