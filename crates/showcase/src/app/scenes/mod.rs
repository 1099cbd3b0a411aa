use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use showcase_engine::{
    Building, Scene, SceneDirector, SceneFactory, SharedGeometry, SubscriptionId,
};
use tracing::{debug, info};

mod about;
mod hallway;
mod room;
mod start;
mod transition;

use about::AboutScene;
use hallway::HallwayScene;
use room::RoomScene;
use start::StartScene;
use transition::TransitionScene;

/// Typed context for a room scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RoomSceneParams {
    pub(crate) floor: u32,
    pub(crate) room: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Destination {
    Start,
    About,
    Transition,
    Hallway { floor: u32, from_room: Option<u32> },
    Room(RoomSceneParams),
}

/// Single pending navigation request, shared between scenes and the
/// director. A newer request replaces an unconsumed older one.
#[derive(Debug, Clone, Default)]
pub(crate) struct Navigator {
    pending: Rc<RefCell<Option<Destination>>>,
}

impl Navigator {
    pub(crate) fn request(&self, destination: Destination) {
        if let Some(replaced) = self.pending.borrow_mut().replace(destination) {
            debug!(?replaced, ?destination, "navigation_request_replaced");
        }
    }

    pub(crate) fn take(&self) -> Option<Destination> {
        self.pending.borrow_mut().take()
    }

    #[cfg(test)]
    pub(crate) fn peek(&self) -> Option<Destination> {
        *self.pending.borrow()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SceneTimings {
    pub(crate) fade: Duration,
    pub(crate) display: Duration,
}

/// Everything a scene may depend on. Cloned into each scene factory.
#[derive(Debug, Clone)]
pub(crate) struct SceneContext {
    pub(crate) geometry: SharedGeometry,
    pub(crate) building: Arc<Building>,
    pub(crate) navigator: Navigator,
    pub(crate) timings: SceneTimings,
}

pub(crate) struct ShowcaseDirector {
    context: SceneContext,
}

impl ShowcaseDirector {
    pub(crate) fn new(context: SceneContext) -> Self {
        Self { context }
    }

    fn factory(&self, destination: Destination) -> SceneFactory {
        let context = self.context.clone();
        match destination {
            Destination::Start => Box::new(move || Ok(boxed(StartScene::new(context)))),
            Destination::About => Box::new(move || Ok(boxed(AboutScene::new(context)))),
            Destination::Transition => Box::new(move || Ok(boxed(TransitionScene::new(context)))),
            Destination::Hallway { floor, from_room } => {
                Box::new(move || HallwayScene::new(context, floor, from_room).map(boxed))
            }
            Destination::Room(params) => {
                Box::new(move || RoomScene::new(context, params).map(boxed))
            }
        }
    }
}

impl SceneDirector for ShowcaseDirector {
    fn initial_scene(&mut self) -> SceneFactory {
        self.factory(Destination::Start)
    }

    fn take_request(&mut self) -> Option<SceneFactory> {
        let destination = self.context.navigator.take()?;
        info!(?destination, "navigation_requested");
        Some(self.factory(destination))
    }
}

fn boxed<S: Scene + 'static>(scene: S) -> Box<dyn Scene> {
    Box::new(scene)
}

/// Keys currently held, as seen by one scene.
#[derive(Debug, Default)]
pub(crate) struct PressedKeys {
    down: HashSet<String>,
}

impl PressedKeys {
    pub(crate) fn press(&mut self, code: &str) {
        self.down.insert(code.to_string());
    }

    pub(crate) fn release(&mut self, code: &str) {
        self.down.remove(code);
    }

    pub(crate) fn is_down(&self, code: &str) -> bool {
        self.down.contains(code)
    }

    pub(crate) fn clear(&mut self) {
        self.down.clear();
    }

    /// -1, 0 or 1 from the left/right arrows.
    pub(crate) fn horizontal_axis(&self) -> f32 {
        let left = self.is_down("ArrowLeft") as i8;
        let right = self.is_down("ArrowRight") as i8;
        f32::from(right - left)
    }
}

/// Geometry subscription owned by a scene. Marks the scene's cached layout
/// stale whenever the committed snapshot is recomputed.
pub(crate) struct GeometryWatch {
    geometry: SharedGeometry,
    stale: Rc<Cell<bool>>,
    subscription: Option<SubscriptionId>,
}

impl GeometryWatch {
    pub(crate) fn new(geometry: SharedGeometry) -> Self {
        Self {
            geometry,
            stale: Rc::new(Cell::new(true)),
            subscription: None,
        }
    }

    pub(crate) fn geometry(&self) -> &SharedGeometry {
        &self.geometry
    }

    pub(crate) fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let stale = Rc::clone(&self.stale);
        let id = self.geometry.subscribe(move |_| stale.set(true));
        self.subscription = Some(id);
    }

    pub(crate) fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.geometry.unsubscribe(id);
        }
    }

    /// True once after each notification.
    pub(crate) fn take_stale(&self) -> bool {
        self.stale.replace(false)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use showcase_engine::{
        Building, GeometryEngine, LayoutConstants, Patron, PatronId, Roster, Viewport,
    };

    use super::*;

    pub(crate) fn patron(id: &str, placement: Option<(u32, u32)>) -> Patron {
        Patron {
            id: PatronId::new(id),
            name: id.to_uppercase(),
            dialog_text: format!("{id} says hi"),
            floor: placement.map(|(floor, _)| floor),
            room_number: placement.map(|(_, room)| room),
            tier: None,
            npc_image: None,
            item_image: None,
            poster_image: None,
            background_image: None,
            join_date: None,
            special_notes: None,
        }
    }

    pub(crate) fn context(patrons: Vec<Patron>) -> SceneContext {
        let roster = Arc::new(Roster::new(patrons).expect("valid roster"));
        let building = Arc::new(Building::build(roster, 3, 5));
        let constants = LayoutConstants::default();
        let geometry = GeometryEngine::shared(
            constants,
            constants.base_viewport(),
            Duration::from_millis(300),
        );
        SceneContext {
            geometry,
            building,
            navigator: Navigator::default(),
            timings: SceneTimings {
                fade: Duration::from_millis(1000),
                display: Duration::from_millis(2000),
            },
        }
    }

    pub(crate) fn viewport(width: u32, height: u32) -> Viewport {
        Viewport { width, height }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use futures::executor::block_on;

    use super::test_support::{context, patron, viewport};
    use super::*;

    #[test]
    fn newer_navigation_request_replaces_pending_one() {
        let navigator = Navigator::default();
        navigator.request(Destination::About);
        navigator.request(Destination::Transition);

        assert_eq!(navigator.take(), Some(Destination::Transition));
        assert_eq!(navigator.take(), None);
    }

    #[test]
    fn director_starts_at_start_scene_and_maps_requests() {
        let context = context(vec![patron("ada", None)]);
        let navigator = context.navigator.clone();
        let mut director = ShowcaseDirector::new(context);

        let start = (director.initial_scene())().expect("start scene");
        assert_eq!(start.name(), "start");
        assert!(director.take_request().is_none());

        navigator.request(Destination::Room(RoomSceneParams { floor: 1, room: 1 }));
        let room = (director.take_request().expect("room request"))().expect("room scene");
        assert_eq!(room.name(), "room");
    }

    #[test]
    fn director_factory_reports_empty_room_as_construct_error() {
        let context = context(vec![patron("ada", None)]);
        let navigator = context.navigator.clone();
        let mut director = ShowcaseDirector::new(context);

        navigator.request(Destination::Room(RoomSceneParams { floor: 1, room: 3 }));
        let factory = director.take_request().expect("room request");
        assert!(factory().is_err());
    }

    #[test]
    fn pressed_keys_axis_cancels_opposing_arrows() {
        let mut keys = PressedKeys::default();
        keys.press("ArrowLeft");
        assert_eq!(keys.horizontal_axis(), -1.0);
        keys.press("ArrowRight");
        assert_eq!(keys.horizontal_axis(), 0.0);
        keys.release("ArrowLeft");
        assert_eq!(keys.horizontal_axis(), 1.0);
        keys.clear();
        assert!(!keys.is_down("ArrowRight"));
    }

    #[test]
    fn geometry_watch_flags_recompute_and_unsubscribes() {
        let context = context(Vec::new());
        let mut watch = GeometryWatch::new(context.geometry.clone());
        assert!(watch.take_stale());
        assert!(!watch.take_stale());

        watch.attach();
        watch.attach();
        assert_eq!(context.geometry.subscriber_count(), 1);

        context
            .geometry
            .on_viewport_change(viewport(600, 400), Instant::now());
        assert!(watch.take_stale());

        watch.detach();
        assert_eq!(context.geometry.subscriber_count(), 0);
    }

    #[test]
    fn scenes_release_geometry_subscriptions_on_destroy() {
        let context = context(vec![patron("ada", Some((1, 1)))]);
        let geometry = context.geometry.clone();
        let mut director = ShowcaseDirector::new(context.clone());

        for destination in [
            Destination::Start,
            Destination::About,
            Destination::Transition,
            Destination::Hallway {
                floor: 1,
                from_room: None,
            },
            Destination::Room(RoomSceneParams { floor: 1, room: 1 }),
        ] {
            context.navigator.request(destination);
            let factory = director.take_request().expect("request");
            let mut scene = factory().expect("scene");
            block_on(scene.enter()).expect("enter");
            assert_eq!(geometry.subscriber_count(), 1, "{}", scene.name());
            scene.destroy();
            assert_eq!(geometry.subscriber_count(), 0, "{}", scene.name());
        }
    }
}
