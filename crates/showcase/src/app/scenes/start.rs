use futures::future;
use showcase_engine::{Scene, SceneFuture};
use tracing::{debug, info};

use super::{Destination, GeometryWatch, SceneContext};

const TITLE_FONT_SIZE: f32 = 48.0;

pub(crate) struct StartScene {
    context: SceneContext,
    watch: GeometryWatch,
    title_font_size: f32,
}

impl StartScene {
    pub(crate) fn new(context: SceneContext) -> Self {
        let watch = GeometryWatch::new(context.geometry.clone());
        Self {
            context,
            watch,
            title_font_size: TITLE_FONT_SIZE,
        }
    }
}

impl Scene for StartScene {
    fn name(&self) -> &str {
        "start"
    }

    fn enter(&mut self) -> SceneFuture<'_> {
        self.watch.attach();
        info!(
            patrons = self.context.building.roster().len(),
            "start_screen_shown"
        );
        Box::pin(future::ready(Ok(())))
    }

    fn update(&mut self, _dt_seconds: f32) {
        if self.watch.take_stale() {
            self.title_font_size = self.watch.geometry().font_size(TITLE_FONT_SIZE);
            debug!(title_font_size = self.title_font_size, "start_layout_updated");
        }
    }

    fn handle_key_down(&mut self, code: &str) {
        match code {
            "Enter" | "Space" => self.context.navigator.request(Destination::Transition),
            "KeyA" => self.context.navigator.request(Destination::About),
            _ => {}
        }
    }

    fn destroy(&mut self) {
        self.watch.detach();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::super::test_support::{context, viewport};
    use super::*;

    #[test]
    fn enter_and_space_open_transition() {
        for key in ["Enter", "Space"] {
            let context = context(Vec::new());
            let mut scene = StartScene::new(context.clone());
            scene.handle_key_down(key);
            assert_eq!(context.navigator.take(), Some(Destination::Transition));
        }
    }

    #[test]
    fn key_a_opens_about_and_other_keys_are_ignored() {
        let context = context(Vec::new());
        let mut scene = StartScene::new(context.clone());

        scene.handle_key_down("Escape");
        assert_eq!(context.navigator.peek(), None);

        scene.handle_key_down("KeyA");
        assert_eq!(context.navigator.take(), Some(Destination::About));
    }

    #[test]
    fn title_font_follows_geometry_with_floor() {
        let context = context(Vec::new());
        let mut scene = StartScene::new(context.clone());
        let _ = futures::executor::block_on(scene.enter());

        let t0 = Instant::now();
        context.geometry.on_viewport_change(viewport(120, 80), t0);
        context
            .geometry
            .tick(t0 + Duration::from_millis(300));
        scene.update(0.016);

        assert_eq!(scene.title_font_size, 12.0);
        scene.destroy();
    }
}
