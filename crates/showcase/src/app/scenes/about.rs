use showcase_engine::{Scene, SceneFuture};
use tracing::info;

use super::{Destination, GeometryWatch, SceneContext};

pub(crate) struct AboutScene {
    context: SceneContext,
    watch: GeometryWatch,
}

impl AboutScene {
    pub(crate) fn new(context: SceneContext) -> Self {
        let watch = GeometryWatch::new(context.geometry.clone());
        Self { context, watch }
    }

    /// Credit lines, one per patron in roster order.
    fn credits(&self) -> Vec<String> {
        self.context
            .building
            .roster()
            .patrons()
            .iter()
            .map(|patron| match patron.tier {
                Some(tier) => format!("{} ({tier:?})", patron.name),
                None => patron.name.clone(),
            })
            .collect()
    }
}

impl Scene for AboutScene {
    fn name(&self) -> &str {
        "about"
    }

    fn enter(&mut self) -> SceneFuture<'_> {
        self.watch.attach();
        let credits = self.credits();
        Box::pin(async move {
            info!(credits = ?credits, "about_screen_shown");
            Ok(())
        })
    }

    fn handle_key_down(&mut self, code: &str) {
        if matches!(code, "Escape" | "Enter" | "Backspace") {
            self.context.navigator.request(Destination::Start);
        }
    }

    fn destroy(&mut self) {
        self.watch.detach();
    }
}
