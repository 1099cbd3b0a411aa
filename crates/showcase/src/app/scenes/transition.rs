use std::time::Duration;

use futures::future;
use showcase_engine::{Scene, SceneFuture};
use tracing::{debug, info};

use super::{Destination, GeometryWatch, SceneContext};

const BANNER_FONT_SIZE: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FadeIn,
    Display,
    FadeOut,
    Done,
}

/// Timed interstitial between the start screen and floor 1.
pub(crate) struct TransitionScene {
    context: SceneContext,
    watch: GeometryWatch,
    phase: Phase,
    phase_elapsed: Duration,
    banner_font_size: f32,
    requested: bool,
}

impl TransitionScene {
    pub(crate) fn new(context: SceneContext) -> Self {
        let watch = GeometryWatch::new(context.geometry.clone());
        Self {
            context,
            watch,
            phase: Phase::FadeIn,
            phase_elapsed: Duration::ZERO,
            banner_font_size: BANNER_FONT_SIZE,
            requested: false,
        }
    }

    fn phase_length(&self, phase: Phase) -> Option<Duration> {
        match phase {
            Phase::FadeIn | Phase::FadeOut => Some(self.context.timings.fade),
            Phase::Display => Some(self.context.timings.display),
            Phase::Done => None,
        }
    }

    fn advance(&mut self, dt: Duration) {
        self.phase_elapsed = self.phase_elapsed.saturating_add(dt);
        while let Some(length) = self.phase_length(self.phase) {
            if self.phase_elapsed < length {
                break;
            }
            self.phase_elapsed -= length;
            self.phase = match self.phase {
                Phase::FadeIn => Phase::Display,
                Phase::Display => Phase::FadeOut,
                Phase::FadeOut | Phase::Done => Phase::Done,
            };
            debug!(
                phase = ?self.phase,
                banner_alpha = self.banner_alpha(),
                banner_font_size = self.banner_font_size,
                "transition_phase_changed"
            );
        }
        if self.phase == Phase::Done {
            self.finish();
        }
    }

    /// Banner opacity for the current phase.
    fn banner_alpha(&self) -> f32 {
        let fade_progress = || {
            let fade = self.context.timings.fade;
            if fade.is_zero() {
                1.0
            } else {
                (self.phase_elapsed.as_secs_f32() / fade.as_secs_f32()).min(1.0)
            }
        };
        match self.phase {
            Phase::FadeIn => fade_progress(),
            Phase::Display => 1.0,
            Phase::FadeOut => (1.0 - fade_progress()).max(0.0),
            Phase::Done => 0.0,
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Done;
        if self.requested {
            return;
        }
        self.requested = true;
        self.context.navigator.request(Destination::Hallway {
            floor: 1,
            from_room: None,
        });
    }
}

impl Scene for TransitionScene {
    fn name(&self) -> &str {
        "transition"
    }

    fn enter(&mut self) -> SceneFuture<'_> {
        self.watch.attach();
        info!(
            fade_ms = self.context.timings.fade.as_millis() as u64,
            display_ms = self.context.timings.display.as_millis() as u64,
            "transition_started"
        );
        Box::pin(future::ready(Ok(())))
    }

    fn update(&mut self, dt_seconds: f32) {
        if self.watch.take_stale() {
            self.banner_font_size = self.watch.geometry().font_size(BANNER_FONT_SIZE);
        }
        self.advance(Duration::from_secs_f32(dt_seconds.max(0.0)));
    }

    fn handle_key_down(&mut self, code: &str) {
        if matches!(code, "Space" | "Enter" | "Escape") {
            info!("transition_skipped");
            self.finish();
        }
    }

    fn destroy(&mut self) {
        self.watch.detach();
    }
}
