mod easing;
mod geometry;
mod input;
mod loop_runner;
mod rendering;
mod scene;

pub use easing::{eased_progress, elastic, ELASTIC_PERIOD};
pub use geometry::{
    fit_scale, AnimationState, FrameRequest, GeometryEngine, GeometrySnapshot, LayoutConstants,
    SharedGeometry, SubscriptionId, DEFAULT_MAX_SCALE, DEFAULT_MIN_FONT_SIZE,
};
pub use input::key_code_name;
pub use loop_runner::{run_app, AppError, LoopConfig, SceneDirector, SceneFactory};
pub use rendering::{letterbox_rect, Renderer, ScreenRectPx, Stage, Viewport};
pub use scene::{
    LifecycleState, Scene, SceneError, SceneFuture, SceneHandle, SceneHost, SceneLifecycle,
    SwitchOutcome,
};
