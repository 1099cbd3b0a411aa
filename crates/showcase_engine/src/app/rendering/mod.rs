mod letterbox;
mod renderer;
mod stage;

pub use letterbox::{letterbox_rect, ScreenRectPx, Viewport};
pub use renderer::Renderer;
pub use stage::Stage;
