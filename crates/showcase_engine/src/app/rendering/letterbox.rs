use crate::app::GeometrySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Half-open pixel rectangle: `left..right`, `top..bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRectPx {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl ScreenRectPx {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Centers the derived area inside the viewport, clipped to the viewport.
///
/// The animated geometry can overshoot past the viewport while bouncing, so
/// the result is always clamped.
pub fn letterbox_rect(viewport: Viewport, geometry: &GeometrySnapshot) -> ScreenRectPx {
    let width = clamp_extent(geometry.derived_width, viewport.width);
    let height = clamp_extent(geometry.derived_height, viewport.height);
    let left = (viewport.width - width) / 2;
    let top = (viewport.height - height) / 2;
    ScreenRectPx {
        left,
        top,
        right: left + width,
        bottom: top + height,
    }
}

fn clamp_extent(extent: f32, limit: u32) -> u32 {
    if !extent.is_finite() || extent <= 0.0 {
        return 0;
    }
    (extent.round() as u32).min(limit)
}
