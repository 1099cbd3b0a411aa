use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::easing::eased_progress;
use super::rendering::Viewport;

pub const DEFAULT_MAX_SCALE: f32 = 1.2;
pub const DEFAULT_MIN_FONT_SIZE: f32 = 12.0;

pub type SharedGeometry = Rc<GeometryEngine>;

type GeometryCallback = Rc<dyn Fn(&GeometrySnapshot)>;

/// Fixed design-space measurements every snapshot is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstants {
    pub base_width: f32,
    pub base_height: f32,
    pub room_width: f32,
    pub room_height: f32,
    pub max_scale: f32,
    pub min_font_size: f32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            base_width: 1200.0,
            base_height: 800.0,
            room_width: 800.0,
            room_height: 450.0,
            max_scale: DEFAULT_MAX_SCALE,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
        }
    }
}

impl LayoutConstants {
    pub fn compute_snapshot(&self, viewport: Viewport) -> GeometrySnapshot {
        let scale = fit_scale(
            self.base_width,
            self.base_height,
            viewport.width as f32,
            viewport.height as f32,
            self.max_scale,
        );
        GeometrySnapshot {
            base_width: self.base_width,
            base_height: self.base_height,
            scale,
            derived_width: self.base_width * scale,
            derived_height: self.base_height * scale,
            room_width: self.room_width * scale,
            room_height: self.room_height * scale,
        }
    }

    pub fn base_viewport(&self) -> Viewport {
        Viewport {
            width: self.base_width.round() as u32,
            height: self.base_height.round() as u32,
        }
    }
}

/// Aspect-preserving fit of the base resolution into the viewport.
///
/// Capped at `cap`, with no lower bound.
pub fn fit_scale(
    base_width: f32,
    base_height: f32,
    viewport_width: f32,
    viewport_height: f32,
    cap: f32,
) -> f32 {
    let scale_x = viewport_width / base_width;
    let scale_y = viewport_height / base_height;
    scale_x.min(scale_y).min(cap)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometrySnapshot {
    pub base_width: f32,
    pub base_height: f32,
    pub scale: f32,
    pub derived_width: f32,
    pub derived_height: f32,
    pub room_width: f32,
    pub room_height: f32,
}

impl GeometrySnapshot {
    /// Field-wise linear interpolation. `t` may leave `[0, 1]`.
    pub fn lerp(&self, target: &Self, t: f32) -> Self {
        let mix = |from: f32, to: f32| from + (to - from) * t;
        Self {
            base_width: mix(self.base_width, target.base_width),
            base_height: mix(self.base_height, target.base_height),
            scale: mix(self.scale, target.scale),
            derived_width: mix(self.derived_width, target.derived_width),
            derived_height: mix(self.derived_height, target.derived_height),
            room_width: mix(self.room_width, target.room_width),
            room_height: mix(self.room_height, target.room_height),
        }
    }

    pub fn scaled(&self, constant: f32) -> f32 {
        constant * self.scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub start: GeometrySnapshot,
    pub target: GeometrySnapshot,
    pub started_at: Instant,
    pub duration: Duration,
}

impl AnimationState {
    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_complete_at(&self, now: Instant) -> bool {
        self.progress_at(now) >= 1.0
    }

    pub fn sample(&self, now: Instant) -> GeometrySnapshot {
        let progress = self.progress_at(now);
        if progress >= 1.0 {
            return self.target;
        }
        self.start.lerp(&self.target, eased_progress(progress))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Single geometry authority for a running session.
///
/// Owned by the host loop and shared with scenes as [`SharedGeometry`].
/// Every method takes `&self` so subscriber callbacks may call back into the
/// engine (including [`GeometryEngine::begin_transition`]) while a frame is
/// being delivered.
pub struct GeometryEngine {
    constants: LayoutConstants,
    resize_duration: Duration,
    committed: Cell<GeometrySnapshot>,
    animated: Cell<GeometrySnapshot>,
    animation: Cell<Option<AnimationState>>,
    scheduled_frame: Cell<Option<FrameRequest>>,
    next_frame_request: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, GeometryCallback)>>,
    next_subscription: Cell<u64>,
}

impl GeometryEngine {
    pub fn new(constants: LayoutConstants, viewport: Viewport, resize_duration: Duration) -> Self {
        let initial = constants.compute_snapshot(viewport);
        Self {
            constants,
            resize_duration,
            committed: Cell::new(initial),
            animated: Cell::new(initial),
            animation: Cell::new(None),
            scheduled_frame: Cell::new(None),
            next_frame_request: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
        }
    }

    pub fn shared(
        constants: LayoutConstants,
        viewport: Viewport,
        resize_duration: Duration,
    ) -> SharedGeometry {
        Rc::new(Self::new(constants, viewport, resize_duration))
    }

    pub fn constants(&self) -> &LayoutConstants {
        &self.constants
    }

    pub fn compute_snapshot(&self, viewport: Viewport) -> GeometrySnapshot {
        self.constants.compute_snapshot(viewport)
    }

    /// Last settled target.
    pub fn committed(&self) -> GeometrySnapshot {
        self.committed.get()
    }

    /// Interpolated value as of the last processed frame.
    pub fn animated(&self) -> GeometrySnapshot {
        self.animated.get()
    }

    pub fn animation(&self) -> Option<AnimationState> {
        self.animation.get()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.get().is_some()
    }

    /// Animated snapshot at `now` without advancing any state.
    pub fn sample_at(&self, now: Instant) -> GeometrySnapshot {
        match self.animation.get() {
            Some(animation) => animation.sample(now),
            None => self.animated.get(),
        }
    }

    pub fn scale(&self) -> f32 {
        self.animated.get().scale
    }

    pub fn scaled(&self, constant: f32) -> f32 {
        self.animated.get().scaled(constant)
    }

    pub fn font_size(&self, base: f32) -> f32 {
        self.constants.min_font_size.max(self.scaled(base))
    }

    pub fn center_x(&self, width: f32) -> f32 {
        (self.animated.get().derived_width - width) / 2.0
    }

    pub fn center_y(&self, height: f32) -> f32 {
        (self.animated.get().derived_height - height) / 2.0
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&GeometrySnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Host entry point for every resize event.
    pub fn on_viewport_change(&self, viewport: Viewport, now: Instant) {
        let target = self.constants.compute_snapshot(viewport);
        debug!(
            viewport_width = viewport.width,
            viewport_height = viewport.height,
            scale = target.scale,
            "geometry_viewport_changed"
        );
        self.begin_transition(target, self.resize_duration, now);
        self.notify();
    }

    /// Replaces any in-flight animation, starting from the current animated
    /// value. Subscribers see the new target from the next frame on.
    pub fn begin_transition(&self, target: GeometrySnapshot, duration: Duration, now: Instant) {
        if let Some(cancelled) = self.scheduled_frame.take() {
            trace!(request = cancelled.0, "geometry_frame_cancelled");
        }
        self.animation.set(Some(AnimationState {
            start: self.animated.get(),
            target,
            started_at: now,
            duration,
        }));
        let request = self.allocate_frame_request();
        self.scheduled_frame.set(Some(request));
    }

    /// The single outstanding frame request, if an animation is running.
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.scheduled_frame.get()
    }

    /// Runs the pending frame, if any. Returns whether a frame was processed.
    pub fn tick(&self, now: Instant) -> bool {
        match self.scheduled_frame.get() {
            Some(request) => self.run_frame(request, now),
            None => false,
        }
    }

    /// Processes `request` if it is still the outstanding one; cancelled or
    /// already-consumed requests are ignored.
    pub fn run_frame(&self, request: FrameRequest, now: Instant) -> bool {
        if self.scheduled_frame.get() != Some(request) {
            return false;
        }
        self.scheduled_frame.set(None);
        let Some(animation) = self.animation.get() else {
            return false;
        };

        if animation.is_complete_at(now) {
            self.animation.set(None);
            self.animated.set(animation.target);
            self.committed.set(animation.target);
            debug!(scale = animation.target.scale, "geometry_transition_settled");
        } else {
            self.animated.set(animation.sample(now));
            let next = self.allocate_frame_request();
            self.scheduled_frame.set(Some(next));
        }

        self.notify();
        true
    }

    fn allocate_frame_request(&self) -> FrameRequest {
        let request = FrameRequest(self.next_frame_request.get());
        self.next_frame_request.set(request.0 + 1);
        request
    }

    fn notify(&self) {
        let callbacks: Vec<GeometryCallback> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        let committed = self.committed.get();
        for callback in callbacks {
            callback(&committed);
        }
    }
}

impl std::fmt::Debug for GeometryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryEngine")
            .field("constants", &self.constants)
            .field("committed", &self.committed.get())
            .field("animated", &self.animated.get())
            .field("animation", &self.animation.get())
            .field("scheduled_frame", &self.scheduled_frame.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
