use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::{LocalSpawnExt, SpawnError};
use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowBuilder;

use super::input::{HeldKeys, KeyTransition};
use super::{
    key_code_name, Renderer, Scene, SceneError, SceneLifecycle, SharedGeometry, Stage,
    SwitchOutcome,
};

/// Deferred scene construction. Runs inside the lifecycle, after the old
/// scene has been released.
pub type SceneFactory = Box<dyn FnOnce() -> Result<Box<dyn Scene>, SceneError>>;

/// Source of navigation requests. Polled once per frame by the host loop.
pub trait SceneDirector {
    fn initial_scene(&mut self) -> SceneFactory;
    fn take_request(&mut self) -> Option<SceneFactory>;
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub background_color: [u8; 4],
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Patron Showcase".to_string(),
            window_width: 1200,
            window_height: 800,
            max_frame_delta: Duration::from_millis(250),
            background_color: [0x1a, 0x1a, 0x2e, 0xff],
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to spawn scene transition: {0}")]
    Spawn(#[source] SpawnError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

type HostLifecycle = Rc<SceneLifecycle<Stage>>;

pub fn run_app(
    config: LoopConfig,
    geometry: SharedGeometry,
    mut director: Box<dyn SceneDirector>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    geometry.on_viewport_change(renderer.viewport(), Instant::now());

    event_loop.set_control_flow(ControlFlow::Poll);

    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    info!(
        base_width = geometry.constants().base_width,
        base_height = geometry.constants().base_height,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        "loop_config"
    );

    let lifecycle: HostLifecycle = Rc::new(SceneLifecycle::new(Stage::default()));
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    spawn_switch(&spawner, &lifecycle, director.initial_scene()).map_err(AppError::Spawn)?;
    pool.run_until_stalled();

    let mut held_keys = HeldKeys::default();
    let mut last_frame_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        debug!("resize_ignored_zero_size");
                        return;
                    }
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                        return;
                    }
                    geometry.on_viewport_change(renderer.viewport(), Instant::now());
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if size.width == 0 || size.height == 0 {
                        return;
                    }
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                        return;
                    }
                    geometry.on_viewport_change(renderer.viewport(), Instant::now());
                }
                WindowEvent::Focused(false) => {
                    for code in held_keys.release_all() {
                        if let Some(name) = key_code_name(PhysicalKey::Code(code)) {
                            lifecycle.dispatch_key_up(&name);
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let Some(transition) = held_keys.transition(event.physical_key, event.state)
                    else {
                        return;
                    };
                    let Some(name) = key_code_name(event.physical_key) else {
                        return;
                    };
                    let delivered = match transition {
                        KeyTransition::Down => lifecycle.dispatch_key_down(&name),
                        KeyTransition::Up => lifecycle.dispatch_key_up(&name),
                    };
                    if !delivered {
                        debug!(key = %name, "key_dropped_no_active_scene");
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let frame_dt = clamp_frame_delta(
                        now.saturating_duration_since(last_frame_instant),
                        max_frame_delta,
                    );
                    last_frame_instant = now;

                    pool.run_until_stalled();
                    if let Some(factory) = director.take_request() {
                        if let Err(error) = spawn_switch(&spawner, &lifecycle, factory) {
                            warn!(error = %error, "scene_switch_spawn_failed");
                            window_target.exit();
                            return;
                        }
                        pool.run_until_stalled();
                    }

                    geometry.tick(now);
                    lifecycle.dispatch_frame(frame_dt.as_secs_f32());

                    if let Err(error) =
                        renderer.render_frame(&geometry.animated(), config.background_color)
                    {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }

                    let next_title =
                        window_title(&config.window_title, lifecycle.host().attached_scene());
                    if last_applied_title.as_deref() != Some(next_title.as_str()) {
                        window.set_title(&next_title);
                        last_applied_title = Some(next_title);
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                lifecycle.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn spawn_switch(
    spawner: &LocalSpawner,
    lifecycle: &HostLifecycle,
    factory: SceneFactory,
) -> Result<(), SpawnError> {
    let lifecycle = Rc::clone(lifecycle);
    spawner.spawn_local(async move {
        match lifecycle.switch_to(factory).await {
            SwitchOutcome::Switched => {}
            SwitchOutcome::Rejected => debug!("navigation_request_dropped"),
            SwitchOutcome::Faulted => warn!("navigation_request_faulted"),
        }
    })
}

fn window_title(base: &str, scene: Option<&str>) -> String {
    match scene {
        Some(scene) => format!("{base} - {scene}"),
        None => base.to_string(),
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
