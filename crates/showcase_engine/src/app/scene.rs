use std::cell::{Cell, Ref, RefCell};
use std::mem;

use futures::future::{self, LocalBoxFuture};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

pub type SceneFuture<'a> = LocalBoxFuture<'a, Result<(), SceneError>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene construction failed: {0}")]
    Construct(String),
    #[error("scene enter hook failed: {0}")]
    Enter(String),
    #[error("scene exit hook failed: {0}")]
    Exit(String),
}

/// A self-contained presentation unit. At most one is live at a time.
///
/// `destroy` must release everything the scene registered (geometry
/// subscriptions, timers) and must not panic.
pub trait Scene {
    fn name(&self) -> &str;
    fn enter(&mut self) -> SceneFuture<'_>;
    fn exit(&mut self) -> SceneFuture<'_> {
        Box::pin(future::ready(Ok(())))
    }
    fn update(&mut self, _dt_seconds: f32) {}
    fn handle_key_down(&mut self, _code: &str) {}
    fn handle_key_up(&mut self, _code: &str) {}
    fn destroy(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u64);

pub trait SceneHost {
    fn attach(&mut self, handle: SceneHandle, name: &str);
    fn detach(&mut self, handle: SceneHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Active,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    /// Another switch was in flight; nothing changed. The caller may retry.
    Rejected,
    /// A hook or the constructor failed; the slot was reset to idle.
    Faulted,
}

struct MountedScene {
    handle: SceneHandle,
    scene: Box<dyn Scene>,
}

enum SceneSlot {
    Idle,
    Active(MountedScene),
    Transitioning,
}

/// Single-slot scene state machine.
///
/// All methods take `&self`; the host shares the lifecycle through an `Rc`
/// and drives [`SceneLifecycle::switch_to`] on a single-threaded executor.
/// No `RefCell` borrow is held across an `.await`, so input dispatch stays
/// legal while a transition is suspended (it is simply dropped).
pub struct SceneLifecycle<H: SceneHost> {
    host: RefCell<H>,
    slot: RefCell<SceneSlot>,
    next_handle: Cell<u64>,
}

impl<H: SceneHost> SceneLifecycle<H> {
    pub fn new(host: H) -> Self {
        Self {
            host: RefCell::new(host),
            slot: RefCell::new(SceneSlot::Idle),
            next_handle: Cell::new(0),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &*self.slot.borrow() {
            SceneSlot::Idle => LifecycleState::Idle,
            SceneSlot::Active(_) => LifecycleState::Active,
            SceneSlot::Transitioning => LifecycleState::Transitioning,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        self.state() == LifecycleState::Transitioning
    }

    pub fn active_scene_name(&self) -> Option<String> {
        match &*self.slot.borrow() {
            SceneSlot::Active(mounted) => Some(mounted.scene.name().to_string()),
            _ => None,
        }
    }

    pub fn host(&self) -> Ref<'_, H> {
        self.host.borrow()
    }

    /// Replaces the active scene.
    ///
    /// Order is strict: exit, detach, destroy the old scene, then construct,
    /// attach, enter the new one. The slot never stays `Transitioning` after
    /// this future completes or is dropped.
    pub async fn switch_to<F>(&self, construct: F) -> SwitchOutcome
    where
        F: FnOnce() -> Result<Box<dyn Scene>, SceneError>,
    {
        let previous = {
            let mut slot = self.slot.borrow_mut();
            match mem::replace(&mut *slot, SceneSlot::Transitioning) {
                SceneSlot::Transitioning => {
                    warn!("scene_switch_rejected");
                    return SwitchOutcome::Rejected;
                }
                SceneSlot::Idle => None,
                SceneSlot::Active(mounted) => Some(mounted),
            }
        };

        let mut guard = TransitionGuard {
            lifecycle: self,
            mounted: previous,
        };

        if let Some(outgoing) = guard.mounted.as_mut() {
            let name = outgoing.scene.name().to_string();
            let exit_result = outgoing.scene.exit().await;
            if let Some(outgoing) = guard.mounted.take() {
                self.release(outgoing);
            }
            if let Err(err) = exit_result {
                error!(scene = %name, error = %err, "scene_exit_failed");
                return SwitchOutcome::Faulted;
            }
            debug!(scene = %name, "scene_exited");
        }

        let scene = match construct() {
            Ok(scene) => scene,
            Err(err) => {
                error!(error = %err, "scene_construct_failed");
                return SwitchOutcome::Faulted;
            }
        };

        let handle = self.allocate_handle();
        self.host.borrow_mut().attach(handle, scene.name());
        let incoming = guard.mounted.insert(MountedScene { handle, scene });
        let name = incoming.scene.name().to_string();
        if let Err(err) = incoming.scene.enter().await {
            error!(scene = %name, error = %err, "scene_enter_failed");
            return SwitchOutcome::Faulted;
        }

        guard.commit();
        info!(scene = %name, handle = handle.0, "scene_switched");
        SwitchOutcome::Switched
    }

    /// Returns whether the event reached a scene.
    pub fn dispatch_key_down(&self, code: &str) -> bool {
        self.with_active(|scene| scene.handle_key_down(code))
    }

    pub fn dispatch_key_up(&self, code: &str) -> bool {
        self.with_active(|scene| scene.handle_key_up(code))
    }

    pub fn dispatch_frame(&self, dt_seconds: f32) -> bool {
        self.with_active(|scene| scene.update(dt_seconds))
    }

    /// Releases the active scene without running its exit hook.
    ///
    /// Used when the host is going away. A transition in flight is left to
    /// its own guard.
    pub fn shutdown(&self) {
        let mounted = {
            let mut slot = self.slot.borrow_mut();
            match mem::replace(&mut *slot, SceneSlot::Idle) {
                SceneSlot::Active(mounted) => Some(mounted),
                SceneSlot::Transitioning => {
                    *slot = SceneSlot::Transitioning;
                    None
                }
                SceneSlot::Idle => None,
            }
        };
        if let Some(mounted) = mounted {
            info!(scene = mounted.scene.name(), "scene_shutdown");
            self.release(mounted);
        }
    }

    fn with_active(&self, deliver: impl FnOnce(&mut dyn Scene)) -> bool {
        match &mut *self.slot.borrow_mut() {
            SceneSlot::Active(mounted) => {
                deliver(mounted.scene.as_mut());
                true
            }
            SceneSlot::Transitioning => {
                trace!("scene_event_dropped_during_transition");
                false
            }
            SceneSlot::Idle => false,
        }
    }

    fn allocate_handle(&self) -> SceneHandle {
        let handle = SceneHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        handle
    }

    fn release(&self, mut mounted: MountedScene) {
        self.host.borrow_mut().detach(mounted.handle);
        mounted.scene.destroy();
        debug!(
            scene = mounted.scene.name(),
            handle = mounted.handle.0,
            "scene_released"
        );
    }
}

struct TransitionGuard<'a, H: SceneHost> {
    lifecycle: &'a SceneLifecycle<H>,
    mounted: Option<MountedScene>,
}

impl<H: SceneHost> TransitionGuard<'_, H> {
    fn commit(&mut self) {
        let mut slot = self.lifecycle.slot.borrow_mut();
        *slot = match self.mounted.take() {
            Some(mounted) => SceneSlot::Active(mounted),
            None => SceneSlot::Idle,
        };
    }
}

impl<H: SceneHost> Drop for TransitionGuard<'_, H> {
    fn drop(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            self.lifecycle.release(mounted);
        }
        let mut slot = self.lifecycle.slot.borrow_mut();
        if matches!(*slot, SceneSlot::Transitioning) {
            *slot = SceneSlot::Idle;
        }
    }
}
