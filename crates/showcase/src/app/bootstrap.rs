use std::sync::Arc;

use showcase_engine::{
    resolve_app_paths, AppPaths, Building, ConfigError, GeometryEngine, LoopConfig, Roster,
    RosterError, SharedGeometry, ShowcaseConfig, StartupError,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::scenes::{Navigator, SceneContext, SceneTimings, ShowcaseDirector};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) geometry: SharedGeometry,
    pub(crate) director: ShowcaseDirector,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Patron Showcase Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        "startup"
    );
    wire(&paths)
}

fn wire(paths: &AppPaths) -> Result<AppWiring, BootstrapError> {
    let settings = ShowcaseConfig::load_or_default(&paths.config_path)?;
    let roster = Arc::new(Roster::load(&paths.roster_path)?);
    let building = Arc::new(Building::build(
        roster,
        settings.rooms_per_floor,
        settings.max_floors,
    ));
    for conflict in &building.report().conflicts {
        warn!(
            patron = %conflict.patron,
            room = %conflict.requested,
            reason = ?conflict.reason,
            "patron_not_placed"
        );
    }

    let constants = settings.layout_constants();
    let geometry = GeometryEngine::shared(
        constants,
        constants.base_viewport(),
        settings.resize_transition(),
    );
    let context = SceneContext {
        geometry: geometry.clone(),
        building,
        navigator: Navigator::default(),
        timings: SceneTimings {
            fade: settings.fade_duration(),
            display: settings.display_duration(),
        },
    };

    let base = constants.base_viewport();
    let config = LoopConfig {
        window_width: base.width,
        window_height: base.height,
        background_color: settings.background_rgba(),
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        geometry,
        director: ShowcaseDirector::new(context),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
