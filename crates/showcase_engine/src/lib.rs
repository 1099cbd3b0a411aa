use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod config;
pub mod occupancy;

pub use app::{
    eased_progress, elastic, fit_scale, key_code_name, run_app, AnimationState, AppError,
    FrameRequest, GeometryEngine, GeometrySnapshot, LayoutConstants, LifecycleState, LoopConfig,
    Renderer, Scene, SceneDirector, SceneError, SceneFactory, SceneFuture, SceneHandle,
    SceneHost, SceneLifecycle, SharedGeometry, Stage, SubscriptionId, SwitchOutcome, Viewport,
};
pub use config::{ConfigError, ShowcaseConfig, CONFIG_FILE_NAME};
pub use occupancy::{
    Building, ConflictReason, Floor, Patron, PatronId, PlacementConflict, PlacementReport, Room,
    RoomPosition, Roster, RosterError, Tier, ROSTER_FILE_NAME,
};

pub const ROOT_ENV_VAR: &str = "SHOWCASE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub roster_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let assets_dir = root.join("assets");
        let roster_path = assets_dir.join(ROSTER_FILE_NAME);
        let config_path = assets_dir.join(CONFIG_FILE_NAME);
        Self {
            root,
            assets_dir,
            roster_path,
            config_path,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "SHOWCASE_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/showcase\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(AppPaths::from_root(root))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_repo_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("assets")).expect("assets dir");
        assert!(!is_repo_marker(dir.path()));

        fs::write(dir.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        assert!(is_repo_marker(dir.path()));
    }

    #[test]
    fn app_paths_place_data_files_under_assets() {
        let paths = AppPaths::from_root(PathBuf::from("/srv/showcase"));
        assert_eq!(paths.assets_dir, PathBuf::from("/srv/showcase/assets"));
        assert_eq!(
            paths.roster_path,
            PathBuf::from("/srv/showcase/assets/patrons.json")
        );
        assert_eq!(
            paths.config_path,
            PathBuf::from("/srv/showcase/assets/showcase.json")
        );
    }
}
