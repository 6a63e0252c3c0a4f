use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const ROOT_ENV_VAR: &str = "PLATFORMER_ROOT";

const ASSET_DIR: &str = "assets";
const BASE_PACK: &str = "base";
const MAP_DIR: &str = "maps";
const SPRITE_DIR: &str = "sprites";

/// Where the game finds its data. A root is any directory holding
/// `assets/base/maps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    pub asset_root: PathBuf,
    pub base_asset_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let asset_root = root.join(ASSET_DIR);
        let base_asset_dir = asset_root.join(BASE_PACK);
        Self {
            root,
            asset_root,
            base_asset_dir,
        }
    }

    pub fn map_file(&self, name: &str) -> PathBuf {
        self.base_asset_dir.join(MAP_DIR).join(name)
    }

    pub fn sprite_dir(&self) -> PathBuf {
        self.base_asset_dir.join(SPRITE_DIR)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} is not valid unicode: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to locate the running executable: {0}")]
    CurrentExe(#[source] io::Error),
    #[error("PLATFORMER_ROOT={} has no assets/base/maps directory", .path.display())]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "no assets/base/maps found above {}; set PLATFORMER_ROOT to the game directory",
        .start_dir.display()
    )]
    RootNotFound { start_dir: PathBuf },
}

/// `PLATFORMER_ROOT` wins when set; otherwise the nearest ancestor of the
/// executable that holds the asset tree.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let root = canonical(Path::new(&value));
            if !has_asset_tree(&root) {
                return Err(StartupError::InvalidEnvRoot { path: root });
            }
            root
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let start_dir = exe.parent().unwrap_or(&exe).to_path_buf();
            find_root_from(&start_dir).ok_or(StartupError::RootNotFound { start_dir })?
        }
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(AppPaths::from_root(root))
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| has_asset_tree(dir))
        .map(canonical)
}

fn has_asset_tree(dir: &Path) -> bool {
    dir.join(ASSET_DIR)
        .join(BASE_PACK)
        .join(MAP_DIR)
        .is_dir()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
