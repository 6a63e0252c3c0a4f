use std::rc::Rc;

use engine::{resolve_app_paths, ImageMapSource, LoopConfig, MapError, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, ConfigError, GAME_CONFIG_FILE};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        asset_root = %paths.asset_root.display(),
        "startup"
    );

    let game_config = gameplay::load_game_config(&paths.base_asset_dir.join(GAME_CONFIG_FILE))?;
    let map_path = paths.map_file(&game_config.map_file);
    let map = ImageMapSource::open(&map_path)?;
    let (pages_x, pages_y) = map.page_counts(game_config.page_extent);
    info!(path = %map_path.display(), pages_x, pages_y, "map_opened");

    let page_px = u32::try_from(game_config.page_extent_px()).unwrap_or(0);
    let config = LoopConfig {
        window_title: game_config.window_title.clone(),
        framebuffer_width: page_px,
        framebuffer_height: page_px,
        window_scale: game_config.window_scale,
        target_tps: game_config.target_tps,
        sprite_dir: paths.sprite_dir(),
        ..LoopConfig::default()
    };
    let scene = gameplay::build_scene(game_config, Rc::new(map));

    Ok(AppWiring { config, scene })
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
