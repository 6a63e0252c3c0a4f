/// Ability gates carried by the character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Channels {
    /// Fireball casting.
    pub(crate) red: bool,
    /// Toggleable; nothing reads it yet.
    pub(crate) green: bool,
    /// Swimming assist.
    pub(crate) blue: bool,
}

impl Channels {
    fn label(self) -> String {
        let flag = |on: bool, name: char| if on { name } else { '-' };
        [
            flag(self.red, 'R'),
            flag(self.green, 'G'),
            flag(self.blue, 'B'),
        ]
        .iter()
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CharacterTuning {
    pub(crate) size: i32,
    pub(crate) side_accel: f32,
    pub(crate) side_max: f32,
    pub(crate) side_decay: f32,
    pub(crate) jump_impulse: f32,
    pub(crate) gravity: f32,
    pub(crate) swim_accel: f32,
    pub(crate) water_decay: f32,
    pub(crate) terminal_speed: f32,
    pub(crate) projectile_size: i32,
    pub(crate) projectile_speed: i32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            size: 18,
            side_accel: 1.5,
            side_max: 5.0,
            side_decay: 0.5,
            jump_impulse: 16.0,
            gravity: 3.0,
            swim_accel: 2.0,
            water_decay: 0.8,
            terminal_speed: 19.0,
            projectile_size: 6,
            projectile_speed: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window_title: String,
    pub(crate) map_file: String,
    pub(crate) tile_size: i32,
    pub(crate) page_extent: u32,
    pub(crate) start_page: [i32; 2],
    pub(crate) spawn: [i32; 2],
    pub(crate) window_scale: u32,
    pub(crate) target_tps: u32,
    pub(crate) channels: Channels,
    pub(crate) character: CharacterTuning,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window_title: "Platformer".to_string(),
            map_file: "map.png".to_string(),
            tile_size: 20,
            page_extent: 20,
            start_page: [0, 0],
            spawn: [21, 20],
            window_scale: 2,
            target_tps: 50,
            channels: Channels::default(),
            character: CharacterTuning::default(),
        }
    }
}

impl GameConfig {
    pub(crate) fn page_extent_px(&self) -> i32 {
        self.checked_page_extent_px().unwrap_or(i32::MAX)
    }

    fn checked_page_extent_px(&self) -> Option<i32> {
        i32::try_from(self.page_extent)
            .ok()
            .and_then(|extent| self.tile_size.checked_mul(extent))
    }

    pub(crate) fn spawn_point(&self) -> Point {
        Point::new(self.spawn[0], self.spawn[1])
    }

    /// Rejects values that would let a body skip through a tile in one tick
    /// or leave the page on spawn.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let tuning = &self.character;
        let tile = self.tile_size as f32;
        if self.tile_size <= 0 {
            return Err(invalid("tile_size", "must be positive"));
        }
        if self.page_extent == 0 {
            return Err(invalid("page_extent", "must be positive"));
        }
        if self.window_scale == 0 {
            return Err(invalid("window_scale", "must be at least 1"));
        }
        if self.target_tps == 0 {
            return Err(invalid("target_tps", "must be at least 1"));
        }
        let Some(page_px) = self.checked_page_extent_px() else {
            return Err(invalid(
                "page_extent",
                format!("page of {} tiles of {} px overflows", self.page_extent, self.tile_size),
            ));
        };
        if tuning.size <= 0 || tuning.size >= page_px {
            return Err(invalid("character.size", "must be positive and fit in a page"));
        }
        let speeds = [
            ("character.side_accel", tuning.side_accel),
            ("character.side_max", tuning.side_max),
            ("character.jump_impulse", tuning.jump_impulse),
            ("character.gravity", tuning.gravity),
            ("character.swim_accel", tuning.swim_accel),
            ("character.terminal_speed", tuning.terminal_speed),
        ];
        for (field, value) in speeds {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, "must be a finite non-negative number"));
            }
        }
        for (field, value) in [
            ("character.side_decay", tuning.side_decay),
            ("character.water_decay", tuning.water_decay),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must lie in [0, 1]"));
            }
        }
        if tuning.terminal_speed >= tile {
            return Err(invalid(
                "character.terminal_speed",
                format!("must be below the tile size {}", self.tile_size),
            ));
        }
        if tuning.jump_impulse > tuning.terminal_speed {
            return Err(invalid(
                "character.jump_impulse",
                format!("must not exceed terminal_speed {}", tuning.terminal_speed),
            ));
        }
        if tuning.side_max >= tile {
            return Err(invalid(
                "character.side_max",
                format!("must be below the tile size {}", self.tile_size),
            ));
        }
        if tuning.projectile_size <= 0
            || tuning.projectile_speed <= 0
            || tuning.projectile_speed >= self.tile_size
        {
            return Err(invalid(
                "character.projectile_speed",
                "projectile size and speed must be positive and speed below the tile size",
            ));
        }
        if !(0..page_px).contains(&self.spawn[0]) || !(0..page_px).contains(&self.spawn[1]) {
            return Err(invalid("spawn", format!("must lie inside [0, {page_px})")));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read game config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse game config at {field}: {source}")]
    Parse {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid game config field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

pub(crate) fn parse_game_config(raw: &str) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: GameConfig =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            let field = if path.is_empty() { ".".to_string() } else { path };
            ConfigError::Parse {
                field,
                source: error.into_inner(),
            }
        })?;
    config.validate()?;
    Ok(config)
}

/// Reads `path`, falling back to defaults when the file does not exist.
pub(crate) fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "game_config_missing_using_defaults");
            return Ok(GameConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let config = parse_game_config(&raw)?;
    info!(
        path = %path.display(),
        tile_size = config.tile_size,
        page_extent = config.page_extent,
        "game_config_loaded"
    );
    Ok(config)
}
