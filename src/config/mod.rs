pub mod loader;

use serde::{Deserialize, Serialize};

use crate::game::{BOARD_HEIGHT, BOARD_WIDTH, UPDATE_RATE};

pub use loader::{ConfigError, load_config_from, load_config_from_file, save_config_to};

// Smallest field a tetromino can spawn and turn in
pub const MIN_FIELD_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub audio: AudioConfig,
}

// Field and simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    /// Logical updates per second.
    pub update_rate: f64,
    pub show_shadow: bool,
    /// Resume the previous session from the save file on start.
    pub load_saved_game: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            update_rate: UPDATE_RATE,
            show_shadow: true,
            load_saved_game: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sound_enabled: bool,
    pub volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            volume: 0.5,
        }
    }
}

impl AudioConfig {
    /// Configured volume limited to the 0.0 to 1.0 range.
    #[must_use]
    pub fn effective_volume(&self) -> f32 {
        if self.volume.is_nan() {
            0.0
        } else {
            self.volume.clamp(0.0, 1.0)
        }
    }
}

impl Config {
    /// Rejects values the game cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.width < MIN_FIELD_SIZE || game.height < MIN_FIELD_SIZE {
            return Err(ConfigError::Invalid(format!(
                "field must be at least {MIN_FIELD_SIZE}x{MIN_FIELD_SIZE}, got {}x{}",
                game.width, game.height
            )));
        }
        if !(game.update_rate.is_finite() && game.update_rate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "update_rate must be positive, got {}",
                game.update_rate
            )));
        }
        Ok(())
    }

    /// Loads the configuration file, falling back to defaults on any error.
    #[must_use]
    pub fn load() -> Self {
        match load_config_from_file() {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config, using defaults: {e}");
                Self::default()
            }
        }
    }
}
