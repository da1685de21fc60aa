//! Game configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```
//! use settlers_core::GameConfig;
//!
//! let config = GameConfig::from_json(r#"{ "seed": 42 }"#).unwrap();
//! assert_eq!(config.seed, Some(42));
//! assert_eq!(config.victory_points_to_win, 10);
//! ```

use crate::game::GameError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Points needed at end of turn to win
    pub victory_points_to_win: u32,
    /// Seed for board generation and every later random draw.
    /// `None` draws a fresh seed from the thread RNG.
    pub seed: Option<u64>,
    /// Shuffle port kinds over the fixed port sites
    pub shuffle_ports: bool,
    /// A seven forces a discard from hands larger than this
    pub discard_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            victory_points_to_win: 10,
            seed: None,
            shuffle_ports: false,
            discard_limit: 7,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        serde_json::from_str(json).map_err(|e| GameError::Config(e.to_string()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
