use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

pub const ALL_MODES_TOKEN: &str = "All";
pub const NAMED_MODES: [&str; 3] = ["Classic", "Practice", "Survival"];
pub const SMALL_TEAM_MODE: &str = "Survival";

/// Inclusive range of whole seconds to wait between two submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingRange {
    pub lower_secs: u64,
    pub upper_secs: u64,
}

impl PacingRange {
    pub const DEFAULT: Self = Self {
        lower_secs: 1,
        upper_secs: 3,
    };

    pub fn doubled(self) -> Self {
        Self {
            lower_secs: self.lower_secs * 2,
            upper_secs: self.upper_secs * 2,
        }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        let upper = self.upper_secs.max(self.lower_secs);
        Duration::from_secs(rng.gen_range(self.lower_secs..=upper))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameModeSelection {
    pub modes: Vec<String>,
    pub pacing: PacingRange,
}

/// Picks the game modes for one batch from the pool name. Randomised per
/// call, so every batch gets a fresh draw.
pub fn select_game_modes(
    pool_name: &str,
    configured: &[String],
    rng: &mut impl Rng,
) -> GameModeSelection {
    if pool_name.contains(ALL_MODES_TOKEN) {
        let modes = if configured.is_empty() {
            Vec::new()
        } else {
            let size = rng.gen_range(1..=configured.len());
            configured.choose_multiple(rng, size).cloned().collect()
        };
        return GameModeSelection {
            modes,
            pacing: PacingRange::DEFAULT,
        };
    }

    if let Some(mode) = NAMED_MODES.iter().find(|mode| pool_name.contains(*mode)) {
        return GameModeSelection {
            modes: vec![(*mode).to_string()],
            pacing: PacingRange::DEFAULT.doubled(),
        };
    }

    GameModeSelection {
        modes: Vec::new(),
        pacing: PacingRange::DEFAULT,
    }
}
