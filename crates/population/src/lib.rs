mod distribution;
mod game_modes;
mod generators;
mod partition;
mod player;

pub use distribution::{AttributeSource, PopulationSpec, SkippedAttribute};
pub use game_modes::{
    select_game_modes, GameModeSelection, PacingRange, ALL_MODES_TOKEN, NAMED_MODES,
    SMALL_TEAM_MODE,
};
pub use generators::{truncated_normal, PopulationGenerator, MIN_ATTRIBUTE_VALUE};
pub use partition::{split_into_batches, team_size_limit, SINGLE_BATCH_THRESHOLD};
pub use player::{Player, DEFAULT_LATENCY_REGION};
