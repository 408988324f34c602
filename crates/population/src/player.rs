use std::collections::BTreeMap;

use serde::Serialize;

pub const DEFAULT_LATENCY_REGION: &str = "us-east-1";

/// A synthetic player. Game-mode tags are attached per batch at submission
/// time, so the player itself never changes after generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub player_id: String,
    pub attributes: BTreeMap<String, f64>,
    pub latency_ms: BTreeMap<String, f64>,
}

impl Player {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            attributes: BTreeMap::new(),
            latency_ms: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }
}
