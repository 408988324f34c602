use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};

use crate::generators::truncated_normal;
use crate::player::DEFAULT_LATENCY_REGION;

const LATENCY_KEY: &str = "latency";

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeSource {
    Normal { median: f64, std_dev: f64 },
    Candidates(Vec<f64>),
}

impl AttributeSource {
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        match self {
            Self::Normal { median, std_dev } => truncated_normal(*median, *std_dev, rng),
            Self::Candidates(values) => values.choose(rng).copied().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttribute {
    pub name: String,
    pub reason: &'static str,
}

/// Parsed `playerAttributeDistributions` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationSpec {
    pub attributes: BTreeMap<String, AttributeSource>,
    pub latency: BTreeMap<String, AttributeSource>,
}

impl PopulationSpec {
    /// Malformed entries are returned as skipped instead of failing the whole
    /// block; the caller decides how loudly to report them.
    pub fn from_player_data(data: &Map<String, Value>) -> (Self, Vec<SkippedAttribute>) {
        let mut spec = Self::default();
        let mut skipped = Vec::new();

        for (name, value) in data {
            if name == LATENCY_KEY {
                spec.parse_latency(value, &mut skipped);
                continue;
            }

            match parse_source(value) {
                Ok(source) => {
                    spec.attributes.insert(name.clone(), source);
                }
                Err(reason) => skipped.push(SkippedAttribute {
                    name: name.clone(),
                    reason,
                }),
            }
        }

        (spec, skipped)
    }

    fn parse_latency(&mut self, value: &Value, skipped: &mut Vec<SkippedAttribute>) {
        let per_region = match value {
            Value::Object(regions) if !is_normal_shape(regions) => regions,
            _ => {
                match parse_source(value) {
                    Ok(source) => {
                        self.latency.insert(DEFAULT_LATENCY_REGION.to_string(), source);
                    }
                    Err(reason) => skipped.push(SkippedAttribute {
                        name: LATENCY_KEY.to_string(),
                        reason,
                    }),
                }
                return;
            }
        };

        for (region, candidates) in per_region {
            match parse_source(candidates) {
                Ok(source) => {
                    self.latency.insert(region.clone(), source);
                }
                Err(reason) => skipped.push(SkippedAttribute {
                    name: format!("{LATENCY_KEY}.{region}"),
                    reason,
                }),
            }
        }
    }
}

fn is_normal_shape(object: &Map<String, Value>) -> bool {
    object.contains_key("median") || object.contains_key("std_dev")
}

fn parse_source(value: &Value) -> Result<AttributeSource, &'static str> {
    match value {
        Value::Object(object) if is_normal_shape(object) => {
            let median = object.get("median").and_then(Value::as_f64);
            let std_dev = object.get("std_dev").and_then(Value::as_f64);
            match (median, std_dev) {
                (Some(median), Some(std_dev))
                    if median.is_finite() && std_dev.is_finite() && std_dev >= 0.0 =>
                {
                    Ok(AttributeSource::Normal { median, std_dev })
                }
                _ => Err("median and std_dev must be finite numbers with std_dev >= 0"),
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Err("candidate list is empty");
            }
            items
                .iter()
                .map(|item| item.as_f64().filter(|value| value.is_finite()))
                .collect::<Option<Vec<f64>>>()
                .map(AttributeSource::Candidates)
                .ok_or("candidate list must contain only finite numbers")
        }
        _ => Err("expected {median, std_dev} or a list of candidate values"),
    }
}
