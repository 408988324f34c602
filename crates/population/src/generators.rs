use std::f64::consts::PI;

use rand::Rng;

use crate::distribution::PopulationSpec;
use crate::player::Player;

pub const MIN_ATTRIBUTE_VALUE: f64 = 1.0;
const FIRST_PLAYER_NUMBER: u64 = 1_000_000;

#[derive(Debug, Clone)]
pub struct PopulationGenerator {
    spec: PopulationSpec,
    id_namespace: Option<String>,
    next_player_number: u64,
}

impl PopulationGenerator {
    pub fn new(spec: PopulationSpec) -> Self {
        Self {
            spec,
            id_namespace: None,
            next_player_number: FIRST_PLAYER_NUMBER,
        }
    }

    /// Ids become `player-{namespace}-{n}`. Generators with distinct
    /// namespaces never hand out the same id.
    pub fn with_id_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.id_namespace = Some(namespace.into());
        self
    }

    pub fn spec(&self) -> &PopulationSpec {
        &self.spec
    }

    /// Player ids keep counting across calls, so they stay unique for the
    /// lifetime of the generator.
    pub fn generate(&mut self, count: usize, rng: &mut impl Rng) -> Vec<Player> {
        (0..count).map(|_| self.next_player(rng)).collect()
    }

    fn next_player(&mut self, rng: &mut impl Rng) -> Player {
        let player_id = match &self.id_namespace {
            Some(namespace) => format!("player-{namespace}-{}", self.next_player_number),
            None => format!("player-{}", self.next_player_number),
        };
        let mut player = Player::new(player_id);
        self.next_player_number += 1;

        for (name, source) in &self.spec.attributes {
            let value = source.sample(rng).max(MIN_ATTRIBUTE_VALUE);
            player.attributes.insert(name.clone(), value);
        }
        for (region, source) in &self.spec.latency {
            player.latency_ms.insert(region.clone(), source.sample(rng));
        }

        player
    }
}

/// Integral normal draw clamped to [`MIN_ATTRIBUTE_VALUE`].
pub fn truncated_normal(median: f64, std_dev: f64, rng: &mut impl Rng) -> f64 {
    let value = median + std_dev * standard_normal(rng);
    value.trunc().max(MIN_ATTRIBUTE_VALUE)
}

fn standard_normal(rng: &mut impl Rng) -> f64 {
    // Box-Muller; u1 is kept in (0, 1] so ln stays finite.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{truncated_normal, PopulationGenerator, MIN_ATTRIBUTE_VALUE};
    use crate::distribution::{AttributeSource, PopulationSpec};

    fn skill_spec(median: f64, std_dev: f64) -> PopulationSpec {
        let mut spec = PopulationSpec::default();
        spec.attributes.insert(
            "skill".to_string(),
            AttributeSource::Normal { median, std_dev },
        );
        spec.latency.insert(
            "us-east-1".to_string(),
            AttributeSource::Candidates(vec![25.0, 50.0, 75.0]),
        );
        spec
    }

    #[test]
    fn seeded_generators_are_deterministic() {
        let mut first = PopulationGenerator::new(skill_spec(1000.0, 400.0));
        let mut second = PopulationGenerator::new(skill_spec(1000.0, 400.0));

        let a = first.generate(20, &mut StdRng::seed_from_u64(42));
        let b = second.generate(20, &mut StdRng::seed_from_u64(42));

        assert_eq!(a, b);
    }

    #[test]
    fn player_ids_are_unique_across_calls() {
        let mut generator = PopulationGenerator::new(PopulationSpec::default());
        let mut rng = StdRng::seed_from_u64(1);

        let mut players = generator.generate(50, &mut rng);
        players.extend(generator.generate(50, &mut rng));

        let ids: HashSet<&str> = players.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn namespaced_generators_do_not_share_ids() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut classic =
            PopulationGenerator::new(PopulationSpec::default()).with_id_namespace("7-Classic1");
        let mut practice =
            PopulationGenerator::new(PopulationSpec::default()).with_id_namespace("7-Practice1");

        let mut players = classic.generate(20, &mut rng);
        players.extend(practice.generate(20, &mut rng));

        assert_eq!(players[0].player_id, "player-7-Classic1-1000000");
        let ids: HashSet<&str> = players.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids.len(), 40);
    }

    #[test]
    fn empty_spec_yields_players_without_attributes() {
        let mut generator = PopulationGenerator::new(PopulationSpec::default());

        let players = generator.generate(3, &mut StdRng::seed_from_u64(5));

        assert_eq!(players.len(), 3);
        assert!(players.iter().all(|p| p.attributes.is_empty()));
        assert!(players.iter().all(|p| p.latency_ms.is_empty()));
    }

    #[test]
    fn latency_is_drawn_from_candidates() {
        let mut generator = PopulationGenerator::new(skill_spec(1000.0, 400.0));

        let players = generator.generate(200, &mut StdRng::seed_from_u64(9));

        for player in players {
            let latency = player.latency_ms["us-east-1"];
            assert!([25.0, 50.0, 75.0].contains(&latency));
        }
    }

    #[test]
    fn normal_draws_center_on_median() {
        let mut rng = StdRng::seed_from_u64(3);
        let samples: Vec<f64> = (0..5_000)
            .map(|_| truncated_normal(1000.0, 100.0, &mut rng))
            .collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 1000.0).abs() < 10.0, "mean was {mean}");
    }

    proptest! {
        #[test]
        fn numeric_attributes_never_drop_below_minimum(
            seed in any::<u64>(),
            median in -5_000.0f64..5_000.0,
            std_dev in 0.0f64..2_000.0,
        ) {
            let mut generator = PopulationGenerator::new(skill_spec(median, std_dev));
            let players = generator.generate(32, &mut StdRng::seed_from_u64(seed));

            for player in players {
                let skill = player.attribute("skill").unwrap();
                prop_assert!(skill >= MIN_ATTRIBUTE_VALUE);
                prop_assert_eq!(skill.fract(), 0.0);
            }
        }
    }
}
