//! MCTS search parameters.

use serde::{Deserialize, Serialize};

/// Tunable parameters of the PUCT search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Simulations per search call.
    /// Default: 200
    pub num_simulations: usize,

    /// PUCT exploration constant; higher values explore more.
    /// Default: 1.5
    pub c_puct: f64,

    /// Dirichlet concentration for root noise. Lower values produce spikier
    /// noise.
    /// Default: 0.3
    pub dirichlet_alpha: f64,

    /// Mixing weight of the root noise: `(1-w)*prior + w*noise`. Zero
    /// disables the noise entirely; self-play typically uses 0.25.
    /// Default: 0.0
    pub dirichlet_weight: f64,

    /// Worker threads sharing the tree. 1 runs the serial search.
    /// Default: 1
    pub num_workers: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 200,
            c_puct: 1.5,
            dirichlet_alpha: 0.3,
            dirichlet_weight: 0.0,
            num_workers: 1,
        }
    }
}

impl MctsConfig {
    /// Self-play profile: root noise on, as in AlphaGo Zero.
    pub fn self_play(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            dirichlet_weight: 0.25,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disables_noise() {
        let config = MctsConfig::default();
        assert_eq!(config.dirichlet_weight, 0.0);
        assert_eq!(config.num_workers, 1);
    }

    #[test]
    fn test_self_play_profile() {
        let config = MctsConfig::self_play(64);
        assert_eq!(config.num_simulations, 64);
        assert!(config.dirichlet_weight > 0.0);
    }

    #[test]
    fn test_serde_round_trip() {
        let config = MctsConfig::self_play(128);
        let json = serde_json::to_string(&config).unwrap();
        let back: MctsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_simulations, 128);
        assert_eq!(back.dirichlet_weight, config.dirichlet_weight);
    }
}
