//! Weight-vector genomes.
//!
//! A genome is nothing more than the two flat weight vectors of an
//! evaluator plus bookkeeping; the evaluator's canonical flattening is the
//! gene encoding, so instantiation is a pair of `set_weights` calls.

use rand::{Rng, RngExt};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::neural::{policy_weight_count, value_weight_count, Evaluator};
use crate::Result;

/// One population member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub policy_weights: Vec<f32>,
    pub value_weights: Vec<f32>,
    pub hidden_size: usize,
    pub fitness: f64,
}

impl Genome {
    /// Samples a fresh genome with `N(0, weight_std)` weights.
    pub fn random<R: Rng>(hidden_size: usize, weight_std: f64, rng: &mut R) -> Genome {
        let normal = Normal::new(0.0, weight_std).expect("valid weight deviation");
        let mut sample = |n: usize| -> Vec<f32> {
            (0..n).map(|_| normal.sample(rng) as f32).collect()
        };
        Genome {
            policy_weights: sample(policy_weight_count(hidden_size)),
            value_weights: sample(value_weight_count(hidden_size)),
            hidden_size,
            fitness: 0.0,
        }
    }

    /// Instantiates the evaluator this genome encodes.
    pub fn to_evaluator(&self) -> Result<Evaluator> {
        Evaluator::from_weights(self.hidden_size, &self.policy_weights, &self.value_weights)
    }

    /// Mean absolute weight difference over both vectors; the speciation
    /// metric. Genomes of different shapes are infinitely far apart.
    pub fn compatibility_distance(&self, other: &Genome) -> f64 {
        if self.policy_weights.len() != other.policy_weights.len()
            || self.value_weights.len() != other.value_weights.len()
        {
            return f64::INFINITY;
        }
        let total_len = self.policy_weights.len() + self.value_weights.len();
        let sum: f64 = self
            .policy_weights
            .iter()
            .zip(&other.policy_weights)
            .chain(self.value_weights.iter().zip(&other.value_weights))
            .map(|(a, b)| (a - b).abs() as f64)
            .sum();
        sum / total_len as f64
    }

    /// Produces a child: with probability `1 - crossover_rate` a clone of
    /// the fitter parent, otherwise uniform gene-wise crossover. The policy
    /// and value vectors recombine independently.
    pub fn crossover<R: Rng>(
        parent_one: &Genome,
        parent_two: &Genome,
        crossover_rate: f64,
        rng: &mut R,
    ) -> Genome {
        let fitter = if parent_one.fitness >= parent_two.fitness {
            parent_one
        } else {
            parent_two
        };
        if rng.random_range(0.0..1.0) >= crossover_rate {
            let mut child = fitter.clone();
            child.fitness = 0.0;
            return child;
        }

        let mut recombine = |a: &[f32], b: &[f32]| -> Vec<f32> {
            a.iter()
                .zip(b)
                .map(|(x, y)| if rng.random_range(0.0..1.0) < 0.5 { *x } else { *y })
                .collect()
        };
        Genome {
            policy_weights: recombine(&parent_one.policy_weights, &parent_two.policy_weights),
            value_weights: recombine(&parent_one.value_weights, &parent_two.value_weights),
            hidden_size: parent_one.hidden_size,
            fitness: 0.0,
        }
    }

    /// Adds `N(0, weight_std)` to each weight with probability
    /// `mutation_rate`.
    pub fn mutate<R: Rng>(&mut self, mutation_rate: f64, weight_std: f64, rng: &mut R) {
        let normal = Normal::new(0.0, weight_std).expect("valid weight deviation");
        for w in self
            .policy_weights
            .iter_mut()
            .chain(self.value_weights.iter_mut())
        {
            if rng.random_range(0.0..1.0) < mutation_rate {
                *w += normal.sample(rng) as f32;
            }
        }
    }
}
