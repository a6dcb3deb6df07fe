//! Population lifecycle: evaluation, speciation, reproduction and champion
//! checkpointing.

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::path::{Path, PathBuf};

use crate::neat::config::NeatConfig;
use crate::neat::evaluation::evaluate_population;
use crate::neat::genome::Genome;
use crate::Result;

/// A cluster of compatible genomes. The representative is the genome that
/// founded the species this generation.
pub struct Species {
    pub representative: Genome,
    pub members: Vec<usize>,
}

/// Summary of one finished generation.
#[derive(Debug, Clone)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub species_count: usize,
}

/// A fixed-size population of genomes plus the hall of fame.
pub struct Population {
    pub genomes: Vec<Genome>,
    pub hall_of_fame: Vec<Genome>,
    pub generation: usize,
    config: NeatConfig,
    rng: StdRng,
}

impl Population {
    /// Seeds `pop_size` random genomes.
    pub fn new(config: NeatConfig) -> Population {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let genomes = (0..config.pop_size)
            .map(|_| Genome::random(config.hidden_size, config.weight_std, &mut rng))
            .collect();
        Population {
            genomes,
            hall_of_fame: Vec::new(),
            generation: 0,
            config,
            rng,
        }
    }

    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Highest-fitness genome, first occurrence on ties.
    pub fn champion(&self) -> &Genome {
        self.genomes
            .iter()
            .reduce(|best, g| if g.fitness > best.fitness { g } else { best })
            .expect("population is never empty")
    }

    /// Runs one full generation: evaluate, speciate, update the hall of
    /// fame, reproduce. Returns the stats of the evaluated generation.
    pub fn evolve_generation(&mut self) -> Result<GenerationStats> {
        evaluate_population(
            &mut self.genomes,
            &self.hall_of_fame,
            &self.config,
            &mut self.rng,
        )?;

        let species = self.speciate();
        let stats = GenerationStats {
            generation: self.generation,
            best_fitness: self.champion().fitness,
            mean_fitness: self.genomes.iter().map(|g| g.fitness).sum::<f64>()
                / self.genomes.len() as f64,
            species_count: species.len(),
        };

        self.update_hall_of_fame();
        self.reproduce(&species);
        self.generation += 1;
        Ok(stats)
    }

    /// Greedy speciation: genomes are scanned in index order and join the
    /// first species whose representative is within `compat_threshold`;
    /// otherwise they found a new species around themselves.
    fn speciate(&self) -> Vec<Species> {
        let mut species: Vec<Species> = Vec::new();
        for (index, genome) in self.genomes.iter().enumerate() {
            match species.iter_mut().find(|s| {
                genome.compatibility_distance(&s.representative)
                    < self.config.compat_threshold
            }) {
                Some(home) => home.members.push(index),
                None => species.push(Species {
                    representative: genome.clone(),
                    members: vec![index],
                }),
            }
        }
        species
    }

    fn update_hall_of_fame(&mut self) {
        self.hall_of_fame.push(self.champion().clone());
        let excess = self.hall_of_fame.len().saturating_sub(self.config.hof_size);
        if excess > 0 {
            self.hall_of_fame.drain(..excess);
        }
    }

    /// Elitism plus species-local breeding: the champion is copied unchanged
    /// into slot 0, every other slot is filled from a random species by
    /// crossover of two uniformly drawn parents followed by mutation.
    fn reproduce(&mut self, species: &[Species]) {
        let mut next = Vec::with_capacity(self.genomes.len());
        next.push(self.champion().clone());

        while next.len() < self.genomes.len() {
            let home = &species[self.rng.random_range(0..species.len())];
            let pick_one = home.members[self.rng.random_range(0..home.members.len())];
            let pick_two = home.members[self.rng.random_range(0..home.members.len())];
            let mut child = Genome::crossover(
                &self.genomes[pick_one],
                &self.genomes[pick_two],
                self.config.crossover_rate,
                &mut self.rng,
            );
            child.mutate(
                self.config.mutation_rate,
                self.config.weight_std,
                &mut self.rng,
            );
            next.push(child);
        }
        self.genomes = next;
    }

    /// Persists the champion's networks under
    /// `<output_dir>/<prefix>_gen<NN>_policy.safetensors` and the matching
    /// `_value` path, tagged with the given generation number.
    pub fn save_champion(
        &self,
        output_dir: impl AsRef<Path>,
        prefix: &str,
        generation: usize,
    ) -> Result<(PathBuf, PathBuf)> {
        let dir = output_dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let policy_path = dir.join(format!(
            "{}_gen{:02}_policy.safetensors",
            prefix, generation
        ));
        let value_path = dir.join(format!(
            "{}_gen{:02}_value.safetensors",
            prefix, generation
        ));

        let evaluator = self.champion().to_evaluator()?;
        evaluator.save(&policy_path, &value_path)?;
        log::info!(
            "💾 generation {} champion saved (fitness {:.3})",
            generation,
            self.champion().fitness
        );
        Ok((policy_path, value_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config() -> NeatConfig {
        NeatConfig {
            pop_size: 4,
            rr_opponents: 1,
            eval_games: 1,
            hof_games: 1,
            hof_size: 2,
            hidden_size: 16,
            mcts_simulations: 2,
            num_workers: 2,
            seed: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_population_seeding() {
        let population = Population::new(tiny_config());
        assert_eq!(population.genomes.len(), 4);
        assert_eq!(population.generation, 0);
        assert!(population.hall_of_fame.is_empty());
    }

    #[test]
    fn test_speciation_with_loose_threshold_is_one_species() {
        let mut population = Population::new(tiny_config());
        population.config.compat_threshold = f64::INFINITY;
        let species = population.speciate();
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].members.len(), 4);
    }

    #[test]
    fn test_speciation_with_zero_threshold_isolates_everyone() {
        let population = Population::new(NeatConfig {
            compat_threshold: 0.0,
            ..tiny_config()
        });
        let species = population.speciate();
        assert_eq!(species.len(), 4);
    }

    #[test]
    fn test_champion_survives_reproduction_unchanged() {
        let mut population = Population::new(tiny_config());
        let stats = population.evolve_generation().unwrap();
        assert_eq!(stats.generation, 0);

        // The champion of the evaluated generation sits in slot 0 with its
        // weights (and recorded fitness) intact.
        let preserved = &population.genomes[0];
        let hof_entry = population.hall_of_fame.last().unwrap();
        assert_eq!(preserved.policy_weights, hof_entry.policy_weights);
        assert_eq!(preserved.value_weights, hof_entry.value_weights);
        assert_eq!(preserved.fitness, hof_entry.fitness);
        assert_eq!(population.generation, 1);
    }

    #[test]
    fn test_hall_of_fame_is_capped() {
        let mut population = Population::new(tiny_config());
        for _ in 0..3 {
            population.update_hall_of_fame();
        }
        assert_eq!(population.hall_of_fame.len(), 2);
    }

    #[test]
    fn test_save_champion_writes_both_heads() {
        let dir = tempfile::tempdir().unwrap();
        let population = Population::new(tiny_config());
        let (policy_path, value_path) =
            population.save_champion(dir.path(), "neat", 0).unwrap();

        assert!(policy_path.exists());
        assert!(value_path.exists());
        assert!(policy_path.ends_with("neat_gen00_policy.safetensors"));

        let reloaded = crate::neural::Evaluator::load(&policy_path, &value_path).unwrap();
        assert_eq!(reloaded.hidden_size(), 16);
    }
}
