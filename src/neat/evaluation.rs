//! Parallel fitness evaluation.
//!
//! Every genome receives its own task list (random round-robin pairings
//! plus hall-of-fame games); the tasks go into a shared rayon pool sized to
//! `max(1, cpus - 1)` and each worker runs its matches on fully independent
//! game and search instances. Results accumulate into per-genome atomic
//! tallies, and progress is reported on a seconds cadence rather than per
//! match.

use rand::rngs::StdRng;
use rand::{Rng, RngExt, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use crate::agent::{play_series, GenomeAgent};
use crate::mcts::MctsConfig;
use crate::neat::config::NeatConfig;
use crate::neat::genome::Genome;
use crate::{Result, RpsError};

/// Seconds between progress reports.
const REPORT_CADENCE_SECS: u64 = 5;

enum OpponentRef {
    Population(usize),
    HallOfFame(usize),
}

struct EvalTask {
    genome: usize,
    opponent: OpponentRef,
    games: usize,
    seed: u64,
}

#[derive(Default)]
struct Tally {
    wins: AtomicU32,
    draws: AtomicU32,
    games: AtomicU32,
}

/// Plays every evaluation match for the generation and writes fitness
/// `(wins + 0.5 * draws) / games` back into `genomes`.
pub fn evaluate_population<R: Rng>(
    genomes: &mut [Genome],
    hall_of_fame: &[Genome],
    config: &NeatConfig,
    rng: &mut R,
) -> Result<()> {
    let tasks = build_tasks(genomes.len(), hall_of_fame.len(), config, rng);
    let tallies: Vec<Tally> = genomes.iter().map(|_| Tally::default()).collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .build()
        .map_err(|e| RpsError::Model(format!("failed to build worker pool: {}", e)))?;

    let start = Instant::now();
    let last_report = AtomicU64::new(0);
    let completed = AtomicUsize::new(0);
    let total = tasks.len();

    let genomes_ref: &[Genome] = genomes;
    pool.install(|| {
        tasks.par_iter().for_each(|task| {
            let opponent = match task.opponent {
                OpponentRef::Population(index) => &genomes_ref[index],
                OpponentRef::HallOfFame(index) => &hall_of_fame[index],
            };
            match run_match(&genomes_ref[task.genome], opponent, task.games, task.seed, config)
            {
                Ok(tally) => {
                    let slot = &tallies[task.genome];
                    slot.wins.fetch_add(tally.wins, Ordering::Relaxed);
                    slot.draws.fetch_add(tally.draws, Ordering::Relaxed);
                    slot.games.fetch_add(tally.games(), Ordering::Relaxed);
                }
                Err(e) => log::warn!("evaluation match failed: {}", e),
            }

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            let elapsed = start.elapsed().as_secs();
            let last = last_report.load(Ordering::Relaxed);
            if elapsed >= last + REPORT_CADENCE_SECS
                && last_report
                    .compare_exchange(last, elapsed, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
            {
                log::info!("⚙️ evaluated {}/{} matches", done, total);
            }
        });
    });

    for (genome, tally) in genomes.iter_mut().zip(&tallies) {
        let games = tally.games.load(Ordering::Relaxed);
        genome.fitness = if games == 0 {
            0.0
        } else {
            (tally.wins.load(Ordering::Relaxed) as f64
                + 0.5 * tally.draws.load(Ordering::Relaxed) as f64)
                / games as f64
        };
    }
    Ok(())
}

fn build_tasks<R: Rng>(
    pop_size: usize,
    hof_size: usize,
    config: &NeatConfig,
    rng: &mut R,
) -> Vec<EvalTask> {
    let mut tasks = Vec::new();
    for genome in 0..pop_size {
        let mut candidates: Vec<usize> = (0..pop_size).filter(|&o| o != genome).collect();
        let pairings = config.rr_opponents.min(candidates.len());
        for _ in 0..pairings {
            let pick = rng.random_range(0..candidates.len());
            let opponent = candidates.swap_remove(pick);
            tasks.push(EvalTask {
                genome,
                opponent: OpponentRef::Population(opponent),
                games: config.eval_games,
                seed: rng.random_range(0..u64::MAX),
            });
        }
        for member in 0..hof_size {
            tasks.push(EvalTask {
                genome,
                opponent: OpponentRef::HallOfFame(member),
                games: config.hof_games,
                seed: rng.random_range(0..u64::MAX),
            });
        }
    }
    tasks
}

/// Runs one pairing on fresh agents; the tally is from `genome`'s side.
fn run_match(
    genome: &Genome,
    opponent: &Genome,
    games: usize,
    seed: u64,
    config: &NeatConfig,
) -> Result<crate::agent::MatchTally> {
    let mcts = MctsConfig {
        num_simulations: config.mcts_simulations,
        ..Default::default()
    };
    let mut agent = GenomeAgent::from_genome("candidate", genome, mcts, seed)?;
    let mut rival = GenomeAgent::from_genome("rival", opponent, mcts, seed.wrapping_add(1))?;
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(2));
    play_series(&mut agent, &mut rival, games, &config.game, &mut rng)
}
