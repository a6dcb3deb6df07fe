//! NEAT-lite evolutionary training.
//!
//! Evolves a population of weight-vector genomes through self-play matches,
//! checkpointing each generation's champion networks.

use clap::Parser;
use std::fs::File;
use std::io::Write;

use rps_zero::neat::{NeatConfig, Population};

#[derive(Parser, Debug)]
#[command(name = "neat-train")]
#[command(about = "Evolutionary training for the RPS card game")]
struct Args {
    /// Population size
    #[arg(long, default_value_t = 16)]
    pop_size: usize,

    /// Generations to run
    #[arg(long, default_value_t = 10)]
    generations: usize,

    /// Per-weight mutation probability
    #[arg(long, default_value_t = 0.05)]
    mutation_rate: f64,

    /// Probability of gene-wise crossover (vs cloning the fitter parent)
    #[arg(long, default_value_t = 0.7)]
    crossover_rate: f64,

    /// Speciation distance threshold
    #[arg(long, default_value_t = 0.5)]
    compat_threshold: f64,

    /// Games per round-robin pairing
    #[arg(long, default_value_t = 2)]
    eval_games: usize,

    /// Round-robin opponents per genome
    #[arg(long, default_value_t = 3)]
    rr_opponents: usize,

    /// Gaussian deviation of initial weights and mutations
    #[arg(long, default_value_t = 0.1)]
    weight_std: f64,

    /// Hidden layer width of genome networks
    #[arg(long, default_value_t = 64)]
    hidden_size: usize,

    /// MCTS simulations per move in evaluation matches
    #[arg(long, default_value_t = 16)]
    mcts_simulations: usize,

    /// Evaluation workers (0 = CPU count - 1)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Random seed
    #[arg(long, default_value_t = 2025)]
    seed: u64,

    /// Champion checkpoint directory
    #[arg(long, default_value = "checkpoints")]
    output_dir: String,

    /// Champion checkpoint prefix
    #[arg(long, default_value = "neat")]
    prefix: String,

    /// Fitness history CSV
    #[arg(long, default_value = "neat_history.csv")]
    history: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = rps_zero::logging::init("info")?;
    let args = Args::parse();

    let config = NeatConfig {
        pop_size: args.pop_size,
        generations: args.generations,
        mutation_rate: args.mutation_rate,
        crossover_rate: args.crossover_rate,
        compat_threshold: args.compat_threshold,
        eval_games: args.eval_games,
        rr_opponents: args.rr_opponents,
        weight_std: args.weight_std,
        hidden_size: args.hidden_size,
        mcts_simulations: args.mcts_simulations,
        num_workers: args.workers,
        seed: args.seed,
        ..Default::default()
    };

    log::info!("🧬 NEAT-lite training");
    log::info!("   Started {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    log::info!("   Population: {}, generations: {}", config.pop_size, config.generations);
    log::info!(
        "   Mutation: {}, crossover: {}, compat threshold: {}",
        config.mutation_rate,
        config.crossover_rate,
        config.compat_threshold
    );
    log::info!("   Evaluation workers: {}", config.worker_count());

    let mut history = File::create(&args.history)?;
    writeln!(history, "generation,best_fitness,mean_fitness,species")?;

    let generations = config.generations;
    let mut population = Population::new(config);
    for _ in 0..generations {
        let started = std::time::Instant::now();
        let stats = population.evolve_generation()?;
        log::info!(
            "🏅 generation {}: best={:.3}, mean={:.3}, species={} ({:.1}s)",
            stats.generation + 1,
            stats.best_fitness,
            stats.mean_fitness,
            stats.species_count,
            started.elapsed().as_secs_f64()
        );
        // Slot 0 carries the evaluated champion into the new generation.
        population.save_champion(&args.output_dir, &args.prefix, stats.generation)?;

        writeln!(
            history,
            "{},{:.4},{:.4},{}",
            stats.generation + 1,
            stats.best_fitness,
            stats.mean_fitness,
            stats.species_count
        )?;
        history.flush()?;
    }

    log::info!("✅ Evolution complete; history in {}", args.history);
    Ok(())
}
