//! AlphaZero-style self-play training loop.
//!
//! Each iteration generates games with the current networks, trains both
//! heads on the collected examples, benchmarks against the random baseline
//! and checkpoints the weights on stable paths so a later run resumes
//! seamlessly.

use clap::Parser;
use std::fs::File;
use std::io::Write;

use rps_zero::agent::{play_series, NeuralMctsAgent, RandomAgent};
use rps_zero::game::GameConfig;
use rps_zero::mcts::MctsConfig;
use rps_zero::neural::{Evaluator, EvaluatorConfig};
use rps_zero::training::{SelfPlayConfig, SelfPlayTrainer};

#[derive(Parser, Debug)]
#[command(name = "selfplay-train")]
#[command(about = "Self-play training for the RPS card game")]
struct Args {
    /// Number of training iterations
    #[arg(long, default_value_t = 20)]
    iterations: usize,

    /// Self-play games per iteration
    #[arg(long, default_value_t = 20)]
    games_per_iter: usize,

    /// MCTS simulations per move during self-play
    #[arg(long, default_value_t = 100)]
    mcts_simulations: usize,

    /// Training epochs per iteration
    #[arg(long, default_value_t = 5)]
    epochs: usize,

    /// Minibatch size
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Learning rate
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Hidden layer width of both heads
    #[arg(long, default_value_t = 128)]
    hidden_size: usize,

    /// Dirichlet noise weight at the search root
    #[arg(long, default_value_t = 0.25)]
    dirichlet_weight: f64,

    /// Benchmark games against the random baseline per iteration
    #[arg(long, default_value_t = 20)]
    benchmark_games: usize,

    /// Random seed
    #[arg(long, default_value_t = 2025)]
    seed: u64,

    /// Checkpoint directory
    #[arg(long, default_value = "checkpoints")]
    output_dir: String,

    /// Checkpoint file prefix
    #[arg(long, default_value = "selfplay")]
    prefix: String,

    /// Ignore an existing checkpoint and start from fresh weights
    #[arg(long, default_value_t = false)]
    fresh_start: bool,

    /// Training history CSV
    #[arg(long, default_value = "training_history.csv")]
    history: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = rps_zero::logging::init("info")?;
    let args = Args::parse();

    log::info!("🚀 Self-play training");
    log::info!("   Started {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    log::info!("   Iterations: {}, games/iter: {}", args.iterations, args.games_per_iter);
    log::info!(
        "   MCTS sims: {}, Dirichlet weight: {}",
        args.mcts_simulations,
        args.dirichlet_weight
    );
    log::info!(
        "   Epochs: {}, batch: {}, lr: {}, hidden: {}",
        args.epochs,
        args.batch_size,
        args.learning_rate,
        args.hidden_size
    );

    let config = SelfPlayConfig {
        iterations: args.iterations,
        games_per_iteration: args.games_per_iter,
        mcts: MctsConfig {
            num_simulations: args.mcts_simulations,
            dirichlet_weight: args.dirichlet_weight,
            ..Default::default()
        },
        game: GameConfig::default(),
        epochs: args.epochs,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        output_dir: args.output_dir.clone(),
        prefix: args.prefix.clone(),
        seed: args.seed,
    };

    let fresh = Evaluator::new(&EvaluatorConfig {
        hidden_size: args.hidden_size,
        seed: args.seed as i64,
        ..Default::default()
    })?;
    let mut trainer = if args.fresh_start {
        log::info!("   Starting with fresh weights");
        SelfPlayTrainer::new(config.clone(), fresh)
    } else {
        SelfPlayTrainer::resume_or_start(config.clone(), fresh)?
    };

    let mut history = File::create(&args.history)?;
    writeln!(history, "iteration,examples,policy_loss,value_loss,win_rate_vs_random")?;

    for iteration in 0..args.iterations {
        log::info!("\n📊 Iteration {}/{}", iteration + 1, args.iterations);
        let started = std::time::Instant::now();
        let stats = trainer.run_iteration()?;
        log::info!(
            "   {} examples, policy_loss={:.4}, value_loss={:.4} ({:.1}s)",
            stats.examples,
            stats.policy_loss,
            stats.value_loss,
            started.elapsed().as_secs_f64()
        );

        let win_rate = benchmark_vs_random(&trainer, &args, iteration)?;
        log::info!("   win rate vs random: {:.1}%", win_rate * 100.0);

        writeln!(
            history,
            "{},{},{:.4},{:.4},{:.4}",
            stats.iteration + 1,
            stats.examples,
            stats.policy_loss,
            stats.value_loss,
            win_rate
        )?;
        history.flush()?;
    }

    log::info!("✅ Training complete; history in {}", args.history);
    Ok(())
}

fn benchmark_vs_random(
    trainer: &SelfPlayTrainer,
    args: &Args,
    iteration: usize,
) -> Result<f64, Box<dyn std::error::Error>> {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    if args.benchmark_games == 0 {
        return Ok(0.0);
    }
    let mut agent = NeuralMctsAgent::new(
        "candidate",
        trainer.evaluator().try_clone()?,
        MctsConfig {
            num_simulations: args.mcts_simulations,
            ..Default::default()
        },
        args.seed ^ iteration as u64,
    );
    let mut baseline = RandomAgent::new(args.seed.wrapping_add(iteration as u64));
    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(1000 + iteration as u64));
    let tally = play_series(
        &mut agent,
        &mut baseline,
        args.benchmark_games,
        &GameConfig::default(),
        &mut rng,
    )?;
    Ok(tally.score())
}
