//! Agent-vs-agent evaluation arena.
//!
//! Pits any two of {random, neural MCTS from a checkpoint, minimax} against
//! each other over a series of games and reports the tally. With
//! `--archive` it instead generates an oracle-labelled dataset by letting
//! the minimax engine play itself.

use clap::Parser;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rps_zero::agent::{
    play_series, Agent, MinimaxAgent, NeuralMctsAgent, RandomAgent,
};
use rps_zero::game::GameConfig;
use rps_zero::mcts::MctsConfig;
use rps_zero::minimax::{MinimaxConfig, MinimaxEngine};
use rps_zero::neural::Evaluator;
use rps_zero::recording::{generate_minimax_dataset, ArchiveWriter};

#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(about = "Head-to-head agent evaluation for the RPS card game")]
struct Args {
    /// First player: random | mcts | minimax
    #[arg(long, default_value = "mcts")]
    player_one: String,

    /// Second player: random | mcts | minimax
    #[arg(long, default_value = "random")]
    player_two: String,

    /// Policy checkpoint for an mcts player
    #[arg(long)]
    policy: Option<String>,

    /// Value checkpoint for an mcts player
    #[arg(long)]
    value: Option<String>,

    /// Games in the series (sides alternate)
    #[arg(long, default_value_t = 50)]
    games: usize,

    /// MCTS simulations per move
    #[arg(long, default_value_t = 100)]
    mcts_simulations: usize,

    /// Minimax depth limit
    #[arg(long, default_value_t = 6)]
    minimax_depth: u32,

    /// Minimax budget per move in milliseconds
    #[arg(long, default_value_t = 250)]
    minimax_budget_ms: u64,

    /// Random seed
    #[arg(long, default_value_t = 2025)]
    seed: u64,

    /// Generate an oracle dataset at this path instead of playing a series
    #[arg(long)]
    archive: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _logger = rps_zero::logging::init("info")?;
    let args = Args::parse();

    if let Some(path) = &args.archive {
        let mut engine = MinimaxEngine::new(MinimaxConfig {
            max_depth: args.minimax_depth,
            time_budget_ms: args.minimax_budget_ms,
            use_cache: true,
        });
        let mut writer = ArchiveWriter::open(path)?;
        let mut rng = StdRng::seed_from_u64(args.seed);
        let rows = generate_minimax_dataset(
            &mut engine,
            args.games,
            &GameConfig::default(),
            &mut writer,
            &mut rng,
        )?;
        log::info!("💾 archived {} oracle positions to {}", rows, path);
        return Ok(());
    }

    let mut player_one = build_agent(&args.player_one, &args, args.seed)?;
    let mut player_two = build_agent(&args.player_two, &args, args.seed.wrapping_add(1))?;

    log::info!(
        "⚔️ {} vs {} over {} games",
        player_one.name(),
        player_two.name(),
        args.games
    );

    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(2));
    let tally = play_series(
        player_one.as_mut(),
        player_two.as_mut(),
        args.games,
        &GameConfig::default(),
        &mut rng,
    )?;

    log::info!(
        "🏁 {}: {} wins, {} draws, {} losses (score {:.1}%)",
        player_one.name(),
        tally.wins,
        tally.draws,
        tally.losses,
        tally.score() * 100.0
    );
    Ok(())
}

fn build_agent(
    kind: &str,
    args: &Args,
    seed: u64,
) -> Result<Box<dyn Agent>, Box<dyn std::error::Error>> {
    match kind {
        "random" => Ok(Box::new(RandomAgent::new(seed))),
        "minimax" => Ok(Box::new(MinimaxAgent::new(MinimaxConfig {
            max_depth: args.minimax_depth,
            time_budget_ms: args.minimax_budget_ms,
            use_cache: true,
        }))),
        "mcts" => {
            let (policy, value) = match (&args.policy, &args.value) {
                (Some(p), Some(v)) => (p.clone(), v.clone()),
                _ => return Err("mcts player needs --policy and --value checkpoints".into()),
            };
            let evaluator = Evaluator::load(&policy, &value)?;
            Ok(Box::new(NeuralMctsAgent::new(
                "neural-mcts",
                evaluator,
                MctsConfig {
                    num_simulations: args.mcts_simulations,
                    ..Default::default()
                },
                seed,
            )))
        }
        other => Err(format!("unknown agent kind '{}'", other).into()),
    }
}
