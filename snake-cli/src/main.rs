use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use snake_batch::{render_ascii, BatchEnv, BatchMetrics, ACTION_MOVES};
use snake_config::{default_batch_config, load_batch_config_from_path, BatchConfig};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "snake-cli")]
#[command(about = "Batched multi-agent snake environment driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the batch with uniformly random actions and summarize the episodes.
    Run {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long, default_value_t = 1_000)]
        rounds: u32,
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Time step rounds.
    Benchmark {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long, default_value_t = 500)]
        rounds: u32,
    },
    /// Print slot 0 after every round.
    Watch {
        #[command(flatten)]
        batch: BatchArgs,
        #[arg(long, default_value_t = 50)]
        rounds: u32,
        #[arg(long, default_value_t = 200)]
        delay_ms: u64,
    },
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    slots: Option<usize>,
    #[arg(long)]
    models: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    rounds: u32,
    seed: u64,
    slots: usize,
    models: usize,
    episodes: u64,
    primary_wins: u64,
    primary_draws: u64,
    primary_losses: u64,
    mean_episode_turns: Option<f64>,
    mean_episode_return: Option<f64>,
    reward_sum: f64,
}

#[derive(Debug, Serialize)]
struct BenchmarkSummary {
    rounds: u32,
    slots: usize,
    threads: usize,
    elapsed_ms: u128,
    rounds_per_sec: f64,
    env_steps_per_sec: f64,
    episodes: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "snake_cli=info,snake_batch=info".to_owned()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            batch,
            rounds,
            format,
            out,
        } => run_command(batch, rounds, format, out),
        Commands::Benchmark { batch, rounds } => benchmark_command(batch, rounds),
        Commands::Watch {
            batch,
            rounds,
            delay_ms,
        } => watch_command(batch, rounds, delay_ms),
    }
}

fn run_command(
    args: BatchArgs,
    rounds: u32,
    format: OutputFormat,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut env = build_env(args)?;
    let mut rng = StdRng::seed_from_u64(env.seed());
    for _ in 0..rounds {
        randomize_actions(&mut env, &mut rng)?;
        env.step().context("step round failed")?;
    }
    let metrics = env.metrics();

    let summary = RunSummary {
        rounds,
        seed: env.seed(),
        slots: env.num_slots(),
        models: env.num_models(),
        episodes: metrics.episodes_completed,
        primary_wins: metrics.primary_wins,
        primary_draws: metrics.primary_draws,
        primary_losses: metrics.primary_losses,
        mean_episode_turns: metrics.mean_episode_turns(),
        mean_episode_return: metrics.mean_episode_return(),
        reward_sum: metrics.reward_sum,
    };

    let text = match format {
        OutputFormat::Pretty => format!(
            "rounds={} seed={} slots={} models={} episodes={} wins={} draws={} losses={} \
             mean_turns={} mean_return={} reward_sum={:.2}",
            summary.rounds,
            summary.seed,
            summary.slots,
            summary.models,
            summary.episodes,
            summary.primary_wins,
            summary.primary_draws,
            summary.primary_losses,
            format_mean(summary.mean_episode_turns),
            format_mean(summary.mean_episode_return),
            summary.reward_sum,
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&summary)?,
    };
    write_output(text, out)
}

fn format_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |value| format!("{value:.2}"))
}

fn benchmark_command(args: BatchArgs, rounds: u32) -> Result<()> {
    let rounds = rounds.max(1);
    let mut env = build_env(args)?;
    let mut rng = StdRng::seed_from_u64(env.seed());

    let start = Instant::now();
    for _ in 0..rounds {
        randomize_actions(&mut env, &mut rng)?;
        env.step().context("step round failed")?;
    }
    let elapsed = start.elapsed();
    let BatchMetrics {
        slot_steps,
        episodes_completed,
        ..
    } = env.metrics();

    let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
    let summary = BenchmarkSummary {
        rounds,
        slots: env.num_slots(),
        threads: env.config().threads,
        elapsed_ms: elapsed.as_millis(),
        rounds_per_sec: f64::from(rounds) / seconds,
        env_steps_per_sec: slot_steps as f64 / seconds,
        episodes: episodes_completed,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn watch_command(args: BatchArgs, rounds: u32, delay_ms: u64) -> Result<()> {
    let mut env = build_env(args)?;
    let mut rng = StdRng::seed_from_u64(env.seed());
    let delay = Duration::from_millis(delay_ms);

    print_view(&env);
    for _ in 0..rounds {
        randomize_actions(&mut env, &mut rng)?;
        env.step().context("step round failed")?;
        print_view(&env);
        std::thread::sleep(delay);
    }
    Ok(())
}

fn print_view(env: &BatchEnv) {
    if let Some(view) = env.render() {
        println!("{}", render_ascii(&view));
    }
}

fn randomize_actions(env: &mut BatchEnv, rng: &mut StdRng) -> Result<()> {
    for model in 0..env.num_models() {
        for action in env.actions_mut(model)?.iter_mut() {
            *action = rng.random_range(0..ACTION_MOVES.len() as u8);
        }
    }
    Ok(())
}

fn build_env(args: BatchArgs) -> Result<BatchEnv> {
    let config = resolve_config(args)?;
    info!(
        slots = config.slots,
        models = config.models,
        threads = config.threads,
        "starting batch"
    );
    BatchEnv::new(config).context("failed to build batch env")
}

fn resolve_config(args: BatchArgs) -> Result<BatchConfig> {
    let mut config = match &args.config {
        Some(path) => load_batch_config_from_path(path)?,
        None => default_batch_config(),
    };
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(slots) = args.slots {
        config.slots = slots;
    }
    if let Some(models) = args.models {
        config.models = models;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

fn write_output(text: String, out: Option<PathBuf>) -> Result<()> {
    if let Some(path) = out {
        fs::write(&path, text)
            .with_context(|| format!("failed writing output to {}", path.display()))?;
    } else {
        println!("{text}");
    }
    Ok(())
}
