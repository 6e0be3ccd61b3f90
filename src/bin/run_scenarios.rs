//! Scenario sweep binary.
//!
//! Usage:
//!   cargo run --release --bin run_scenarios -- [OPTIONS]
//!
//! Runs every signal condition x strategy x population size combination and
//! prints a summary table, or plays one detailed run with
//! `--single-scenario`. Set `RUST_LOG=debug` for per-run logging.

use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::process;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use convention_sim::experiment::{run_experiment, run_single, ExperimentConfig, SingleRunReport};
use convention_sim::sim::{uniform_roster, SignalCondition, StrategyKind};

/// Convention formation experiments in the Red/Blue coordination game.
#[derive(Parser, Debug)]
#[command(name = "run_scenarios", version)]
struct Cli {
    /// Population sizes, space or comma separated (e.g. 2 4 8)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    agent_sizes: Option<Vec<usize>>,

    /// Independent runs per scenario
    #[arg(long)]
    runs_per_scenario: Option<usize>,

    /// Round cap per run
    #[arg(long)]
    max_rounds: Option<u64>,

    /// Base random seed
    #[arg(long, short)]
    seed: Option<u64>,

    /// Experiment configuration JSON file
    #[arg(long, short)]
    config: Option<String>,

    /// Worker threads (default: all cores)
    #[arg(long, short)]
    threads: Option<usize>,

    /// Play one detailed run instead of the full sweep
    #[arg(long)]
    single_scenario: bool,

    /// Signal condition: NO_SIGNAL, MANDATORY_SIGNAL or OPTIONAL_SIGNAL
    #[arg(long)]
    signal_condition: Option<SignalCondition>,

    /// Strategy: HISTORY_BASED or REWARD_BASED
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Population size for a single run
    #[arg(long, default_value_t = 4)]
    num_agents: usize,

    /// Write results as JSON to this file
    #[arg(long, short)]
    output: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("loading configuration from {}", path);
            ExperimentConfig::from_json_file(path)?
        }
        None => ExperimentConfig::default(),
    };

    if let Some(sizes) = cli.agent_sizes.clone() {
        config = config.with_agent_sizes(sizes);
    }
    if let Some(runs) = cli.runs_per_scenario {
        config = config.with_runs(runs);
    }
    if let Some(max_rounds) = cli.max_rounds {
        config = config.with_max_rounds(max_rounds);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    if let Some(condition) = cli.signal_condition {
        config.conditions = vec![condition];
    }
    if let Some(strategy) = cli.strategy {
        config.strategies = vec![strategy];
    }

    if cli.single_scenario {
        run_single_mode(&cli, &config)
    } else {
        run_sweep(&cli, &config)
    }
}

fn run_sweep(cli: &Cli, config: &ExperimentConfig) -> Result<(), Box<dyn Error>> {
    config.validate()?;

    println!("=================================================");
    println!("  Convention Formation Experiments");
    println!("=================================================");
    println!();
    println!("Agent sizes: {:?}", config.agent_sizes);
    println!("Runs per scenario: {}", config.runs_per_scenario);
    println!("Max rounds: {}", config.max_rounds);
    println!("Scenarios: {}", config.num_scenarios());
    println!();

    let progress = ProgressBar::new(config.num_scenarios() as u64);
    progress.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let start = Instant::now();
    let results = run_experiment(config, |done, _, summary| {
        progress.set_position(done as u64);
        progress.set_message(summary.scenario.to_string());
    })?;
    progress.finish_with_message("done");

    println!();
    results.print_summary();
    println!();
    println!("Total time: {:.2}s", start.elapsed().as_secs_f64());

    if let Some(path) = &cli.output {
        results.save_json(path)?;
        println!("Results written to {}", path);
    }

    Ok(())
}

fn run_single_mode(cli: &Cli, config: &ExperimentConfig) -> Result<(), Box<dyn Error>> {
    let condition = cli.signal_condition.unwrap_or(SignalCondition::MandatorySignal);
    let strategy = cli.strategy.unwrap_or(StrategyKind::HistoryBased);
    let roster = uniform_roster(cli.num_agents, strategy, &config.history, &config.reward);

    println!("=== {} - {} ({} agents) ===", condition.label(), strategy.label(), cli.num_agents);

    let start = Instant::now();
    let report = run_single(&roster, condition, config.max_rounds, config.seed, 1_000)?;
    print_report(&report);
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    if let Some(path) = &cli.output {
        let json = serde_json::to_string_pretty(&report)?;
        File::create(path)?.write_all(json.as_bytes())?;
        println!("Report written to {}", path);
    }

    Ok(())
}

fn print_report(report: &SingleRunReport) {
    println!("Seed: {}", report.seed);
    match report.convention() {
        Some(colour) => println!("Converged on {} after {} rounds", colour, report.outcome.rounds),
        None => println!("No convergence within {} rounds", report.outcome.rounds),
    }
    println!("Mean success rate: {:.3}", report.mean_success_rate);
    println!("Mean blue ratio: {:.3}", report.mean_blue_ratio);
    println!();

    for sample in &report.samples {
        println!(
            "Round {:>8} | Success: {:>5.2} | Blue: {:>5.2}",
            sample.round, sample.success_rate, sample.blue_ratio
        );
    }
    if !report.samples.is_empty() {
        println!();
    }

    println!("Final agent states:");
    for agent in &report.agents {
        println!("  {}", agent.summary());
    }
}
