//! Autonomous spacecraft anomaly mission controller.
//!
//! Loads a scenario, runs the bounded decision loop against the configured
//! oracle, and exports the step log plus a summary for each mission.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use astra::batch::run_batch;
use astra::controller::{CancelToken, ControllerConfig, MissionController};
use astra::core::constraints::violations;
use astra::core::state::MissionState;
use astra::exit_codes;
use astra::io::config::{MissionConfig, OracleKind, load_config, write_config};
use astra::io::scenario::{ScenarioError, discover_scenarios, load_scenario};
use astra::logging;
use astra::mission::{build_oracle, run_mission};

const DEFAULT_CONFIG: &str = "astra.toml";

#[derive(Parser)]
#[command(
    name = "astra",
    version,
    about = "Autonomous spacecraft anomaly mission controller"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scenario until it resolves, fails or runs out of steps.
    Run {
        scenario: PathBuf,
        #[command(flatten)]
        mission: MissionArgs,
    },
    /// Run every `*.json` scenario in a directory, in name order.
    Batch {
        dir: PathBuf,
        #[command(flatten)]
        mission: MissionArgs,
    },
    /// Load a scenario and print its constraint violations.
    Check { scenario: PathBuf },
    /// Write a default config file.
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args)]
struct MissionArgs {
    /// Config file; defaults apply when it does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// Output directory (overrides `output_dir`).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Decision oracle (overrides `oracle.kind`).
    #[arg(long, value_enum)]
    oracle: Option<OracleArg>,
    /// Step budget (overrides `max_steps`).
    #[arg(long)]
    max_steps: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OracleArg {
    Rules,
    Command,
}

impl From<OracleArg> for OracleKind {
    fn from(arg: OracleArg) -> Self {
        match arg {
            OracleArg::Rules => OracleKind::Rules,
            OracleArg::Command => OracleKind::Command,
        }
    }
}

impl MissionArgs {
    fn resolve_config(&self) -> Result<MissionConfig> {
        let mut cfg = load_config(&self.config)?;
        if let Some(out) = &self.out {
            cfg.output_dir = out.clone();
        }
        if let Some(kind) = self.oracle {
            cfg.oracle.kind = kind.into();
        }
        if let Some(max_steps) = self.max_steps {
            cfg.max_steps = max_steps;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            if let Some(scenario_err) = err.downcast_ref::<ScenarioError>() {
                eprintln!("{scenario_err}");
            } else {
                eprintln!("{:#}", err);
            }
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run { scenario, mission } => cmd_run(&scenario, &mission),
        Command::Batch { dir, mission } => cmd_batch(&dir, &mission),
        Command::Check { scenario } => cmd_check(&scenario),
        Command::InitConfig { path, force } => cmd_init_config(&path, force),
    }
}

fn cmd_run(scenario: &Path, args: &MissionArgs) -> Result<i32> {
    let cfg = args.resolve_config()?;
    let controller = MissionController::new(ControllerConfig::from(&cfg), build_oracle(&cfg)?);
    let run = run_mission(scenario, &controller, &cfg.output_dir, &CancelToken::new())?;

    let summary =
        serde_json::to_string_pretty(&run.report.summary).context("serialize summary")?;
    println!("{summary}");
    Ok(exit_codes::for_outcome(run.report.outcome()))
}

fn cmd_batch(dir: &Path, args: &MissionArgs) -> Result<i32> {
    let cfg = args.resolve_config()?;
    let controller = MissionController::new(ControllerConfig::from(&cfg), build_oracle(&cfg)?);
    let paths = discover_scenarios(dir)?;
    let report = run_batch(&paths, &controller, &cfg.output_dir, &CancelToken::new())?;

    for summary in &report.summaries {
        println!(
            "{}\t{}\t{} steps\t{}",
            summary.scenario, summary.outcome, summary.total_steps, summary.final_status
        );
    }
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.path.display(), skipped.error);
    }
    println!("batch summary: {}", report.summary_path.display());

    let code = match report.first_unsuccessful() {
        Some(outcome) => exit_codes::for_outcome(outcome),
        None if !report.skipped.is_empty() => exit_codes::INVALID,
        None => exit_codes::SUCCESS,
    };
    Ok(code)
}

fn cmd_check(scenario: &Path) -> Result<i32> {
    let scenario = load_scenario(scenario)?;
    let state = MissionState::from_scenario(&scenario);
    let problems = violations(&state);

    println!(
        "{}: status {}",
        state.scenario_id(),
        state.current().status()
    );
    if problems.is_empty() {
        println!("constraints satisfied");
        return Ok(exit_codes::SUCCESS);
    }
    for problem in &problems {
        println!("- {problem}");
    }
    Ok(exit_codes::FAILURE)
}

fn cmd_init_config(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(exit_codes::SUCCESS);
    }
    write_config(path, &MissionConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::SUCCESS)
}
