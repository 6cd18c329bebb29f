use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vgpio_testing::{builtin, builtins, run_scenario, Scenario};

/// Firmware milestone scenarios over the virtual GPIO channel
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in scenarios
    List,

    /// Print a built-in scenario as TOML
    Show {
        /// Scenario name
        name: String,
    },

    /// Run scenarios
    Run {
        /// Built-in scenarios to run
        names: Vec<String>,

        /// Scenario files to run
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Run every built-in scenario
        #[arg(short, long)]
        all: bool,

        /// Override the milestone timeout in cycles
        #[arg(short, long)]
        timeout: Option<u32>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::List => {
            list_scenarios();
            Ok(ExitCode::SUCCESS)
        }

        Commands::Show { name } => {
            let scenario = builtin(&name)?;
            print!("{}", scenario.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }

        Commands::Run {
            names,
            files,
            all,
            timeout,
        } => {
            let scenarios = collect_scenarios(&names, &files, all, timeout)?;
            if run_all(&scenarios) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn list_scenarios() {
    for (name, scenario) in builtins() {
        println!("{name:<8} {}", scenario.description);
    }
}

fn collect_scenarios(
    names: &[String],
    files: &[PathBuf],
    all: bool,
    timeout: Option<u32>,
) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();

    if all {
        scenarios.extend(builtins().into_values());
    }
    for name in names {
        scenarios.push(builtin(name)?);
    }
    for path in files {
        let scenario = Scenario::from_path(path)
            .with_context(|| format!("Failed to load scenario from {:?}", path))?;
        scenarios.push(scenario);
    }

    if scenarios.is_empty() {
        bail!("No scenarios selected. Name one, pass --file, or use --all");
    }

    if let Some(cycles) = timeout {
        for scenario in &mut scenarios {
            scenario.vgpio = scenario.vgpio.with_default_timeout(cycles);
        }
    }

    Ok(scenarios)
}

/// Run each scenario, print its report, and return whether all passed
fn run_all(scenarios: &[Scenario]) -> bool {
    let mut failures = Vec::new();

    for scenario in scenarios {
        info!("Running scenario {}", scenario.name);
        match run_scenario(scenario) {
            Ok(report) => {
                print!("{report}");
                if !report.passed() {
                    failures.push(scenario.name.clone());
                }
            }
            Err(e) => {
                println!("{}: FAIL", scenario.name);
                println!("  {e}");
                failures.push(scenario.name.clone());
            }
        }
    }

    println!();
    if failures.is_empty() {
        println!("{} scenario(s) passed", scenarios.len());
        true
    } else {
        println!(
            "{} of {} scenario(s) failed: {}",
            failures.len(),
            scenarios.len(),
            failures.join(", ")
        );
        false
    }
}
