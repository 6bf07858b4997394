use std::path::PathBuf;
use std::process::ExitCode;

use beatbridge_systems::registry;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod runner;

use config::RunConfig;
use runner::{RunError, RunReport};

#[derive(Debug, Parser)]
#[command(name = "beatbridge")]
#[command(about = "Step a wide-to-narrow bus bridge against a simulated native memory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the registered presets.
    List,
    /// Run a preset's read-back pattern plus random accesses.
    Run {
        /// Preset name, see `beatbridge list`.
        preset: String,

        /// TOML run configuration (defaults to the per-user config file if present).
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Number of random write/read-back pairs after the pattern.
        #[arg(long, default_value_t = 64)]
        count: usize,

        /// Seed for the random accesses.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn list() {
    for entry in registry::all() {
        println!("{:<40} {}", entry.name, entry.description);
    }
}

fn run(preset: &str, config: Option<PathBuf>, count: usize, seed: u64) -> Result<RunReport, RunError> {
    let entry = registry::find(preset).ok_or_else(|| {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        RunError::UnknownPreset(preset.to_string(), names.join(", "))
    })?;
    let config = RunConfig::resolve(config.as_deref())?;
    runner::run_preset(entry, &config, count, seed)
}

fn print_report(report: &RunReport) {
    println!("{} (ratio {})", report.preset, report.ratio);
    println!(
        "  pattern: {} entries read back in {} cycles",
        report.pattern_entries, report.pattern_cycles
    );
    println!(
        "  random:  {} entries read back in {} cycles",
        report.random_entries, report.random_cycles
    );
    println!("  memory:  {} native words written", report.words.len());
    for (addr, data) in report.words.iter().take(8) {
        println!("    {addr:#010x}: {data:#x}");
    }
    if report.words.len() > 8 {
        println!("    ...");
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List => {
            list();
            ExitCode::SUCCESS
        }
        Commands::Run {
            preset,
            config,
            count,
            seed,
        } => match run(&preset, config, count, seed) {
            Ok(report) => {
                print_report(&report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
