//! Checker CLI over saved register histories.
//!
//! # Usage
//!
//! ```bash
//! # Check a saved history for linearizability
//! regchain-checker check --history run1.json
//!
//! # Override the recorded concurrency bound
//! regchain-checker check --history run1.json --concurrency 8
//!
//! # Show event statistics for a history file
//! regchain-checker summary --history run1.json
//! ```
//!
//! Exit codes: 0 when linearizable, 1 on a violation, 2 when the input
//! could not be loaded or is malformed.

use clap::{Parser, Subcommand};
use log::info;
use regchain_checker::{check_history, CheckConfig};
use regchain_history::HistoryLog;
use serde_json::Value;

type JsonHistory = HistoryLog<String, Value>;

#[derive(Parser)]
#[command(name = "regchain-checker")]
#[command(about = "Linearizability checker for CAS-register test histories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a saved history for linearizability.
    Check {
        /// Path to the history file (JSON).
        #[arg(long)]
        history: String,

        /// Override the recorded client concurrency bound.
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Show event statistics for a history file.
    Summary {
        /// Path to the history file (JSON).
        #[arg(long)]
        history: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            history,
            concurrency,
        } => cmd_check(history, concurrency),
        Commands::Summary { history } => cmd_summary(history),
    }
}

fn load_history(path: &str) -> JsonHistory {
    match HistoryLog::load(path) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            std::process::exit(2);
        }
    }
}

fn cmd_check(path: String, concurrency: Option<usize>) {
    let log = load_history(&path);
    let concurrency = concurrency.unwrap_or(log.concurrency);
    if concurrency == 0 {
        eprintln!("Invalid history: concurrency bound must be at least 1");
        std::process::exit(2);
    }

    info!(
        "checking {}: {} records, concurrency {}",
        path,
        log.len(),
        concurrency
    );
    let config = CheckConfig::new(concurrency, log.genesis.write_id, log.genesis.value);
    let report = match check_history(log.events, config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Invalid history: {}", e);
            std::process::exit(2);
        }
    };

    println!("{}", report);
    if !report.valid {
        std::process::exit(1);
    }
}

fn cmd_summary(path: String) {
    let log = load_history(&path);

    println!("History: {}", path);
    println!("Concurrency: {}", log.concurrency);
    println!("Genesis: {} = {}", log.genesis.write_id, log.genesis.value);
    println!("Records: {}", log.len());
    println!();

    let summary = log.summary();
    let mut sorted: Vec<_> = summary.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));

    println!("{:>15} {:>10}", "Record", "Count");
    println!("{}", "-".repeat(26));
    for (name, count) in &sorted {
        println!("{:>15} {:>10}", name, count);
    }
    println!("{}", "-".repeat(26));
    println!("{:>15} {:>10}", "Total", log.len());
}
