mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::backtest::BacktestArgs;
use commands::monte_carlo::MonteCarloArgs;
use commands::pairs::RankPairsArgs;

/// Pairs-trading backtests and Monte Carlo stress tests
#[derive(Parser)]
#[command(
    name = "ptb",
    version,
    about = "Pairs-trading backtests and Monte Carlo stress tests",
    long_about = "A CLI for backtesting a z-score mean-reversion pairs strategy on \
                  historical prices and stress-testing it across bootstrapped and \
                  synthetic-volatility return scenarios. Also ranks candidate pairs \
                  by spread stationarity."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the strategy on a historical price series
    Backtest(BacktestArgs),
    /// Stress-test the strategy across synthetic scenarios
    MonteCarlo(MonteCarloArgs),
    /// Rank symbol pairs by spread stationarity
    RankPairs(RankPairsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Backtest(args) => commands::backtest::run(args),
        Commands::MonteCarlo(args) => commands::monte_carlo::run(args),
        Commands::RankPairs(args) => commands::pairs::run(args),
        Commands::Version => {
            println!("ptb {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
