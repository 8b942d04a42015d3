use clap::Args;
use serde_json::Value;

use pairtrade_core::backtest::DEFAULT_WINDOW;
use pairtrade_core::monte_carlo::{
    self, MonteCarloInput, DEFAULT_BLOCK_SIZE, DEFAULT_SCENARIOS,
};

use crate::input;

/// Arguments for a Monte Carlo stress test
#[derive(Args)]
pub struct MonteCarloArgs {
    /// Path to a JSON file holding the full stress-test input
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a CSV price table with date,symbol,close columns
    #[arg(long, requires = "config")]
    pub data: Option<String>,

    /// Path to a JSON strategy config (required with --data)
    #[arg(long)]
    pub config: Option<String>,

    /// Trade this pair instead of the default (e.g. "AAPL,MSFT")
    #[arg(long)]
    pub pair: Option<String>,

    /// Number of synthetic scenarios
    #[arg(long)]
    pub scenarios: Option<usize>,

    /// Bootstrap block size in bars
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Rolling z-score window in bars
    #[arg(long)]
    pub window: Option<usize>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mc_input: MonteCarloInput = if let Some(ref path) = args.data {
        let config_path = args
            .config
            .as_ref()
            .ok_or("--config <file.json> is required with --data")?;
        MonteCarloInput {
            rows: input::csv_data::read_price_rows(path)?,
            config: input::file::read_json(config_path)?,
            pair: None,
            n_scenarios: DEFAULT_SCENARIOS,
            block_size: DEFAULT_BLOCK_SIZE,
            window: DEFAULT_WINDOW,
            seed: None,
        }
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--data <prices.csv> with --config, --input <file.json>, or piped stdin required".into());
    };

    if let Some(ref raw) = args.pair {
        mc_input.pair = Some(super::parse_pair(raw)?);
    }
    if let Some(scenarios) = args.scenarios {
        mc_input.n_scenarios = scenarios;
    }
    if let Some(block_size) = args.block_size {
        mc_input.block_size = block_size;
    }
    if let Some(window) = args.window {
        mc_input.window = window;
    }
    if let Some(seed) = args.seed {
        mc_input.seed = Some(seed);
    }

    Ok(super::report(monte_carlo::run_monte_carlo(&mc_input)))
}
