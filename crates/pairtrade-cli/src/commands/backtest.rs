use clap::Args;
use serde_json::Value;

use pairtrade_core::backtest::{self, BacktestInput};

use crate::input;

/// Arguments for a single-history backtest
#[derive(Args)]
pub struct BacktestArgs {
    /// Path to a JSON file holding the full backtest input
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

    /// Rolling z-score window in bars
    #[arg(long)]
    pub window: Option<usize>,
}

pub fn run(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut bt_input: BacktestInput = if let Some(ref path) = args.data {
        let config_path = args
            .config
            .as_ref()
            .ok_or("--config <file.json> is required with --data")?;
        BacktestInput {
            rows: input::csv_data::read_price_rows(path)?,
            config: input::file::read_json(config_path)?,
            pair: None,
            window: backtest::DEFAULT_WINDOW,
        }
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--data <prices.csv> with --config, --input <file.json>, or piped stdin required".into());
    };

    if let Some(ref raw) = args.pair {
        bt_input.pair = Some(super::parse_pair(raw)?);
    }
    if let Some(window) = args.window {
        bt_input.window = window;
    }

    Ok(super::report(backtest::run_backtest(&bt_input)))
}
