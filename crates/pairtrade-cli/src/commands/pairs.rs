use clap::Args;
use serde_json::Value;

use pairtrade_core::pairs::{self, PairRankingInput};

use crate::input;

/// Arguments for ranking candidate pairs
#[derive(Args)]
pub struct RankPairsArgs {
    /// Path to a JSON file holding the ranking input
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a CSV price table with date,symbol,close columns
    #[arg(long)]
    pub data: Option<String>,
}

pub fn run(args: RankPairsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ranking_input: PairRankingInput = if let Some(ref path) = args.data {
        PairRankingInput {
            rows: input::csv_data::read_price_rows(path)?,
        }
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--data <prices.csv>, --input <file.json>, or piped stdin required".into());
    };

    Ok(super::report(pairs::rank_pairs(&ranking_input)))
}
