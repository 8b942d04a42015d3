pub mod ranking;

pub use ranking::{pair_stats, rank_pairs, PairRankingInput, PairRankingOutput, PairStats};
