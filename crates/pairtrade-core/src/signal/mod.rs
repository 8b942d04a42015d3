pub mod spread;
pub mod zscore;

pub use spread::{align, pct_change, SpreadSeries};
pub use zscore::rolling_zscore;
