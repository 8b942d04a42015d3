pub mod backtest;
pub mod error;
pub mod pairs;
pub mod signal;
pub mod types;

#[cfg(feature = "monte_carlo")]
pub mod scenario;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub use error::PairtradeError;
pub use types::*;

/// Standard result type for all pairtrade operations
pub type PairtradeResult<T> = Result<T, PairtradeError>;
