pub mod engine;
pub mod equity;
pub mod state_machine;

pub use engine::{run_backtest, BacktestInput, BacktestOutput, TradeRecord, DEFAULT_WINDOW};
pub use equity::{EquityAccountant, PerformanceMetrics};
pub use state_machine::{Position, Trade, TradeAction, TradingStateMachine};
