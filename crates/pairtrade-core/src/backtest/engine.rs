use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::signal::{align, rolling_zscore};
use crate::types::{with_metadata, ComputationOutput, PriceRow, PriceTable, StrategyConfig};
use crate::{PairtradeError, PairtradeResult};

use super::equity::EquityAccountant;
use super::state_machine::{Position, TradeAction, TradingStateMachine};

/// Default rolling z-score window, in bars.
pub const DEFAULT_WINDOW: usize = 20;

pub(crate) fn default_window() -> usize {
    DEFAULT_WINDOW
}

/// Input for a single-history backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestInput {
    /// Long-format price observations (`date,symbol,close`).
    pub rows: Vec<PriceRow>,
    pub config: StrategyConfig,
    /// Explicit pair selection. Defaults to the first two symbols in
    /// ascending order.
    #[serde(default)]
    pub pair: Option<(String, String)>,
    /// Rolling z-score window.
    #[serde(default = "default_window")]
    pub window: usize,
}

/// A dated entry or exit from the backtest log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub zscore: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
}

/// Output of a single-history backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub symbol_a: String,
    pub symbol_b: String,
    pub sharpe_ratio: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub num_trades: usize,
    pub final_equity: f64,
    pub trades: Vec<TradeRecord>,
}

/// Backtest the z-score mean-reversion strategy on a historical spread.
///
/// Aligns the selected pair on common dates, computes the rolling
/// z-score of the price spread, and drives the trading state machine
/// and equity accountant over every bar with a defined z-score.
pub fn run_backtest(input: &BacktestInput) -> PairtradeResult<ComputationOutput<BacktestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;
    if input.window < 2 {
        return Err(PairtradeError::InvalidConfig {
            field: "window".into(),
            reason: "rolling window must be at least 2 bars".into(),
        });
    }

    let table = PriceTable::from_rows(&input.rows);
    let pair = table.select_pair(input.pair.as_ref())?;
    let spread = align(pair.series_a, pair.series_b);
    if spread.len() <= input.window {
        return Err(PairtradeError::InsufficientData(format!(
            "pair {}/{} has {} overlapping observations, need more than the {}-bar window",
            pair.symbol_a,
            pair.symbol_b,
            spread.len(),
            input.window
        )));
    }

    let zscores = rolling_zscore(&spread.values, input.window);

    let mut machine = TradingStateMachine::new(input.config);
    let mut accountant = EquityAccountant::new(input.config.position_size);
    let mut trades: Vec<TradeRecord> = Vec::new();

    for (bar, z) in zscores.iter().enumerate() {
        // Warmup bars never reach the state machine.
        let Some(z) = *z else { continue };
        let trade = machine.on_bar(bar, z, spread.values[bar]);
        if let Some(trade) = trade {
            trades.push(TradeRecord {
                date: spread.dates[trade.bar],
                action: trade.action,
                price: trade.price,
                zscore: trade.zscore,
                pnl: trade.pnl,
            });
        }
        accountant.on_bar(trade.and_then(|t| t.pnl));
    }

    if machine.position() != Position::Flat {
        warnings.push(
            "series ended with an open position; no final exit PnL was realized".to_string(),
        );
    }

    let metrics = accountant.metrics();
    let output = BacktestOutput {
        symbol_a: pair.symbol_a.clone(),
        symbol_b: pair.symbol_b.clone(),
        sharpe_ratio: metrics.sharpe_ratio,
        total_return: metrics.total_return,
        max_drawdown: metrics.max_drawdown,
        win_rate: metrics.win_rate,
        num_trades: metrics.num_trades,
        final_equity: metrics.final_equity,
        trades,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Pairs Trading Backtest",
        &serde_json::json!({
            "symbol_a": pair.symbol_a,
            "symbol_b": pair.symbol_b,
            "window": input.window,
            "entry_threshold": input.config.entry_threshold,
            "exit_threshold": input.config.exit_threshold,
            "stop_loss": input.config.stop_loss,
            "transaction_cost": input.config.transaction_cost,
            "position_size": input.config.position_size,
            "bars": spread.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
