use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary statistics derived from a completed equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub sharpe_ratio: f64,
    pub total_return: f64,
    /// Worst peak-to-trough decline as a non-positive fraction.
    pub max_drawdown: f64,
    /// Fraction of closed trades with positive PnL.
    pub win_rate: f64,
    /// Number of closed trades.
    pub num_trades: usize,
    pub final_equity: f64,
}

/// Per-bar equity bookkeeping.
///
/// Emits exactly one equity observation per processed bar: the updated
/// post-exit equity on exit bars, the carried-forward value everywhere
/// else. The bar-aligned curve is what makes per-bar return computation
/// well defined.
#[derive(Debug, Clone)]
pub struct EquityAccountant {
    equity: f64,
    curve: Vec<f64>,
    closed_trades: usize,
    winning_trades: usize,
}

impl EquityAccountant {
    pub fn new(position_size: f64) -> Self {
        Self {
            equity: position_size,
            curve: Vec::new(),
            closed_trades: 0,
            winning_trades: 0,
        }
    }

    /// Record one bar. `exit_pnl` is the realized PnL when a position
    /// was closed on this bar.
    pub fn on_bar(&mut self, exit_pnl: Option<f64>) {
        if let Some(pnl) = exit_pnl {
            self.equity += pnl;
            self.closed_trades += 1;
            if pnl > 0.0 {
                self.winning_trades += 1;
            }
        }
        self.curve.push(self.equity);
    }

    pub fn curve(&self) -> &[f64] {
        &self.curve
    }

    /// Derive summary metrics from the completed curve.
    pub fn metrics(&self) -> PerformanceMetrics {
        let win_rate = if self.closed_trades == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.closed_trades as f64
        };

        PerformanceMetrics {
            sharpe_ratio: sharpe_ratio(&per_bar_returns(&self.curve)),
            total_return: total_return(&self.curve),
            max_drawdown: max_drawdown(&self.curve),
            win_rate,
            num_trades: self.closed_trades,
            final_equity: self.equity,
        }
    }
}

/// Simple per-bar returns from consecutive equity values.
fn per_bar_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { (w[1] - w[0]) / w[0] })
        .collect()
}

/// Annualized Sharpe ratio: `mean(r) / std(r) * sqrt(252)`, with the
/// sample standard deviation. Zero when the returns have no dispersion.
fn sharpe_ratio(returns: &[f64]) -> f64 {
    let n = returns.len();
    if n < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / n as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    let std = variance.sqrt();
    if std > 0.0 {
        mean / std * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

fn total_return(curve: &[f64]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

/// Minimum over time of `(equity − runningMax) / runningMax`.
fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &equity in curve {
        if equity > peak {
            peak = equity;
        }
        if peak != 0.0 {
            worst = worst.min((equity - peak) / peak);
        }
    }
    worst
}
