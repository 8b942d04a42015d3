use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backtest::engine::default_window;
use crate::backtest::{EquityAccountant, TradingStateMachine};
use crate::scenario::ScenarioGenerator;
use crate::signal::{align, pct_change, rolling_zscore};
use crate::types::{with_metadata, ComputationOutput, PriceRow, PriceTable, StrategyConfig};
use crate::{PairtradeError, PairtradeResult};

/// Default number of synthetic scenarios.
pub const DEFAULT_SCENARIOS: usize = 500;
/// Default bootstrap block size, in bars.
pub const DEFAULT_BLOCK_SIZE: usize = 20;
/// Sharpe level a scenario must reach to count as resilient.
pub const TARGET_SHARPE: f64 = 1.4;
/// Drawdown floor a scenario must stay above to count as resilient.
pub const DRAWDOWN_FLOOR: f64 = -0.20;

fn default_scenarios() -> usize {
    DEFAULT_SCENARIOS
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

/// Input for a Monte Carlo stress test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloInput {
    /// Long-format price observations (`date,symbol,close`).
    pub rows: Vec<PriceRow>,
    pub config: StrategyConfig,
    /// Explicit pair selection. Defaults to the first two symbols in
    /// ascending order.
    #[serde(default)]
    pub pair: Option<(String, String)>,
    #[serde(default = "default_scenarios")]
    pub n_scenarios: usize,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Rolling z-score window.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Seed for reproducible scenario generation.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Risk/return metrics from one synthetic scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub sharpe_ratio: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub final_equity: f64,
}

/// Distributional summary of one metric across all scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub percentile_5: f64,
    pub percentile_95: f64,
    /// Full per-scenario values, retained for Sharpe and drawdown only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<f64>>,
}

/// How often scenarios met the target risk/return thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressResilience {
    /// Scenarios with Sharpe >= 1.4.
    pub scenarios_above_target_sharpe: usize,
    /// Scenarios whose drawdown stayed above -20%.
    pub scenarios_below_20pct_drawdown: usize,
    pub probability_positive_return: f64,
}

/// Output of a Monte Carlo stress test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloOutput {
    pub n_scenarios: usize,
    pub sharpe_ratio: MetricSummary,
    pub total_return: MetricSummary,
    pub max_drawdown: MetricSummary,
    pub stress_resilience: StressResilience,
}

/// Stress-test the strategy across synthetic return scenarios.
///
/// Half the scenarios come from a block bootstrap of the historical
/// spread returns, half from synthetic volatility regimes (an odd count
/// gives the extra scenario to the regime generator). Generation runs on
/// one seeded RNG stream for reproducibility; scenario evaluation is
/// independent per scenario and runs in parallel.
pub fn run_monte_carlo(
    input: &MonteCarloInput,
) -> PairtradeResult<ComputationOutput<MonteCarloOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;
    if input.n_scenarios == 0 {
        return Err(PairtradeError::InvalidConfig {
            field: "n_scenarios".into(),
            reason: "must be at least 1".into(),
        });
    }
    if input.window < 2 {
        return Err(PairtradeError::InvalidConfig {
            field: "window".into(),
            reason: "rolling window must be at least 2 bars".into(),
        });
    }

    let table = PriceTable::from_rows(&input.rows);
    let pair = table.select_pair(input.pair.as_ref())?;
    let spread = align(pair.series_a, pair.series_b);
    if spread.len() < 2 {
        return Err(PairtradeError::InsufficientData(format!(
            "pair {}/{} has {} overlapping observations, need at least 2",
            pair.symbol_a,
            pair.symbol_b,
            spread.len()
        )));
    }

    let returns = pct_change(&spread.values);
    if returns.len() <= input.block_size {
        return Err(PairtradeError::InsufficientData(format!(
            "{} spread returns cannot seed a {}-bar block bootstrap",
            returns.len(),
            input.block_size
        )));
    }
    if returns.len() < input.window {
        warnings.push(format!(
            "{} returns per scenario is shorter than the {}-bar window; scenarios cannot trade",
            returns.len(),
            input.window
        ));
    }

    let base_vol = population_std(&returns);

    let n_bootstrap = input.n_scenarios / 2;
    let n_regime = input.n_scenarios - n_bootstrap;

    let mut generator = ScenarioGenerator::new(input.seed);
    let mut scenarios: Vec<Vec<f64>> = Vec::with_capacity(input.n_scenarios);
    for _ in 0..n_bootstrap {
        scenarios.push(generator.block_bootstrap(&returns, input.block_size)?);
    }
    for _ in 0..n_regime {
        scenarios.push(generator.volatility_regime(base_vol, returns.len())?);
    }

    let results: Vec<ScenarioResult> = scenarios
        .par_iter()
        .map(|scenario| run_scenario(scenario, &input.config, input.window))
        .collect();

    let sharpes: Vec<f64> = results.iter().map(|r| r.sharpe_ratio).collect();
    let total_returns: Vec<f64> = results.iter().map(|r| r.total_return).collect();
    let drawdowns: Vec<f64> = results.iter().map(|r| r.max_drawdown).collect();

    let stress_resilience = StressResilience {
        scenarios_above_target_sharpe: sharpes.iter().filter(|&&s| s >= TARGET_SHARPE).count(),
        scenarios_below_20pct_drawdown: drawdowns.iter().filter(|&&d| d >= DRAWDOWN_FLOOR).count(),
        probability_positive_return: total_returns.iter().filter(|&&r| r > 0.0).count() as f64
            / total_returns.len() as f64,
    };

    let output = MonteCarloOutput {
        n_scenarios: input.n_scenarios,
        sharpe_ratio: summarize(&sharpes, true),
        total_return: summarize(&total_returns, false),
        max_drawdown: summarize(&drawdowns, true),
        stress_resilience,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo Stress Test",
        &serde_json::json!({
            "symbol_a": pair.symbol_a,
            "symbol_b": pair.symbol_b,
            "n_scenarios": input.n_scenarios,
            "bootstrap_scenarios": n_bootstrap,
            "regime_scenarios": n_regime,
            "block_size": input.block_size,
            "window": input.window,
            "base_volatility": base_vol,
            "seed": input.seed,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Run the trading strategy over one synthetic return scenario.
fn run_scenario(returns: &[f64], config: &StrategyConfig, window: usize) -> ScenarioResult {
    // Synthetic spread path: cumulative sum of the scenario returns.
    let mut spread = Vec::with_capacity(returns.len());
    let mut level = 0.0;
    for r in returns {
        level += r;
        spread.push(level);
    }

    let zscores = rolling_zscore(&spread, window);
    let mut machine = TradingStateMachine::new(*config);
    let mut accountant = EquityAccountant::new(config.position_size);

    for (bar, z) in zscores.iter().enumerate() {
        let Some(z) = *z else { continue };
        let exit_pnl = machine.on_bar(bar, z, spread[bar]).and_then(|t| t.pnl);
        accountant.on_bar(exit_pnl);
    }

    let metrics = accountant.metrics();
    ScenarioResult {
        sharpe_ratio: metrics.sharpe_ratio,
        total_return: metrics.total_return,
        max_drawdown: metrics.max_drawdown,
        final_equity: metrics.final_equity,
    }
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Compute the percentile value from a **sorted** slice using linear
/// interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn summarize(values: &[f64], keep_distribution: bool) -> MetricSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len() as f64;

    let mean = sorted.iter().sum::<f64>() / n;
    let median = if sorted.len() % 2 == 0 {
        let mid = sorted.len() / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };
    let std_dev = (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

    MetricSummary {
        mean,
        median,
        std_dev,
        percentile_5: percentile_sorted(&sorted, 5.0),
        percentile_95: percentile_sorted(&sorted, 95.0),
        distribution: keep_distribution.then(|| values.to_vec()),
    }
}
