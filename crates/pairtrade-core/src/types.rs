use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{PairtradeError, PairtradeResult};

/// A single closing-price observation for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One row of a long-format price table (`date,symbol,close`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub close: f64,
}

/// Immutable strategy parameters, validated once at construction.
///
/// Thresholds are z-score levels and must satisfy
/// `0 < exit_threshold < entry_threshold < stop_loss` for the strategy
/// to behave as mean reversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub stop_loss: f64,
    /// Fractional cost applied multiplicatively against PnL magnitude.
    pub transaction_cost: f64,
    /// Initial equity.
    pub position_size: f64,
}

impl StrategyConfig {
    pub fn validate(&self) -> PairtradeResult<()> {
        let fields = [
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
            ("stop_loss", self.stop_loss),
            ("transaction_cost", self.transaction_cost),
            ("position_size", self.position_size),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(PairtradeError::InvalidConfig {
                    field: name.into(),
                    reason: "must be a finite number".into(),
                });
            }
        }
        if self.exit_threshold <= 0.0 {
            return Err(PairtradeError::InvalidConfig {
                field: "exit_threshold".into(),
                reason: "must be positive".into(),
            });
        }
        if self.entry_threshold <= self.exit_threshold {
            return Err(PairtradeError::InvalidConfig {
                field: "entry_threshold".into(),
                reason: "must exceed exit_threshold".into(),
            });
        }
        if self.stop_loss <= self.entry_threshold {
            return Err(PairtradeError::InvalidConfig {
                field: "stop_loss".into(),
                reason: "must exceed entry_threshold".into(),
            });
        }
        if !(0.0..1.0).contains(&self.transaction_cost) {
            return Err(PairtradeError::InvalidConfig {
                field: "transaction_cost".into(),
                reason: "must be in [0, 1)".into(),
            });
        }
        if self.position_size <= 0.0 {
            return Err(PairtradeError::InvalidConfig {
                field: "position_size".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Per-symbol price series pivoted from long-format rows.
///
/// Symbols iterate in ascending order. Observations within a symbol are
/// sorted by date; duplicate dates collapse to the last value seen and
/// non-finite closes are dropped rather than interpolated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceTable {
    series: BTreeMap<String, Vec<PricePoint>>,
}

/// A resolved trading pair with its price series.
#[derive(Debug)]
pub struct SelectedPair<'a> {
    pub symbol_a: String,
    pub symbol_b: String,
    pub series_a: &'a [PricePoint],
    pub series_b: &'a [PricePoint],
}

impl PriceTable {
    pub fn from_rows(rows: &[PriceRow]) -> Self {
        let mut by_symbol: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        for row in rows {
            if !row.close.is_finite() {
                continue;
            }
            by_symbol
                .entry(row.symbol.clone())
                .or_default()
                .insert(row.date, row.close);
        }
        let series = by_symbol
            .into_iter()
            .map(|(symbol, points)| {
                let points = points
                    .into_iter()
                    .map(|(date, close)| PricePoint { date, close })
                    .collect();
                (symbol, points)
            })
            .collect();
        Self { series }
    }

    /// Symbols in ascending order.
    pub fn symbols(&self) -> Vec<&str> {
        self.series.keys().map(String::as_str).collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&[PricePoint]> {
        self.series.get(symbol).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Resolve the traded pair: the explicit selection when given, else
    /// the first two symbols in ascending order.
    pub fn select_pair(
        &self,
        pair: Option<&(String, String)>,
    ) -> PairtradeResult<SelectedPair<'_>> {
        let (symbol_a, symbol_b) = match pair {
            Some((a, b)) => {
                if a == b {
                    return Err(PairtradeError::InvalidConfig {
                        field: "pair".into(),
                        reason: "must name two distinct symbols".into(),
                    });
                }
                (a.clone(), b.clone())
            }
            None => {
                let symbols = self.symbols();
                if symbols.len() < 2 {
                    return Err(PairtradeError::InsufficientData(format!(
                        "need at least 2 symbols, got {}",
                        symbols.len()
                    )));
                }
                (symbols[0].to_string(), symbols[1].to_string())
            }
        };

        let series_a = self.get(&symbol_a).ok_or_else(|| {
            PairtradeError::InsufficientData(format!("symbol '{symbol_a}' not in price data"))
        })?;
        let series_b = self.get(&symbol_b).ok_or_else(|| {
            PairtradeError::InsufficientData(format!("symbol '{symbol_b}' not in price data"))
        })?;

        Ok(SelectedPair {
            symbol_a,
            symbol_b,
            series_a,
            series_b,
        })
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}
