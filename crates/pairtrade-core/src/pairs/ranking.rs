use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::types::{with_metadata, ComputationOutput, PricePoint, PriceRow, PriceTable};
use crate::{PairtradeError, PairtradeResult};

/// Minimum overlapping observations for a pair to be ranked.
pub const MIN_OVERLAP: usize = 100;

/// Half-life substituted when the spread shows no mean reversion.
pub const HALF_LIFE_SENTINEL: f64 = 999.0;

/// At most this many pairs survive the ranking.
pub const MAX_RANKED_PAIRS: usize = 10;

/// Input for the pair ranking: long-format price observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRankingInput {
    pub rows: Vec<PriceRow>,
}

/// Stationarity diagnostics for one candidate pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairStats {
    pub symbol_a: String,
    pub symbol_b: String,
    /// t-statistic of the AR(1) slope; more negative = more stationary.
    pub adf_statistic: f64,
    pub correlation: f64,
    /// Mean-reversion half-life in bars.
    pub half_life: f64,
    pub overlap: usize,
}

/// Candidate pairs ordered from most to least stationary spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRankingOutput {
    pub pairs: Vec<PairStats>,
}

/// Score every symbol pair with enough overlapping history and keep the
/// ten most mean-reverting, ordered by ascending ADF statistic.
pub fn rank_pairs(
    input: &PairRankingInput,
) -> PairtradeResult<ComputationOutput<PairRankingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let table = PriceTable::from_rows(&input.rows);
    let symbols = table.symbols();
    if symbols.len() < 2 {
        return Err(PairtradeError::InsufficientData(format!(
            "need at least 2 symbols to rank pairs, got {}",
            symbols.len()
        )));
    }

    let candidates = symbols.len() * (symbols.len() - 1) / 2;
    let mut pairs: Vec<PairStats> = Vec::new();
    for i in 0..symbols.len() {
        for j in (i + 1)..symbols.len() {
            // Symbols returned by the table always have a series.
            let (Some(series_a), Some(series_b)) =
                (table.get(symbols[i]), table.get(symbols[j]))
            else {
                continue;
            };
            let (closes_a, closes_b) = align_closes(series_a, series_b);
            if closes_a.len() < MIN_OVERLAP {
                continue;
            }
            match pair_stats(symbols[i], symbols[j], &closes_a, &closes_b) {
                Ok(stats) => pairs.push(stats),
                Err(e) => warnings.push(format!(
                    "skipped pair {}/{}: {e}",
                    symbols[i], symbols[j]
                )),
            }
        }
    }

    pairs.sort_by(|a, b| {
        a.adf_statistic
            .partial_cmp(&b.adf_statistic)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pairs.truncate(MAX_RANKED_PAIRS);

    if pairs.is_empty() {
        warnings.push(format!(
            "no pair reached the {MIN_OVERLAP}-observation overlap minimum"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cointegration Pair Ranking",
        &serde_json::json!({
            "symbols": symbols.len(),
            "candidate_pairs": candidates,
            "min_overlap": MIN_OVERLAP,
            "max_ranked_pairs": MAX_RANKED_PAIRS,
        }),
        warnings,
        elapsed,
        PairRankingOutput { pairs },
    ))
}

/// Stationarity diagnostics for one pair of date-aligned close series.
pub fn pair_stats(
    symbol_a: &str,
    symbol_b: &str,
    closes_a: &[f64],
    closes_b: &[f64],
) -> PairtradeResult<PairStats> {
    let n = closes_a.len();
    if n != closes_b.len() {
        return Err(PairtradeError::Computation(format!(
            "close series differ in length: {} vs {}",
            n,
            closes_b.len()
        )));
    }
    if n < 3 {
        return Err(PairtradeError::InsufficientData(format!(
            "need at least 3 aligned observations, got {n}"
        )));
    }

    let spread: Vec<f64> = closes_a
        .iter()
        .zip(closes_b.iter())
        .map(|(a, b)| a - b)
        .collect();
    let regression = ar1_regression(&spread);

    Ok(PairStats {
        symbol_a: symbol_a.to_string(),
        symbol_b: symbol_b.to_string(),
        adf_statistic: regression.t_statistic,
        correlation: pearson_correlation(closes_a, closes_b)?,
        half_life: regression.half_life,
        overlap: n,
    })
}

/// Intersect two price series on date, keeping both close columns.
fn align_closes(a: &[PricePoint], b: &[PricePoint]) -> (Vec<f64>, Vec<f64>) {
    let mut closes_a = Vec::new();
    let mut closes_b = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                closes_a.push(a[i].close);
                closes_b.push(b[j].close);
                i += 1;
                j += 1;
            }
        }
    }
    (closes_a, closes_b)
}

struct Ar1Regression {
    t_statistic: f64,
    half_life: f64,
}

/// OLS of the spread differences on the lagged spread,
/// `dS_t = alpha + beta * S_{t-1} + e_t`.
///
/// Returns the t-statistic of `beta` (0.0 when the lag has no variance
/// or the fit is exact) and the implied mean-reversion half-life
/// `-ln(2) / beta`, with the 999.0 sentinel when `beta >= 0`.
fn ar1_regression(spread: &[f64]) -> Ar1Regression {
    let n = spread.len();
    let m = (n - 1) as f64;

    let mut sum_lag = 0.0;
    let mut sum_ds = 0.0;
    let mut sum_lag2 = 0.0;
    let mut sum_lag_ds = 0.0;
    for t in 1..n {
        let ds = spread[t] - spread[t - 1];
        let lag = spread[t - 1];
        sum_lag += lag;
        sum_ds += ds;
        sum_lag2 += lag * lag;
        sum_lag_ds += lag * ds;
    }

    let mean_lag = sum_lag / m;
    let mean_ds = sum_ds / m;
    let cov = sum_lag_ds / m - mean_lag * mean_ds;
    let var_lag = sum_lag2 / m - mean_lag * mean_lag;

    if var_lag <= 0.0 {
        return Ar1Regression {
            t_statistic: 0.0,
            half_life: HALF_LIFE_SENTINEL,
        };
    }

    let beta = cov / var_lag;
    let alpha = mean_ds - beta * mean_lag;

    let half_life = if beta < 0.0 {
        -std::f64::consts::LN_2 / beta
    } else {
        HALF_LIFE_SENTINEL
    };

    let mut sse = 0.0;
    for t in 1..n {
        let ds = spread[t] - spread[t - 1];
        let lag = spread[t - 1];
        let e = ds - alpha - beta * lag;
        sse += e * e;
    }
    let dof = ((n - 1).saturating_sub(2)).max(1) as f64;
    let se_beta = (sse / dof / (var_lag * m)).sqrt();
    let t_statistic = if se_beta == 0.0 { 0.0 } else { beta / se_beta };

    Ar1Regression {
        t_statistic,
        half_life,
    }
}

fn pearson_correlation(x: &[f64], y: &[f64]) -> PairtradeResult<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return Err(PairtradeError::Computation(
            "correlation undefined for a zero-variance series".into(),
        ));
    }
    Ok(cov / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(offset: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Days::new(offset as u64)
    }

    fn rows_for(symbol: &str, closes: &[f64]) -> Vec<PriceRow> {
        closes
            .iter()
            .enumerate()
            .map(|(i, close)| PriceRow {
                date: date(i),
                symbol: symbol.into(),
                close: *close,
            })
            .collect()
    }

    // --- regression internals ---

    #[test]
    fn test_geometric_decay_half_life() {
        // s[t] = 0.9 * s[t-1] exactly, so beta = -0.1 with zero residual.
        let spread: Vec<f64> = (0..50).map(|t| 10.0 * 0.9f64.powi(t)).collect();
        let reg = ar1_regression(&spread);
        assert!((reg.half_life - std::f64::consts::LN_2 / 0.1).abs() < 1e-6);
        // Exact fit: the t-statistic falls back to the 0.0 sentinel.
        assert_eq!(reg.t_statistic, 0.0);
    }

    #[test]
    fn test_trending_spread_hits_sentinel() {
        // A drifting spread never mean-reverts.
        let spread: Vec<f64> = (0..120).map(|t| t as f64 * 0.5).collect();
        let reg = ar1_regression(&spread);
        assert_eq!(reg.half_life, HALF_LIFE_SENTINEL);
    }

    #[test]
    fn test_constant_spread_sentinels() {
        let reg = ar1_regression(&vec![2.0; 120]);
        assert_eq!(reg.t_statistic, 0.0);
        assert_eq!(reg.half_life, HALF_LIFE_SENTINEL);
    }

    #[test]
    fn test_mean_reverting_spread_has_negative_statistic() {
        // Noisy oscillation around zero: strongly stationary.
        let spread: Vec<f64> = (0..150)
            .map(|t| (t as f64 * 1.1).sin() + (t as f64 * 0.37).cos() * 0.3)
            .collect();
        let reg = ar1_regression(&spread);
        assert!(reg.t_statistic < -3.0);
        assert!(reg.half_life < 10.0);
    }

    // --- correlation ---

    #[test]
    fn test_correlation_extremes() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let up: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let down: Vec<f64> = x.iter().map(|v| -2.0 * v).collect();
        assert!((pearson_correlation(&x, &up).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&x, &down).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_zero_variance_errors() {
        let x: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let flat = vec![5.0; 50];
        assert!(pearson_correlation(&x, &flat).is_err());
    }

    // --- pair_stats ---

    #[test]
    fn test_pair_stats_length_mismatch() {
        let err = pair_stats("A", "B", &[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), "computation_error");
    }

    #[test]
    fn test_pair_stats_too_short() {
        let err = pair_stats("A", "B", &[1.0, 2.0], &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    // --- rank_pairs ---

    /// Six synthetic symbols whose pairwise spreads are stationary
    /// sinusoid mixtures.
    fn six_symbol_rows(n: usize) -> Vec<PriceRow> {
        let mut rows = Vec::new();
        for k in 0..6usize {
            let closes: Vec<f64> = (0..n)
                .map(|i| 100.0 + (k + 1) as f64 * (i as f64 * 0.37 + k as f64).sin())
                .collect();
            rows.extend(rows_for(&format!("SYM{k}"), &closes));
        }
        rows
    }

    #[test]
    fn test_rank_pairs_truncates_to_ten() {
        // 6 symbols yield 15 candidate pairs.
        let input = PairRankingInput {
            rows: six_symbol_rows(150),
        };
        let output = rank_pairs(&input).unwrap();
        assert_eq!(output.result.pairs.len(), MAX_RANKED_PAIRS);
        assert_eq!(output.assumptions["candidate_pairs"], 15);
    }

    #[test]
    fn test_rank_pairs_sorted_ascending_by_statistic() {
        let input = PairRankingInput {
            rows: six_symbol_rows(150),
        };
        let pairs = rank_pairs(&input).unwrap().result.pairs;
        for window in pairs.windows(2) {
            assert!(window[0].adf_statistic <= window[1].adf_statistic);
        }
    }

    #[test]
    fn test_stationary_pair_outranks_trending_pair() {
        let n = 150;
        let base: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.05).sin()).collect();
        let cointegrated: Vec<f64> = base
            .iter()
            .enumerate()
            .map(|(i, b)| b + 5.0 + (i as f64 * 1.1).sin())
            .collect();
        let drifting: Vec<f64> = base
            .iter()
            .enumerate()
            .map(|(i, b)| b + i as f64 * 0.4)
            .collect();

        let mut rows = rows_for("BASE", &base);
        rows.extend(rows_for("COINT", &cointegrated));
        rows.extend(rows_for("DRIFT", &drifting));

        let pairs = rank_pairs(&PairRankingInput { rows }).unwrap().result.pairs;
        assert_eq!(pairs[0].symbol_a, "BASE");
        assert_eq!(pairs[0].symbol_b, "COINT");
        assert!(pairs[0].half_life < HALF_LIFE_SENTINEL);
    }

    #[test]
    fn test_thin_overlap_excluded() {
        let base: Vec<f64> = (0..150).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let mut rows = rows_for("FULL_A", &base);
        rows.extend(rows_for(
            "FULL_B",
            &base.iter().map(|b| b + 2.0 + (b * 3.0).sin()).collect::<Vec<_>>(),
        ));
        // Only 50 overlapping bars for THIN.
        rows.extend(rows_for("THIN", &base[..50].to_vec()));

        let output = rank_pairs(&PairRankingInput { rows }).unwrap();
        let pairs = &output.result.pairs;
        assert!(pairs.iter().all(|p| p.symbol_a != "THIN" && p.symbol_b != "THIN"));
        assert!(pairs.iter().all(|p| p.overlap >= MIN_OVERLAP));
    }

    #[test]
    fn test_no_qualifying_pairs_warns_not_errors() {
        let mut rows = rows_for("A", &[1.0, 2.0, 3.0]);
        rows.extend(rows_for("B", &[2.0, 3.0, 4.0]));
        let output = rank_pairs(&PairRankingInput { rows }).unwrap();
        assert!(output.result.pairs.is_empty());
        assert!(!output.warnings.is_empty());
    }

    #[test]
    fn test_single_symbol_is_insufficient() {
        let rows = rows_for("ONLY", &[1.0, 2.0, 3.0]);
        let err = rank_pairs(&PairRankingInput { rows }).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }
}
