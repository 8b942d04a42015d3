pub mod backtest;
pub mod monte_carlo;
pub mod pairs;

use serde::Serialize;
use serde_json::Value;

use pairtrade_core::types::ComputationOutput;
use pairtrade_core::PairtradeResult;

/// Convert a core computation outcome into the printed payload.
///
/// Once a command has a well-formed input, core errors are reported as a
/// structured `{"error", "kind"}` object on stdout with exit code 0, so
/// callers can distinguish a failed computation from a usage mistake.
pub fn report<T: Serialize>(outcome: PairtradeResult<ComputationOutput<T>>) -> Value {
    match outcome {
        Ok(output) => serde_json::to_value(&output).unwrap_or_else(|e| {
            serde_json::json!({ "error": e.to_string(), "kind": "computation_error" })
        }),
        Err(e) => serde_json::json!({ "error": e.to_string(), "kind": e.kind() }),
    }
}

/// Parse a `--pair A,B` flag into two symbols.
pub fn parse_pair(raw: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let (a, b) = raw
        .split_once(',')
        .ok_or_else(|| format!("Expected --pair SYMBOL_A,SYMBOL_B, got '{raw}'"))?;
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return Err(format!("Expected --pair SYMBOL_A,SYMBOL_B, got '{raw}'").into());
    }
    Ok((a.to_string(), b.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairtrade_core::PairtradeError;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("AAPL,MSFT").unwrap(),
            ("AAPL".to_string(), "MSFT".to_string())
        );
        assert_eq!(
            parse_pair(" AAPL , MSFT ").unwrap(),
            ("AAPL".to_string(), "MSFT".to_string())
        );
        assert!(parse_pair("AAPL").is_err());
        assert!(parse_pair("AAPL,").is_err());
        assert!(parse_pair(",MSFT").is_err());
    }

    #[test]
    fn test_report_converts_core_error_to_payload() {
        let outcome: PairtradeResult<ComputationOutput<()>> =
            Err(PairtradeError::InsufficientData("too few bars".into()));
        let payload = report(outcome);
        assert_eq!(payload["kind"], "insufficient_data");
        assert!(payload["error"].as_str().unwrap().contains("too few bars"));
    }
}
