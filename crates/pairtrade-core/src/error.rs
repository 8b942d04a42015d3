use thiserror::Error;

#[derive(Debug, Error)]
pub enum PairtradeError {
    #[error("Invalid config: {field} — {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PairtradeError {
    /// Stable machine-readable tag used in fail-soft error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PairtradeError::InvalidConfig { .. } => "config_error",
            PairtradeError::InsufficientData(_) => "insufficient_data",
            PairtradeError::Computation(_) | PairtradeError::Serialization(_) => {
                "computation_error"
            }
        }
    }
}

impl From<serde_json::Error> for PairtradeError {
    fn from(e: serde_json::Error) -> Self {
        PairtradeError::Serialization(e.to_string())
    }
}
