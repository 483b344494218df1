use serde_json::Value;
use std::fmt;

/// Diagnostics for a failed prediction-service call, attached to the
/// `anyhow::Error` so callers can downcast and keep the raw body.
#[derive(Debug, Clone)]
pub struct PredictionServiceError {
    pub product: Option<String>,
    pub stage: &'static str,
    pub status: Option<u16>,
    pub detail: String,
    pub raw_body: Option<Value>,
}

impl fmt::Display for PredictionServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prediction service error (stage={}", self.stage)?;
        if let Some(product) = &self.product {
            write!(f, ", product={product}")?;
        }
        if let Some(status) = self.status {
            write!(f, ", status={status}")?;
        }
        write!(f, "): {}", self.detail)
    }
}

impl std::error::Error for PredictionServiceError {}
