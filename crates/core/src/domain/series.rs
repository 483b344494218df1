use serde::{Deserialize, Serialize};
use std::fmt;

/// One period of observed demand. Periods are opaque chronological labels
/// ("2024-03"); callers guarantee ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub period: String,
    pub demand: f64,
}

/// One forecast period with its confidence interval.
/// `lower_bound <= predicted <= upper_bound` is enforced at the wire boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    pub period: String,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Accepts the prediction service labels (`Alta`, `Media`, `Baja`) and
    /// their English names. Anything else is unrecognized.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "alta" | "high" => Some(Self::High),
            "media" | "medium" => Some(Self::Medium),
            "baja" | "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Media",
            Self::Low => "Baja",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Forecast reliability as reported by the prediction service.
///
/// `level` is `None` when `label` was not a recognized level; the raw label
/// is kept so summaries can still show what was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMetric {
    pub level: Option<ConfidenceLevel>,
    pub label: String,
    pub score: f64,
}

impl ConfidenceMetric {
    pub fn new(level: ConfidenceLevel, score: f64) -> Self {
        Self {
            level: Some(level),
            label: level.label().to_string(),
            score,
        }
    }

    pub fn from_label(label: &str, score: f64) -> Self {
        let label = label.trim().to_string();
        Self {
            level: ConfidenceLevel::parse(&label),
            label,
            score,
        }
    }

    /// `"<level> (<score>%)"`, e.g. `Alta (92%)`.
    pub fn summary_text(&self) -> String {
        let label = match self.level {
            Some(level) => level.label(),
            None => self.label.as_str(),
        };
        format!("{label} ({}%)", self.score)
    }
}

/// The three pipeline inputs for a single product, already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub product: String,
    pub historical: Vec<HistoricalPoint>,
    pub predictions: Vec<PredictionPoint>,
    pub confidence: Option<ConfidenceMetric>,
}
