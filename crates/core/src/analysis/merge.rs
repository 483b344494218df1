//! Chart series: history, a connector, then predictions.

use crate::domain::series::{Forecast, HistoricalPoint, PredictionPoint};
use serde::{Deserialize, Serialize};

/// A point of the combined chart series. The tag tells the chart renderer
/// which line style and band to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergedSeriesPoint {
    Historical {
        period: String,
        demand: f64,
    },
    /// Copy of the last historical value in every prediction-shaped field,
    /// so the predicted line starts where the observed one ends.
    Connector {
        period: String,
        demand: f64,
        predicted: f64,
        lower_bound: f64,
        upper_bound: f64,
    },
    Predicted {
        period: String,
        predicted: f64,
        lower_bound: f64,
        upper_bound: f64,
    },
}

impl MergedSeriesPoint {
    pub fn period(&self) -> &str {
        match self {
            Self::Historical { period, .. }
            | Self::Connector { period, .. }
            | Self::Predicted { period, .. } => period,
        }
    }

    pub fn demand(&self) -> Option<f64> {
        match self {
            Self::Historical { demand, .. } | Self::Connector { demand, .. } => Some(*demand),
            Self::Predicted { .. } => None,
        }
    }

    pub fn predicted(&self) -> Option<f64> {
        match self {
            Self::Connector { predicted, .. } | Self::Predicted { predicted, .. } => {
                Some(*predicted)
            }
            Self::Historical { .. } => None,
        }
    }

    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Self::Connector {
                lower_bound,
                upper_bound,
                ..
            }
            | Self::Predicted {
                lower_bound,
                upper_bound,
                ..
            } => Some((*lower_bound, *upper_bound)),
            Self::Historical { .. } => None,
        }
    }

    pub fn is_connector(&self) -> bool {
        matches!(self, Self::Connector { .. })
    }
}

impl From<&HistoricalPoint> for MergedSeriesPoint {
    fn from(p: &HistoricalPoint) -> Self {
        Self::Historical {
            period: p.period.clone(),
            demand: p.demand,
        }
    }
}

impl From<&PredictionPoint> for MergedSeriesPoint {
    fn from(p: &PredictionPoint) -> Self {
        Self::Predicted {
            period: p.period.clone(),
            predicted: p.predicted,
            lower_bound: p.lower_bound,
            upper_bound: p.upper_bound,
        }
    }
}

/// Concatenates history, one connector (only when history is non-empty) and
/// predictions. Input order is kept; nothing is sorted or deduplicated.
pub fn merge(
    historical: &[HistoricalPoint],
    predictions: &[PredictionPoint],
) -> Vec<MergedSeriesPoint> {
    let connector = historical.last().map(|last| MergedSeriesPoint::Connector {
        period: last.period.clone(),
        demand: last.demand,
        predicted: last.demand,
        lower_bound: last.demand,
        upper_bound: last.demand,
    });

    let mut out = Vec::with_capacity(historical.len() + predictions.len() + 1);
    out.extend(historical.iter().map(MergedSeriesPoint::from));
    out.extend(connector);
    out.extend(predictions.iter().map(MergedSeriesPoint::from));
    out
}

/// Summary figures shown next to the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOverview {
    pub historical_months: usize,
    pub projected_months: usize,
    pub last_observed: Option<HistoricalPoint>,
}

pub fn overview(forecast: &Forecast) -> SeriesOverview {
    SeriesOverview {
        historical_months: forecast.historical.len(),
        projected_months: forecast.predictions.len(),
        last_observed: forecast.historical.last().cloned(),
    }
}
