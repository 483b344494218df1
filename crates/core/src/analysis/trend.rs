//! Direction and percentage change between consecutive values.

use crate::domain::series::PredictionPoint;
use serde::{Deserialize, Serialize};

/// Changes smaller than this (in series units) are reported as flat.
pub const DEFAULT_NOISE_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
    Unknown,
}

/// `percent_change` is `None` when there is no previous value (`Unknown`)
/// and when the previous value is zero while the change is above the noise
/// floor (the percentage is undefined).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub percent_change: Option<f64>,
}

impl TrendResult {
    pub const UNKNOWN: Self = Self {
        direction: TrendDirection::Unknown,
        percent_change: None,
    };

    pub const FLAT: Self = Self {
        direction: TrendDirection::Flat,
        percent_change: Some(0.0),
    };

    /// Direction and percentage of a single comparison where every
    /// difference counts, however small. Only the zero baseline is guarded.
    pub fn unfiltered(current: f64, previous: f64) -> Self {
        let delta = current - previous;
        if delta == 0.0 {
            return Self::FLAT;
        }
        Self {
            direction: if delta > 0.0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            },
            percent_change: TrendCalculator::percent_change(current, previous),
        }
    }

    /// True when a real change happened against a zero baseline.
    pub fn is_undefined(&self) -> bool {
        matches!(self.direction, TrendDirection::Up | TrendDirection::Down)
            && self.percent_change.is_none()
    }

    /// `-` without a previous value, `N/A` for the zero-baseline case,
    /// otherwise one decimal with a leading `+` on positive changes.
    pub fn display_change(&self) -> String {
        match (self.direction, self.percent_change) {
            (TrendDirection::Unknown, _) => "-".to_string(),
            (_, None) => "N/A".to_string(),
            (_, Some(pct)) => format_percent(pct),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendCalculator {
    pub noise_floor: f64,
}

impl Default for TrendCalculator {
    fn default() -> Self {
        Self {
            noise_floor: DEFAULT_NOISE_FLOOR,
        }
    }
}

impl TrendCalculator {
    pub fn new(noise_floor: f64) -> Self {
        Self {
            noise_floor: noise_floor.abs(),
        }
    }

    pub fn compute(&self, current: f64, previous: Option<f64>) -> TrendResult {
        let Some(previous) = previous else {
            return TrendResult::UNKNOWN;
        };

        let delta = current - previous;
        // Tolerate representation error so 100.1 vs 100.0 counts as a 0.1 step.
        let slack = f64::EPSILON * current.abs().max(previous.abs()).max(1.0);
        if delta.abs() + slack < self.noise_floor {
            return TrendResult::FLAT;
        }

        let direction = if delta > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        if previous == 0.0 {
            return TrendResult {
                direction,
                percent_change: None,
            };
        }

        TrendResult {
            direction,
            percent_change: Self::percent_change(current, previous),
        }
    }

    /// Percentage change rounded to one decimal, with no noise floor.
    /// `None` for a zero baseline.
    pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
        if previous == 0.0 {
            return None;
        }
        let pct = round_to((current - previous) / previous * 100.0, 1);
        pct.is_finite().then_some(pct)
    }

    /// Trend of every prediction against the one before it; the first has
    /// no previous value.
    pub fn annotate(&self, predictions: &[PredictionPoint]) -> Vec<TrendResult> {
        predictions
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let previous = idx
                    .checked_sub(1)
                    .map(|prev| predictions[prev].predicted);
                self.compute(p.predicted, previous)
            })
            .collect()
    }
}

pub fn compute_trend(current: f64, previous: Option<f64>) -> TrendResult {
    TrendCalculator::default().compute(current, previous)
}

pub fn annotate_predictions(predictions: &[PredictionPoint]) -> Vec<TrendResult> {
    TrendCalculator::default().annotate(predictions)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// One decimal place, `+` for positive values. Values that round to zero
/// print as `0.0%` (never `-0.0%`).
pub fn format_percent(pct: f64) -> String {
    let rounded = round_to(pct, 1);
    if rounded > 0.0 {
        format!("+{rounded:.1}%")
    } else if rounded < 0.0 {
        format!("{rounded:.1}%")
    } else {
        "0.0%".to_string()
    }
}
