use crate::domain::series::{ConfidenceLevel, ConfidenceMetric};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Green,
    Yellow,
    Red,
}

impl BadgeColor {
    /// RGB used by document renderers.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Green => (34, 197, 94),
            Self::Yellow => (234, 179, 8),
            Self::Red => (239, 68, 68),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayBadge {
    pub label: String,
    pub color: BadgeColor,
}

pub fn color_for(level: ConfidenceLevel) -> BadgeColor {
    match level {
        ConfidenceLevel::High => BadgeColor::Green,
        ConfidenceLevel::Medium => BadgeColor::Yellow,
        ConfidenceLevel::Low => BadgeColor::Red,
    }
}

/// `None` means "no classification available"; an unrecognized level is not
/// an error.
pub fn classify(metric: &ConfidenceMetric) -> Option<DisplayBadge> {
    let level = metric.level?;
    Some(DisplayBadge {
        label: format!("Confianza {}: {}%", level.label(), metric.score),
        color: color_for(level),
    })
}
