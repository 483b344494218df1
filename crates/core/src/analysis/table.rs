use crate::analysis::confidence::{classify, DisplayBadge};
use crate::analysis::trend::{round_to, TrendCalculator, TrendResult};
use crate::domain::series::{ConfidenceMetric, PredictionPoint};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub period: String,
    pub predicted: f64,
    pub trend: TrendResult,
    pub change: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Interactive prediction table: one row per prediction with its trend
/// against the previous row, plus the average of all predicted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    pub product: String,
    pub badge: Option<DisplayBadge>,
    pub rows: Vec<PredictionRow>,
    pub average_predicted: Option<f64>,
}

pub fn mean_predicted(predictions: &[PredictionPoint]) -> Option<f64> {
    if predictions.is_empty() {
        return None;
    }
    let sum: f64 = predictions.iter().map(|p| p.predicted).sum();
    Some(sum / predictions.len() as f64)
}

pub fn build_table(
    product: &str,
    predictions: &[PredictionPoint],
    confidence: Option<&ConfidenceMetric>,
    calculator: &TrendCalculator,
) -> PredictionTable {
    let rows = predictions
        .iter()
        .zip(calculator.annotate(predictions))
        .map(|(p, trend)| PredictionRow {
            period: p.period.clone(),
            predicted: p.predicted,
            change: trend.display_change(),
            trend,
            lower_bound: p.lower_bound,
            upper_bound: p.upper_bound,
        })
        .collect();

    PredictionTable {
        product: product.to_string(),
        badge: confidence.and_then(classify),
        rows,
        average_predicted: mean_predicted(predictions).map(|m| round_to(m, 2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::confidence::BadgeColor;
    use crate::analysis::trend::TrendDirection;
    use crate::domain::series::ConfidenceLevel;

    fn pred(period: &str, predicted: f64) -> PredictionPoint {
        PredictionPoint {
            period: period.to_string(),
            predicted,
            lower_bound: predicted - 1.0,
            upper_bound: predicted + 1.0,
        }
    }

    #[test]
    fn mean_of_predictions() {
        let preds = vec![pred("a", 10.0), pred("b", 20.0), pred("c", 30.0)];
        assert_eq!(mean_predicted(&preds), Some(20.0));
        assert_eq!(mean_predicted(&[]), None);
    }

    #[test]
    fn rows_carry_trend_against_previous_row() {
        let preds = vec![pred("2024-03", 120.0), pred("2024-04", 125.0), pred("2024-05", 100.0)];
        let metric = ConfidenceMetric::new(ConfidenceLevel::Medium, 70.0);
        let table = build_table("Papa", &preds, Some(&metric), &TrendCalculator::default());

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].change, "-");
        assert_eq!(table.rows[1].change, "+4.2%");
        assert_eq!(table.rows[2].trend.direction, TrendDirection::Down);
        assert_eq!(table.rows[2].change, "-20.0%");
        assert_eq!(table.badge.unwrap().color, BadgeColor::Yellow);
        assert_eq!(table.average_predicted, Some(115.0));
    }

    #[test]
    fn empty_predictions_have_no_average() {
        let table = build_table("Papa", &[], None, &TrendCalculator::default());
        assert!(table.rows.is_empty());
        assert_eq!(table.average_predicted, None);
        assert_eq!(table.badge, None);
    }
}
