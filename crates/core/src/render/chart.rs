use crate::analysis::merge::MergedSeriesPoint;
use crate::render::ChartRenderer;
use anyhow::Context;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ChartRow<'a> {
    kind: &'static str,
    period: &'a str,
    demand: Option<f64>,
    predicted: Option<f64>,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
}

impl<'a> From<&'a MergedSeriesPoint> for ChartRow<'a> {
    fn from(point: &'a MergedSeriesPoint) -> Self {
        let kind = match point {
            MergedSeriesPoint::Historical { .. } => "historical",
            MergedSeriesPoint::Connector { .. } => "connector",
            MergedSeriesPoint::Predicted { .. } => "predicted",
        };
        let bounds = point.bounds();
        Self {
            kind,
            period: point.period(),
            demand: point.demand(),
            predicted: point.predicted(),
            lower_bound: bounds.map(|(lower, _)| lower),
            upper_bound: bounds.map(|(_, upper)| upper),
        }
    }
}

/// One CSV row per merged point; fields a variant does not carry are empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvChartRenderer;

impl ChartRenderer for CsvChartRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn render_chart(&self, series: &[MergedSeriesPoint]) -> anyhow::Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if series.is_empty() {
            writer
                .write_record(["kind", "period", "demand", "predicted", "lower_bound", "upper_bound"])
                .context("failed to write chart header")?;
        }
        for point in series {
            writer
                .serialize(ChartRow::from(point))
                .with_context(|| format!("failed to write chart row for {}", point.period()))?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush chart csv: {e}"))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer;

impl ChartRenderer for JsonChartRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn render_chart(&self, series: &[MergedSeriesPoint]) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec_pretty(series).context("failed to serialize chart series")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::merge::merge;
    use crate::domain::series::{HistoricalPoint, PredictionPoint};

    fn series() -> Vec<MergedSeriesPoint> {
        merge(
            &[HistoricalPoint {
                period: "2024-02".to_string(),
                demand: 110.0,
            }],
            &[PredictionPoint {
                period: "2024-03".to_string(),
                predicted: 120.0,
                lower_bound: 110.0,
                upper_bound: 130.0,
            }],
        )
    }

    #[test]
    fn csv_has_one_row_per_point() {
        let bytes = CsvChartRenderer.render_chart(&series()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "kind,period,demand,predicted,lower_bound,upper_bound",
                "historical,2024-02,110.0,,,",
                "connector,2024-02,110.0,110.0,110.0,110.0",
                "predicted,2024-03,,120.0,110.0,130.0",
            ]
        );
    }

    #[test]
    fn csv_of_empty_series_is_header_only() {
        let bytes = CsvChartRenderer.render_chart(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "kind,period,demand,predicted,lower_bound,upper_bound\n"
        );
    }

    #[test]
    fn json_keeps_variant_tags() {
        let bytes = JsonChartRenderer.render_chart(&series()).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 3);
        assert_eq!(v[2]["kind"], "predicted");
    }
}
