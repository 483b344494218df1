use crate::analysis::merge::{merge, overview, MergedSeriesPoint, SeriesOverview};
use crate::analysis::table::{build_table, PredictionTable};
use crate::analysis::trend::TrendCalculator;
use crate::domain::series::Forecast;
use crate::report::{ReportComposer, ReportDocument, ReportOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub product: String,
    pub points: Vec<MergedSeriesPoint>,
    pub overview: SeriesOverview,
}

/// Everything a client shows for one product: chart series, prediction
/// table and the exportable report. Each part is computed independently
/// from the same inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastView {
    pub chart: ChartView,
    pub table: PredictionTable,
    pub report: ReportDocument,
}

pub fn chart_view(forecast: &Forecast) -> ChartView {
    ChartView {
        product: forecast.product.clone(),
        points: merge(&forecast.historical, &forecast.predictions),
        overview: overview(forecast),
    }
}

pub fn table_view(forecast: &Forecast, options: &ReportOptions) -> PredictionTable {
    build_table(
        &forecast.product,
        &forecast.predictions,
        forecast.confidence.as_ref(),
        &TrendCalculator::new(options.noise_floor),
    )
}

pub fn build_view(
    forecast: &Forecast,
    options: &ReportOptions,
    generated_at: DateTime<Utc>,
) -> ForecastView {
    ForecastView {
        chart: chart_view(forecast),
        table: table_view(forecast, options),
        report: ReportComposer::new(options.clone()).compose_forecast(forecast, generated_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::trend::TrendDirection;
    use crate::domain::contract::parse_prediction_response;
    use crate::report::TableKind;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn end_to_end_from_wire_payload() {
        let payload = json!({
            "success": true,
            "producto": "Papa",
            "historico": [
                {"fecha": "2024-01", "demanda": 100},
                {"fecha": "2024-02", "demanda": 110},
            ],
            "prediccion": [
                {"fecha": "2024-03", "prediccion": 120, "limite_inferior": 110, "limite_superior": 130},
                {"fecha": "2024-04", "prediccion": 125, "limite_inferior": 112, "limite_superior": 138},
            ],
            "confianza": {"level": "Alta", "score": 92},
        });
        let forecast = parse_prediction_response(&payload.to_string()).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let view = build_view(&forecast, &ReportOptions::default(), at);

        assert_eq!(view.chart.points.len(), 5);
        assert_eq!(
            view.chart.points.iter().filter(|p| p.is_connector()).count(),
            1
        );
        assert_eq!(view.chart.points[2].period(), "2024-02");
        assert_eq!(view.chart.points[2].predicted(), Some(110.0));
        assert_eq!(view.chart.overview.historical_months, 2);

        assert_eq!(view.table.rows[1].trend.direction, TrendDirection::Up);
        assert_eq!(view.table.rows[1].change, "+4.2%");
        assert_eq!(view.table.average_predicted, Some(122.5));

        assert_eq!(view.report.stats.average_prediction, Some(122.5));
        assert_eq!(view.report.stats.last_historical, Some(110.0));
        assert_eq!(view.report.stats.projected_change.unwrap().percent_change, Some(11.4));
        assert_eq!(view.report.table_rows(TableKind::RecentHistorical).len(), 2);
    }

    #[test]
    fn empty_history_end_to_end() {
        let payload = json!({
            "producto": "Papa",
            "historico": [],
            "prediccion": [
                {"fecha": "2024-03", "prediccion": 120, "limite_inferior": 110, "limite_superior": 130},
            ],
        });
        let forecast = parse_prediction_response(&payload.to_string()).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap();
        let view = build_view(&forecast, &ReportOptions::default(), at);

        assert_eq!(view.chart.points.len(), 1);
        assert!(!view.chart.points[0].is_connector());
        assert_eq!(view.chart.overview.last_observed, None);
        assert_eq!(view.report.stat_lines(), ["• Promedio predicho: 120.00 TN"]);
    }
}
