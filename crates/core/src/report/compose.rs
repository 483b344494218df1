use crate::analysis::confidence::classify;
use crate::analysis::table::mean_predicted;
use crate::analysis::trend::{round_to, TrendCalculator, TrendResult};
use crate::domain::series::{ConfidenceMetric, Forecast, HistoricalPoint, PredictionPoint};
use crate::report::format::{quantity, range};
use crate::report::{
    FooterTemplate, ReportDocument, ReportOptions, ReportStats, Section, TableKind, REPORT_BRAND,
};
use crate::time::calendar::spanish_long_date;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct ReportComposer {
    options: ReportOptions,
}

impl ReportComposer {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn compose_forecast(
        &self,
        forecast: &Forecast,
        generated_at: DateTime<Utc>,
    ) -> ReportDocument {
        self.compose(
            &forecast.product,
            &forecast.historical,
            &forecast.predictions,
            forecast.confidence.as_ref(),
            generated_at,
        )
    }

    pub fn compose(
        &self,
        product: &str,
        historical: &[HistoricalPoint],
        predictions: &[PredictionPoint],
        confidence: Option<&ConfidenceMetric>,
        generated_at: DateTime<Utc>,
    ) -> ReportDocument {
        let generated_on = generated_at.date_naive();
        let calculator = TrendCalculator::new(self.options.noise_floor);
        let stats = self.stats(historical, predictions);

        let mut sections = vec![
            Section::TitleBlock {
                brand: REPORT_BRAND.to_string(),
                title: format!("Reporte de Predicción - {product}"),
                product: product.to_string(),
                generated_on,
                generated_label: format!("Generado el: {}", spanish_long_date(generated_on)),
            },
            Section::ConfidenceSummary {
                heading: "Nivel de Confianza del Modelo:".to_string(),
                badge: confidence.and_then(classify),
                text: confidence.map(ConfidenceMetric::summary_text),
                historical_months: historical.len(),
                months_label: format!("Datos históricos analizados: {} meses", historical.len()),
            },
            self.recent_historical_table(historical),
            self.predictions_table(predictions, &calculator),
        ];

        let lines = self.stat_lines(&stats);
        if !lines.is_empty() {
            sections.push(Section::StatBlock {
                title: "Resumen Estadístico:".to_string(),
                lines,
            });
        }

        tracing::debug!(
            product = %product,
            historical = historical.len(),
            predictions = predictions.len(),
            sections = sections.len(),
            "composed forecast report"
        );

        ReportDocument {
            product: product.to_string(),
            generated_on,
            sections,
            stats,
            footer: FooterTemplate::default(),
        }
    }

    fn recent_historical_table(&self, historical: &[HistoricalPoint]) -> Section {
        let start = historical.len().saturating_sub(self.options.recent_window);
        let rows = historical[start..]
            .iter()
            .map(|p| vec![p.period.clone(), quantity(p.demand, &self.options.unit)])
            .collect();

        Section::Table {
            kind: TableKind::RecentHistorical,
            title: "Demanda Histórica Reciente:".to_string(),
            columns: vec!["Período".to_string(), "Demanda".to_string()],
            rows,
        }
    }

    fn predictions_table(
        &self,
        predictions: &[PredictionPoint],
        calculator: &TrendCalculator,
    ) -> Section {
        let unit = &self.options.unit;
        let rows = predictions
            .iter()
            .zip(calculator.annotate(predictions))
            .map(|(p, trend)| {
                vec![
                    p.period.clone(),
                    quantity(p.predicted, unit),
                    trend.display_change(),
                    range(p.lower_bound, p.upper_bound, unit),
                ]
            })
            .collect();

        Section::Table {
            kind: TableKind::Predictions,
            title: "Predicciones:".to_string(),
            columns: vec![
                "Período".to_string(),
                "Predicción".to_string(),
                "Cambio".to_string(),
                "Rango Confianza".to_string(),
            ],
            rows,
        }
    }

    fn stats(
        &self,
        historical: &[HistoricalPoint],
        predictions: &[PredictionPoint],
    ) -> ReportStats {
        // The projected change is measured from the displayed (2dp) average
        // and, unlike the table's Change column, has no noise floor.
        let average_prediction = mean_predicted(predictions).map(|m| round_to(m, 2));
        let last_historical = historical.last().map(|p| p.demand);
        let projected_change = match (average_prediction, last_historical) {
            (Some(avg), Some(last)) => Some(TrendResult::unfiltered(avg, last)),
            _ => None,
        };

        ReportStats {
            average_prediction,
            last_historical,
            projected_change,
        }
    }

    fn stat_lines(&self, stats: &ReportStats) -> Vec<String> {
        let unit = &self.options.unit;
        let mut lines = Vec::with_capacity(3);
        if let Some(avg) = stats.average_prediction {
            lines.push(format!("• Promedio predicho: {}", quantity(avg, unit)));
        }
        if let Some(last) = stats.last_historical {
            lines.push(format!("• Última demanda real: {}", quantity(last, unit)));
        }
        if let Some(change) = stats.projected_change {
            lines.push(format!("• Cambio proyectado: {}", change.display_change()));
        }
        lines
    }
}

pub fn compose(
    product: &str,
    historical: &[HistoricalPoint],
    predictions: &[PredictionPoint],
    confidence: Option<&ConfidenceMetric>,
    generated_at: DateTime<Utc>,
) -> ReportDocument {
    ReportComposer::default().compose(product, historical, predictions, confidence, generated_at)
}
