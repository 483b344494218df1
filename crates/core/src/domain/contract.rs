use crate::domain::series::{ConfidenceMetric, Forecast, HistoricalPoint, PredictionPoint};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

/// Payload returned by the prediction service for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub producto: String,
    #[serde(default)]
    pub historico: Vec<WireHistoricalPoint>,
    #[serde(default)]
    pub prediccion: Vec<WirePredictionPoint>,
    #[serde(default)]
    pub confianza: Option<WireConfidence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireHistoricalPoint {
    pub fecha: String,
    pub demanda: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePredictionPoint {
    pub fecha: String,
    pub prediccion: f64,
    pub limite_inferior: f64,
    pub limite_superior: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireConfidence {
    pub level: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub success: Option<bool>,
    pub productos: Vec<String>,
}

impl PredictionResponse {
    /// Checks structural shape and converts into the pipeline inputs.
    ///
    /// Period ordering is trusted as given and not re-sorted.
    pub fn validate_and_into_forecast(self) -> anyhow::Result<Forecast> {
        if self.success == Some(false) {
            let reason = self
                .error
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("no reason given");
            bail!("prediction service reported failure: {reason}");
        }

        let product = self.producto.trim().to_string();
        ensure!(!product.is_empty(), "producto must be non-empty");

        let historical = self
            .historico
            .into_iter()
            .enumerate()
            .map(|(idx, p)| p.validate_and_into_point(idx))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let predictions = self
            .prediccion
            .into_iter()
            .enumerate()
            .map(|(idx, p)| p.validate_and_into_point(idx))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let confidence = self
            .confianza
            .map(WireConfidence::validate_and_into_metric)
            .transpose()?;

        Ok(Forecast {
            product,
            historical,
            predictions,
            confidence,
        })
    }
}

impl WireHistoricalPoint {
    fn validate_and_into_point(self, idx: usize) -> anyhow::Result<HistoricalPoint> {
        let period = self.fecha.trim().to_string();
        ensure!(!period.is_empty(), "historico[{idx}].fecha must be non-empty");
        ensure!(
            self.demanda.is_finite() && self.demanda >= 0.0,
            "historico[{idx}].demanda must be a finite value >= 0 (got {})",
            self.demanda
        );
        Ok(HistoricalPoint {
            period,
            demand: self.demanda,
        })
    }
}

impl WirePredictionPoint {
    fn validate_and_into_point(self, idx: usize) -> anyhow::Result<PredictionPoint> {
        let period = self.fecha.trim().to_string();
        ensure!(!period.is_empty(), "prediccion[{idx}].fecha must be non-empty");
        ensure!(
            self.prediccion.is_finite()
                && self.limite_inferior.is_finite()
                && self.limite_superior.is_finite(),
            "prediccion[{idx}] values must be finite"
        );
        ensure!(
            self.limite_inferior <= self.prediccion && self.prediccion <= self.limite_superior,
            "prediccion[{idx}] must satisfy limite_inferior <= prediccion <= limite_superior (got {} <= {} <= {})",
            self.limite_inferior,
            self.prediccion,
            self.limite_superior
        );
        Ok(PredictionPoint {
            period,
            predicted: self.prediccion,
            lower_bound: self.limite_inferior,
            upper_bound: self.limite_superior,
        })
    }
}

impl WireConfidence {
    // An unknown level is not an error; only the score is structural.
    fn validate_and_into_metric(self) -> anyhow::Result<ConfidenceMetric> {
        ensure!(
            self.score.is_finite() && (0.0..=100.0).contains(&self.score),
            "confianza.score must be between 0 and 100 (got {})",
            self.score
        );
        Ok(ConfidenceMetric::from_label(&self.level, self.score))
    }
}

pub fn parse_prediction_response(text: &str) -> anyhow::Result<Forecast> {
    let parsed = serde_json::from_str::<PredictionResponse>(text.trim())
        .context("prediction payload does not match the expected schema")?;
    parsed.validate_and_into_forecast()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::ConfidenceLevel;
    use serde_json::json;

    fn valid_payload() -> serde_json::Value {
        json!({
            "success": true,
            "producto": "Papa",
            "historico": [
                {"fecha": "2024-01", "demanda": 100.0},
                {"fecha": "2024-02", "demanda": 110.0},
            ],
            "prediccion": [
                {"fecha": "2024-03", "prediccion": 120.0, "limite_inferior": 110.0, "limite_superior": 130.0},
                {"fecha": "2024-04", "prediccion": 125.0, "limite_inferior": 112.0, "limite_superior": 138.0},
            ],
            "confianza": {"level": "Alta", "score": 92},
        })
    }

    #[test]
    fn parses_valid_payload() {
        let forecast = parse_prediction_response(&valid_payload().to_string()).unwrap();
        assert_eq!(forecast.product, "Papa");
        assert_eq!(forecast.historical.len(), 2);
        assert_eq!(forecast.historical[1].period, "2024-02");
        assert_eq!(forecast.predictions[0].lower_bound, 110.0);
        let confidence = forecast.confidence.unwrap();
        assert_eq!(confidence.level, Some(ConfidenceLevel::High));
        assert_eq!(confidence.score, 92.0);
    }

    #[test]
    fn accepts_missing_optional_keys() {
        let v = json!({
            "producto": "Maíz",
            "prediccion": [
                {"fecha": "2024-03", "prediccion": 5.0, "limite_inferior": 4.0, "limite_superior": 6.0},
            ],
        });
        let forecast = parse_prediction_response(&v.to_string()).unwrap();
        assert!(forecast.historical.is_empty());
        assert!(forecast.confidence.is_none());
    }

    #[test]
    fn unknown_confidence_level_degrades_to_unclassified() {
        let mut v = valid_payload();
        v["confianza"] = json!({"level": "Desconocida", "score": 50});
        let forecast = parse_prediction_response(&v.to_string()).unwrap();
        assert_eq!(forecast.confidence.unwrap().level, None);
    }

    #[test]
    fn rejects_wrong_shape() {
        let v = json!({"producto": "Papa", "historico": [{"fecha": "2024-01", "demanda": "100"}]});
        assert!(parse_prediction_response(&v.to_string()).is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut v = valid_payload();
        v["prediccion"][0]["limite_inferior"] = json!(125.0);
        let err = parse_prediction_response(&v.to_string()).unwrap_err();
        assert!(err.to_string().contains("prediccion[0]"));
    }

    #[test]
    fn rejects_negative_demand_and_blank_product() {
        let mut v = valid_payload();
        v["historico"][0]["demanda"] = json!(-1.0);
        assert!(parse_prediction_response(&v.to_string()).is_err());

        let mut v = valid_payload();
        v["producto"] = json!("  ");
        assert!(parse_prediction_response(&v.to_string()).is_err());
    }

    #[test]
    fn rejects_out_of_range_score() {
        let mut v = valid_payload();
        v["confianza"]["score"] = json!(140);
        assert!(parse_prediction_response(&v.to_string()).is_err());
    }

    #[test]
    fn surfaces_service_failure_reason() {
        let v = json!({"success": false, "error": "Producto no encontrado"});
        let err = parse_prediction_response(&v.to_string()).unwrap_err();
        assert!(err.to_string().contains("Producto no encontrado"));
    }

    #[test]
    fn keeps_caller_ordering() {
        let mut v = valid_payload();
        v["historico"] = json!([
            {"fecha": "2024-05", "demanda": 1.0},
            {"fecha": "2024-01", "demanda": 2.0},
        ]);
        let forecast = parse_prediction_response(&v.to_string()).unwrap();
        assert_eq!(forecast.historical[0].period, "2024-05");
    }
}
