use crate::config::Settings;
use crate::domain::contract::{PredictionResponse, ProductsResponse};
use crate::domain::series::Forecast;
use crate::predict::{PredictionClient, PredictionServiceError};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpPredictionClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let raw_url = settings.require_prediction_api_url()?;
        let base_url = Url::parse(raw_url)
            .with_context(|| format!("PREDICTION_API_URL is not a valid URL: {raw_url}"))?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "PREDICTION_API_URL cannot be used as a base URL: {raw_url}"
        );
        let timeout_secs = settings
            .prediction_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build prediction service http client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.prediction_api_key.clone(),
        })
    }

    /// Appends path segments to the base URL; each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("cannot append a path to {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        product: Option<&str>,
    ) -> Result<T> {
        let diag = |stage: &'static str, status: Option<u16>, detail: String, raw_body: Option<Value>| {
            PredictionServiceError {
                product: product.map(str::to_string),
                stage,
                status,
                detail,
                raw_body,
            }
        };

        let res = self
            .http
            .get(self.url(segments)?)
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .map_err(|e| diag("request", None, e.to_string(), None))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| diag("read_body", Some(status.as_u16()), e.to_string(), None))?;
        let raw_json = serde_json::from_str::<Value>(&text).map_err(|e| {
            diag(
                "decode",
                Some(status.as_u16()),
                format!("response is not valid JSON ({e})"),
                Some(serde_json::json!({ "raw_text": text })),
            )
        })?;

        if !status.is_success() {
            let detail = raw_json
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(diag("http_status", Some(status.as_u16()), detail, Some(raw_json)).into());
        }

        serde_json::from_value::<T>(raw_json.clone()).map_err(|e| {
            diag("schema", Some(status.as_u16()), e.to_string(), Some(raw_json)).into()
        })
    }
}

#[async_trait::async_trait]
impl PredictionClient for HttpPredictionClient {
    fn service_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn list_products(&self) -> Result<Vec<String>> {
        let resp: ProductsResponse = self.get_json(&["products"], &[], None).await?;
        Ok(resp
            .productos
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect())
    }

    async fn fetch_prediction(&self, product: &str, periods: u32) -> Result<Forecast> {
        anyhow::ensure!(!product.trim().is_empty(), "product must be non-empty");
        anyhow::ensure!(periods >= 1, "periods must be >= 1 (got {periods})");

        let resp: PredictionResponse = self
            .get_json(&["predict", product.trim()], &[("periods", periods.to_string())], Some(product))
            .await?;
        let forecast = resp
            .validate_and_into_forecast()
            .with_context(|| format!("invalid prediction payload for product {product}"))?;

        tracing::info!(
            product = %forecast.product,
            periods,
            historical = forecast.historical.len(),
            predictions = forecast.predictions.len(),
            "fetched prediction"
        );
        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpPredictionClient {
        HttpPredictionClient {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url).unwrap(),
            api_key: Some("secret".to_string()),
        }
    }

    #[test]
    fn joins_base_url_and_path() {
        assert_eq!(
            client("http://localhost:5000/api/")
                .url(&["predict", "Papa"])
                .unwrap()
                .as_str(),
            "http://localhost:5000/api/predict/Papa"
        );
        assert_eq!(
            client("http://localhost:5000/api")
                .url(&["products"])
                .unwrap()
                .as_str(),
            "http://localhost:5000/api/products"
        );
        assert_eq!(
            client("http://localhost:5000").url(&["products"]).unwrap().as_str(),
            "http://localhost:5000/products"
        );
    }

    #[test]
    fn encodes_product_path_segment() {
        let url = client("http://localhost:5000/api/")
            .url(&["predict", "Maíz amarillo/duro"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/predict/Ma%C3%ADz%20amarillo%2Fduro"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let settings = crate::config::Settings {
            prediction_api_url: Some("not a url".to_string()),
            prediction_api_key: None,
            prediction_timeout_secs: None,
            prediction_periods: 3,
            demand_unit: "TN".to_string(),
            report_lines_per_page: 48,
            sentry_dsn: None,
        };
        let err = HttpPredictionClient::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn sends_api_key_header() {
        let headers = client("http://x").headers().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }
}
