pub mod error;
pub mod http;

use crate::domain::series::Forecast;

pub use error::PredictionServiceError;
pub use http::HttpPredictionClient;

pub const DEFAULT_PERIODS: u32 = 3;

/// The external forecasting backend. Implementations return already
/// validated pipeline inputs.
#[async_trait::async_trait]
pub trait PredictionClient: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn list_products(&self) -> anyhow::Result<Vec<String>>;

    async fn fetch_prediction(&self, product: &str, periods: u32) -> anyhow::Result<Forecast>;
}
