pub mod analysis;
pub mod domain;
pub mod pipeline;
pub mod predict;
pub mod render;
pub mod report;
pub mod time;

pub mod config {
    use anyhow::Context;

    const DEFAULT_DEMAND_UNIT: &str = "TN";
    const DEFAULT_LINES_PER_PAGE: usize = 48;
    const DEFAULT_PERIODS: u32 = 3;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub prediction_api_url: Option<String>,
        pub prediction_api_key: Option<String>,
        pub prediction_timeout_secs: Option<u64>,
        pub prediction_periods: u32,
        pub demand_unit: String,
        pub report_lines_per_page: usize,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let prediction_periods = match std::env::var("PREDICTION_PERIODS") {
                Ok(s) => s
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("PREDICTION_PERIODS must be a positive integer (got {s:?})"))?,
                Err(_) => DEFAULT_PERIODS,
            };
            anyhow::ensure!(prediction_periods >= 1, "PREDICTION_PERIODS must be >= 1");

            let report_lines_per_page = match std::env::var("REPORT_LINES_PER_PAGE") {
                Ok(s) => s
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("REPORT_LINES_PER_PAGE must be an integer (got {s:?})"))?,
                Err(_) => DEFAULT_LINES_PER_PAGE,
            };

            Ok(Self {
                prediction_api_url: std::env::var("PREDICTION_API_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                prediction_api_key: std::env::var("PREDICTION_API_KEY").ok(),
                prediction_timeout_secs: std::env::var("PREDICTION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                prediction_periods,
                demand_unit: std::env::var("DEMAND_UNIT")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_DEMAND_UNIT.to_string()),
                report_lines_per_page,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_prediction_api_url(&self) -> anyhow::Result<&str> {
            self.prediction_api_url
                .as_deref()
                .context("PREDICTION_API_URL is required")
        }

        pub fn report_options(&self) -> crate::report::ReportOptions {
            crate::report::ReportOptions {
                unit: self.demand_unit.clone(),
                ..Default::default()
            }
        }
    }
}
