use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agropred_core::analysis::table::PredictionTable;
use agropred_core::domain::contract::PredictionResponse;
use agropred_core::domain::series::Forecast;
use agropred_core::pipeline::{self, ChartView, ForecastView};
use agropred_core::predict::{HttpPredictionClient, PredictionClient, PredictionServiceError};
use agropred_core::render::ReportFormat;
use agropred_core::report::format::percent_encode;
use agropred_core::report::{ReportComposer, ReportDocument, ReportOptions};
use agropred_core::time::calendar::resolve_generation_date;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = agropred_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let client: Option<Arc<dyn PredictionClient>> =
        match HttpPredictionClient::from_settings(&settings) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "prediction service not configured; starting API in degraded mode");
                None
            }
        };

    let state = AppState {
        client,
        options: settings.report_options(),
        lines_per_page: settings.report_lines_per_page,
        default_periods: settings.prediction_periods,
    };

    let app = router(state).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/forecast/series", post(post_series))
        .route("/forecast/table", post(post_table))
        .route("/forecast/report", post(post_report))
        .route("/forecast/report/export", post(post_report_export))
        .route("/products", get(get_products))
        .route("/predict/:product", get(get_prediction))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    client: Option<Arc<dyn PredictionClient>>,
    options: ReportOptions,
    lines_per_page: usize,
    default_periods: u32,
}

type ApiError = (StatusCode, String);

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    /// Generation date override (YYYY-MM-DD).
    date: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PredictQuery {
    periods: Option<u32>,
    date: Option<String>,
}

fn invalid_input(err: anyhow::Error) -> ApiError {
    tracing::warn!(error = %err, "rejected forecast payload");
    (StatusCode::UNPROCESSABLE_ENTITY, format!("{err:#}"))
}

fn upstream_error(err: anyhow::Error) -> ApiError {
    if let Some(diag) = err.downcast_ref::<PredictionServiceError>() {
        if diag.status == Some(404) {
            return (StatusCode::NOT_FOUND, diag.detail.clone());
        }
    }
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "prediction service call failed");
    (StatusCode::BAD_GATEWAY, format!("{err:#}"))
}

fn validate(payload: PredictionResponse) -> Result<Forecast, ApiError> {
    payload.validate_and_into_forecast().map_err(invalid_input)
}

fn generated_at(date_arg: Option<&str>) -> Result<DateTime<Utc>, ApiError> {
    let now = Utc::now();
    if date_arg.is_none() {
        return Ok(now);
    }
    let date = resolve_generation_date(date_arg, now).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("date must be YYYY-MM-DD ({e})"),
        )
    })?;
    let midday = date
        .and_hms_opt(12, 0, 0)
        .ok_or((StatusCode::BAD_REQUEST, "invalid date".to_string()))?;
    Ok(Utc.from_utc_datetime(&midday))
}

async fn post_series(Json(payload): Json<PredictionResponse>) -> Result<Json<ChartView>, ApiError> {
    let forecast = validate(payload)?;
    Ok(Json(pipeline::chart_view(&forecast)))
}

async fn post_table(
    State(state): State<AppState>,
    Json(payload): Json<PredictionResponse>,
) -> Result<Json<PredictionTable>, ApiError> {
    let forecast = validate(payload)?;
    Ok(Json(pipeline::table_view(&forecast, &state.options)))
}

async fn post_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    Json(payload): Json<PredictionResponse>,
) -> Result<Json<ReportDocument>, ApiError> {
    let forecast = validate(payload)?;
    let at = generated_at(query.date.as_deref())?;
    let doc = ReportComposer::new(state.options.clone()).compose_forecast(&forecast, at);
    Ok(Json(doc))
}

async fn post_report_export(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    Json(payload): Json<PredictionResponse>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(f) => f
            .parse::<ReportFormat>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => ReportFormat::Text,
    };
    let forecast = validate(payload)?;
    let at = generated_at(query.date.as_deref())?;
    let doc = ReportComposer::new(state.options.clone()).compose_forecast(&forecast, at);

    let renderer = format.renderer(state.lines_per_page);
    let bytes = renderer.render(&doc).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;
    let filename = doc.suggested_filename(renderer.extension());

    tracing::info!(product = %doc.product, %filename, bytes = bytes.len(), "exported report");

    Ok((
        [
            (header::CONTENT_TYPE, renderer.content_type().to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        bytes,
    )
        .into_response())
}

async fn get_products(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let Some(client) = &state.client else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "prediction service not configured".to_string(),
        ));
    };
    let products = client.list_products().await.map_err(upstream_error)?;
    Ok(Json(products))
}

async fn get_prediction(
    State(state): State<AppState>,
    Path(product): Path<String>,
    Query(query): Query<PredictQuery>,
) -> Result<Json<ForecastView>, ApiError> {
    let Some(client) = &state.client else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "prediction service not configured".to_string(),
        ));
    };

    let periods = query.periods.unwrap_or(state.default_periods);
    if periods == 0 {
        return Err((StatusCode::BAD_REQUEST, "periods must be >= 1".to_string()));
    }
    let at = generated_at(query.date.as_deref())?;

    let forecast = client
        .fetch_prediction(&product, periods)
        .await
        .map_err(upstream_error)?;

    Ok(Json(pipeline::build_view(&forecast, &state.options, at)))
}

// ASCII fallback plus RFC 5987 `filename*` for non-ASCII product names.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        percent_encode(filename)
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &agropred_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
