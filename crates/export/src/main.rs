use agropred_core::domain::contract::parse_prediction_response;
use agropred_core::domain::series::Forecast;
use agropred_core::pipeline;
use agropred_core::predict::{HttpPredictionClient, PredictionClient, PredictionServiceError};
use agropred_core::render::{ChartFormat, ReportFormat};
use agropred_core::report::{is_path_safe_filename, ReportComposer};
use agropred_core::time::calendar::resolve_generation_date;
use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "agropred_export")]
struct Args {
    /// Prediction payload (JSON) previously saved from the prediction service.
    #[arg(long, conflicts_with = "product")]
    input: Option<PathBuf>,

    /// Fetch this product from the prediction service instead of reading a file.
    #[arg(long)]
    product: Option<String>,

    /// Forecast horizon when fetching. Defaults to PREDICTION_PERIODS.
    #[arg(long)]
    periods: Option<u32>,

    /// Directory the report is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Also write the chart series in this format.
    #[arg(long, value_enum)]
    chart: Option<ChartFormat>,

    /// Generation date (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long)]
    date: Option<String>,

    /// Body lines per page. Defaults to REPORT_LINES_PER_PAGE.
    #[arg(long)]
    lines_per_page: Option<usize>,

    /// Build the report without writing any file.
    #[arg(long)]
    dry_run: bool,
}

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

    let args = Args::parse();

    match run(&args, &settings).await {
        Ok(written) => {
            for path in &written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            if let Some(diag) = err.downcast_ref::<PredictionServiceError>() {
                tracing::error!(
                    stage = diag.stage,
                    status = ?diag.status,
                    raw_body = ?diag.raw_body,
                    "prediction service call failed"
                );
            }
            tracing::error!(error = %err, "report export failed");
            Err(err)
        }
    }
}

async fn run(args: &Args, settings: &agropred_core::config::Settings) -> anyhow::Result<Vec<PathBuf>> {
    let forecast = load_forecast(args, settings).await?;
    let generated_at = resolve_generated_at(args.date.as_deref(), Utc::now())?;

    let doc = ReportComposer::new(settings.report_options()).compose_forecast(&forecast, generated_at);
    let renderer =
        args.format.renderer(args.lines_per_page.unwrap_or(settings.report_lines_per_page));

    let report_name = doc.suggested_filename(renderer.extension());
    anyhow::ensure!(
        is_path_safe_filename(&report_name),
        "product name {:?} would produce an unsafe file name: {report_name}",
        forecast.product
    );

    let mut outputs: Vec<(PathBuf, Vec<u8>)> = Vec::with_capacity(2);
    outputs.push((args.out_dir.join(&report_name), renderer.render(&doc)?));

    if let Some(chart_format) = args.chart {
        let chart = chart_format.renderer();
        let series = pipeline::chart_view(&forecast).points;
        let chart_name = doc.suggested_filename(&format!("chart.{}", chart.extension()));
        outputs.push((args.out_dir.join(chart_name), chart.render_chart(&series)?));
    }

    if args.dry_run {
        for (path, bytes) in &outputs {
            tracing::info!(
                product = %forecast.product,
                path = %path.display(),
                bytes = bytes.len(),
                dry_run = true,
                "report export (dry-run)"
            );
        }
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    let mut written = Vec::with_capacity(outputs.len());
    for (path, bytes) in outputs {
        write_file(&path, &bytes)?;
        tracing::info!(product = %forecast.product, path = %path.display(), bytes = bytes.len(), "wrote export");
        written.push(path);
    }
    Ok(written)
}

async fn load_forecast(
    args: &Args,
    settings: &agropred_core::config::Settings,
) -> anyhow::Result<Forecast> {
    if let Some(input) = &args.input {
        let text = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        return parse_prediction_response(&text)
            .with_context(|| format!("invalid prediction payload in {}", input.display()));
    }

    let Some(product) = args.product.as_deref() else {
        anyhow::bail!("either --input or --product is required");
    };

    let client = HttpPredictionClient::from_settings(settings)?;
    let periods = args.periods.unwrap_or(settings.prediction_periods);
    client.fetch_prediction(product, periods).await
}

fn resolve_generated_at(date_arg: Option<&str>, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    if date_arg.is_none() {
        return Ok(now);
    }
    let date = resolve_generation_date(date_arg, now)?;
    let midday = date.and_hms_opt(12, 0, 0).context("invalid generation date")?;
    Ok(Utc.from_utc_datetime(&midday))
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
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
