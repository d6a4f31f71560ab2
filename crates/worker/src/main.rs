use clap::Parser;
use std::path::PathBuf;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preopen_core::config::Settings;
use preopen_core::notify::email::{send_briefing, EmailConfig};
use preopen_core::storage::prediction_log::PredictionLog;
use preopen_core::time::us_market;

mod pipeline;

#[derive(Debug, Parser)]
#[command(name = "preopen_worker", about = "Pre-open market briefing run")]
struct Args {
    /// Run date (YYYY-MM-DD). Defaults to today in MARKET_TIMEZONE.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Print the briefing only; skip the prediction log and the email.
    #[arg(long)]
    dry_run: bool,

    /// Prediction log path. Overrides PREDICTION_LOG_PATH.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let tz = settings.market_timezone_or_default();
    let date = us_market::resolve_run_date(args.as_of_date.as_deref(), tz, chrono::Utc::now())?;
    if !us_market::is_trading_day(date) {
        tracing::warn!(%date, "not a trading day; running anyway");
    }

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("briefing_run", %run_id, %date, dry_run = args.dry_run);
    run(&settings, &args, date).instrument(span).await;
    Ok(())
}

async fn run(settings: &Settings, args: &Args, date: chrono::NaiveDate) {
    let quotes = pipeline::gather_quotes().await;
    let headlines = pipeline::gather_headlines(settings).await;
    let news = pipeline::classify(settings, headlines).await;

    let (briefing, sentiment_score) = pipeline::build_briefing(date, quotes, news);
    tracing::info!(
        sentiment_score,
        direction = %briefing.direction.label(),
        headlines = briefing.news.len(),
        "briefing ready"
    );
    println!("{}", briefing.render_text());

    if args.dry_run {
        tracing::info!("dry run: skipping prediction log and email");
        return;
    }

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| settings.prediction_log_path());
    let log = PredictionLog::new(log_path);
    let record = pipeline::prediction_record(&briefing, sentiment_score);
    match log.append(&record) {
        Ok(()) => tracing::info!(path = %log.path().display(), "prediction logged"),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "failed to log prediction");
        }
    }

    let sent = async {
        let cfg = EmailConfig::from_settings(settings)?;
        send_briefing(&cfg, &briefing).await
    }
    .await;
    if let Err(err) = sent {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "briefing email failed");
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
