use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preopen_core::config::Settings;
use preopen_core::quotes::InvestingQuoteClient;
use preopen_core::reconcile::{reconcile_log, ReconcileOutcome};
use preopen_core::storage::prediction_log::PredictionLog;
use preopen_core::time::us_market;

#[derive(Debug, Parser)]
#[command(name = "preopen_reconciler", about = "Fill in today's realized outcomes in the prediction log")]
struct Args {
    /// Prediction log path. Overrides PREDICTION_LOG_PATH.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Date to reconcile (YYYY-MM-DD). Defaults to today in MARKET_TIMEZONE.
    #[arg(long)]
    today: Option<String>,
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
    let today = us_market::resolve_run_date(args.today.as_deref(), tz, chrono::Utc::now())?;
    let log = PredictionLog::new(
        args.log_file
            .clone()
            .unwrap_or_else(|| settings.prediction_log_path()),
    );
    tracing::info!(%today, %tz, path = %log.path().display(), "reconciling predictions");

    let quotes = match InvestingQuoteClient::from_env() {
        Ok(q) => q,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "quote client unavailable; nothing reconciled");
            return Ok(());
        }
    };

    match reconcile_log(&log, today, &quotes).await {
        Ok(ReconcileOutcome::NothingPending) => {}
        Ok(ReconcileOutcome::CloseUnavailable { pending }) => {
            tracing::warn!(pending, "SPX close unavailable; log left unchanged, safe to re-run");
        }
        Ok(ReconcileOutcome::Updated { close, summary }) => {
            tracing::info!(
                close,
                updated = summary.updated,
                unparseable_open = summary.unparseable_open,
                "updated predictions with actual close"
            );
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "reconciliation failed; log left unchanged");
        }
    }

    Ok(())
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
