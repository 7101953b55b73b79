use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promoscout_core::llm::gemini::GeminiClient;
use promoscout_core::llm::reply_file::ReplyFileSource;
use promoscout_core::llm::PromotionSource;
use promoscout_core::store::dashboard::{Dashboard, RefreshOutcome};
use promoscout_core::view::{DashboardView, Tab};

mod render;

#[derive(Debug, Parser)]
#[command(name = "promoscout_scan")]
struct Args {
    /// Platform tab to show: All, Traveloka, Trip.com, Agoda, Booking.com or AirAsia.
    #[arg(long, default_value = "All")]
    tab: Tab,

    /// Print the dashboard view as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Parse a saved model reply (raw text or a full generateContent response) instead of
    /// calling the API.
    #[arg(long)]
    reply_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = promoscout_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let display_offset =
        promoscout_core::time::clock::display_offset(settings.display_utc_offset_minutes)?;

    let source: Box<dyn PromotionSource> = match &args.reply_file {
        Some(path) => Box::new(ReplyFileSource::new(path)),
        None => Box::new(GeminiClient::from_settings(&settings)?),
    };

    let dashboard = Dashboard::new();
    match dashboard.refresh(source.as_ref()).await {
        Ok(RefreshOutcome::Updated {
            promotions,
            sources,
        }) => {
            tracing::info!(source = source.name(), promotions, sources, "scan complete");
        }
        Ok(RefreshOutcome::Busy) => anyhow::bail!("another scan is already running"),
        Err(err) => {
            let banner = err.user_message();
            let err = anyhow::Error::new(err).context("scan failed");
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "scan failed");
            eprintln!("Connection Error: {banner}");
            return Err(err);
        }
    }

    let snapshot = dashboard.snapshot().await;
    let view = DashboardView::build(&snapshot, args.tab, display_offset);

    if args.json {
        let out = serde_json::to_string_pretty(&view).context("failed to encode dashboard view")?;
        println!("{out}");
    } else {
        print!("{}", render::render_text(&view));
    }

    Ok(())
}

fn init_sentry(settings: &promoscout_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
