use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use stockcast_core::backend::HttpPredictionBackend;
use stockcast_core::config::Settings;
use stockcast_core::orchestrator::{FetchStrategy, Orchestrator, PredictionView, QueryError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;
mod trends;

use render::ViewMode;

#[derive(Debug, Parser)]
#[command(name = "stockcast", about = "Stock price forecasts and market trends")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forecast, market insights and analysis for one ticker
    Predict(PredictArgs),
    /// Sector and index overview
    Trends(TrendsArgs),
}

#[derive(Debug, clap::Args)]
struct PredictArgs {
    /// Ticker symbol, e.g. AAPL. Case and surrounding whitespace are ignored.
    symbol: String,

    #[arg(long, value_enum, default_value_t = ViewMode::Chart)]
    view: ViewMode,

    /// sequential | concurrent. Overrides PREDICTION_FETCH_STRATEGY.
    #[arg(long)]
    strategy: Option<FetchStrategy>,

    /// Prediction service base URL. Overrides PREDICTION_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Per-call timeout in seconds. Overrides PREDICTION_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the view model as JSON instead of rendering it.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, clap::Args)]
struct TrendsArgs {
    /// Market trends API base URL. Overrides MARKET_TRENDS_URL.
    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Predict(a) => predict(settings, a).await,
        Command::Trends(a) => market_trends(settings, a).await,
    }
}

async fn predict(mut settings: Settings, args: PredictArgs) -> anyhow::Result<ExitCode> {
    if let Some(strategy) = args.strategy {
        settings.fetch_strategy = strategy;
    }
    if let Some(url) = args.api_url {
        settings.prediction_api_url = url;
    }
    if let Some(secs) = args.timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout-secs must be > 0");
        settings.request_timeout = Duration::from_secs(secs);
    }

    let backend = HttpPredictionBackend::from_settings(&settings)?;
    let orchestrator = Orchestrator::new(backend).with_strategy(settings.fetch_strategy);

    // Single submission per process; nothing can supersede it.
    let Some(view) = orchestrator.submit(&args.symbol).await else {
        anyhow::bail!("prediction query was superseded");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", render::prediction(&view, args.view));
    }

    if let Some(QueryError::Fetch(err)) = view.error() {
        sentry_anyhow::capture_anyhow(&anyhow::Error::new(err.clone()));
    }

    Ok(if rejected_input(&view) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Only invalid input fails the process; fetch errors are rendered and exit 0.
fn rejected_input(view: &PredictionView) -> bool {
    matches!(view.error(), Some(QueryError::Validation))
}

async fn market_trends(settings: Settings, args: TrendsArgs) -> anyhow::Result<ExitCode> {
    let base_url = args.url.unwrap_or(settings.market_trends_url);

    match trends::fetch(&base_url, settings.request_timeout).await {
        Ok(t) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&t)?);
            } else {
                println!("{}", render::trends(&t));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(%base_url, error = %format!("{err:#}"), "market trends fetch failed");
            eprintln!("{}", trends::LOAD_FAILED_MESSAGE);
            Ok(ExitCode::FAILURE)
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_flags() {
        let args = Args::try_parse_from([
            "stockcast",
            "predict",
            " aapl ",
            "--view",
            "table",
            "--strategy",
            "concurrent",
            "--json",
        ])
        .unwrap();
        match args.command {
            Command::Predict(p) => {
                assert_eq!(p.symbol, " aapl ");
                assert_eq!(p.view, ViewMode::Table);
                assert_eq!(p.strategy, Some(FetchStrategy::Concurrent));
                assert!(p.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn predict_defaults_to_chart_view() {
        let args = Args::try_parse_from(["stockcast", "predict", "msft"]).unwrap();
        match args.command {
            Command::Predict(p) => {
                assert_eq!(p.view, ViewMode::Chart);
                assert!(p.strategy.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_strategy() {
        assert!(Args::try_parse_from(["stockcast", "predict", "msft", "--strategy", "parallel"]).is_err());
    }

    #[test]
    fn parses_trends_url() {
        let args = Args::try_parse_from(["stockcast", "trends", "--url", "http://localhost:3001"]).unwrap();
        match args.command {
            Command::Trends(t) => assert_eq!(t.url.as_deref(), Some("http://localhost:3001")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_symbol_is_rejected_before_any_call() {
        // Nothing listens here; validation must fail before a request is made.
        let backend = HttpPredictionBackend::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let view = Orchestrator::new(backend).submit("   ").await.unwrap();
        assert!(rejected_input(&view));
    }

    #[test]
    fn fetch_errors_do_not_fail_the_process() {
        use stockcast_core::backend::{FetchError, FetchErrorKind, FetchStage};
        use stockcast_core::orchestrator::QueryPhase;

        let mut view = PredictionView::idle();
        view.phase = QueryPhase::Errored(QueryError::Fetch(FetchError::new(
            FetchStage::Forecast,
            FetchErrorKind::Connectivity,
        )));
        assert!(!rejected_input(&view));

        view.phase = QueryPhase::Settled;
        assert!(!rejected_input(&view));
    }
}
