use anyhow::Context;
use clap::Parser;
use fortune_core::predictor::{FortunePredictor, PredictError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fortune_cli")]
struct Args {
    /// Person's name.
    #[arg(long)]
    name: String,

    /// Birthdate (YYYY-MM-DD).
    #[arg(long)]
    birthdate: String,

    /// First forecast day (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    start_date: Option<String>,

    /// Skip the external service and use generated forecasts only.
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut settings = fortune_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if args.mock {
        settings.mock_mode = true;
    }

    let predictor = FortunePredictor::from_settings(&settings)?;

    let result = match args.start_date.as_deref() {
        Some(s) => {
            let start = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("--start-date is not YYYY-MM-DD: {s}"))?;
            predictor.predict_on(&args.name, &args.birthdate, start).await
        }
        None => predictor.predict(&args.name, &args.birthdate).await,
    };

    let sequence = match result {
        Ok(sequence) => sequence,
        Err(PredictError::InvalidInput(detail)) => anyhow::bail!("invalid input: {detail}"),
        Err(PredictError::Internal(err)) => {
            sentry_anyhow::capture_anyhow(&err);
            return Err(err.context("fortune prediction failed"));
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&sequence).context("failed to serialize forecast")?
    );
    Ok(())
}

fn init_sentry(settings: &fortune_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
