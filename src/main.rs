use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenvy::dotenv;

use weather_notifier::api::{self, ApiContext};
use weather_notifier::cli::Cli;
use weather_notifier::config::Config;
use weather_notifier::db;
use weather_notifier::error::AppError;
use weather_notifier::logging::init_logging;
use weather_notifier::metrics::AppMetrics;
use weather_notifier::notifier::{EmailDispatcher, EmailSender, ForecastFetcher, WeatherProvider};
use weather_notifier::repository::SubscriberRepository;
use weather_notifier::scheduler::DispatchScheduler;
use weather_notifier::services::mailer::SmtpMailer;
use weather_notifier::services::weather::WeatherApiClient;
use weather_notifier::store::TargetRegistry;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    if let Err(err) = run().await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = Config::from_env().map_err(AppError::Config)?;
    if let Some(port) = cli.port {
        config.app_port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }
    if let Some(weather_url) = cli.weather_url {
        config.weather.base_url = weather_url;
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .map_err(|err| AppError::Database(err.to_string()))?;
    let repository = Arc::new(SubscriberRepository::new(pool));

    // The registry must be seeded before the listener accepts traffic;
    // a failed load keeps the process from starting at all.
    let registry = Arc::new(TargetRegistry::new());
    let subscribers = repository
        .get_confirmed()
        .await
        .map_err(|err| AppError::Database(format!("failed to load dispatch targets: {err}")))?;
    tracing::info!("loaded {} dispatch targets", subscribers.len());
    registry.load_all(subscribers).await;

    let weather: Arc<dyn WeatherProvider> = Arc::new(WeatherApiClient::new(
        config.weather.base_url.clone(),
        config.weather.api_key.clone(),
    ));
    let mailer: Arc<dyn EmailSender> =
        Arc::new(SmtpMailer::new(&config.smtp).map_err(|err| AppError::Startup(err.to_string()))?);

    let metrics =
        Arc::new(AppMetrics::new().map_err(|err| AppError::Startup(err.to_string()))?);

    let scheduler = DispatchScheduler::new(
        Arc::clone(&registry),
        ForecastFetcher::new(Arc::clone(&weather)),
        EmailDispatcher::new(Arc::clone(&mailer)),
        Arc::clone(&metrics),
    );
    scheduler.start().await;

    let context = Arc::new(ApiContext {
        repository,
        registry,
        weather,
        mailer,
    });
    let app = api::router(context, metrics);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Startup(err.to_string()))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Startup(err.to_string()))?;

    scheduler.stop().await;
    tracing::info!("server exited cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("shutdown signal received");
}
