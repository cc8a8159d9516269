use sentinela::application::handlers::{self, AppState};
use sentinela::application::services::analysis_service::AnalysisService;
use sentinela::application::services::execution_service::ExecutionService;
use sentinela::application::services::monitor_service::MonitorService;
use sentinela::config::AppConfig;
use sentinela::domain::repositories::exchange_client::ExchangeProvider;
use sentinela::domain::repositories::recommendation_model::RecommendationModel;
use sentinela::infrastructure::exchange_client_factory::ExchangeClientFactory;
use sentinela::infrastructure::gemini_client::GeminiClient;
use sentinela::persistence::{init_database, DatabaseConfig};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest request body the API accepts
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinela=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // .env is optional
    if dotenvy::dotenv().is_ok() {
        info!("Loaded environment from .env");
    }

    info!("Sentinela trading service starting...");

    let config = AppConfig::from_env();
    let db_config = DatabaseConfig::from_env();

    let pool = init_database(&db_config.url).await?;

    let factory = Arc::new(ExchangeClientFactory::new(config.http_timeout()));
    let market_data = factory
        .market_data("binance")
        .ok_or("Binance market data client unavailable")?;

    let model: Option<Arc<dyn RecommendationModel>> = match &config.google_api_key {
        Some(key) => match GeminiClient::new(key, &config.gemini_model, config.http_timeout()) {
            Ok(client) => {
                info!("✓ Model client created: {}", config.gemini_model);
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("✗ Failed to create model client, analysis degrades: {}", e);
                None
            }
        },
        None => {
            warn!("GOOGLE_API_KEY not set, analysis degrades to placeholder output");
            None
        }
    };

    let provider: Arc<dyn ExchangeProvider> = factory;
    let state = Arc::new(AppState {
        pool: pool.clone(),
        analysis: AnalysisService::new(pool.clone(), market_data, model),
        execution: ExecutionService::new(pool.clone(), provider.clone()),
        monitor: MonitorService::new(pool.clone(), provider, config.exit_policy()),
    });

    // Background monitor loop; the endpoint can still trigger passes on demand
    if config.monitor_enabled {
        let monitor_state = state.clone();
        let interval = config.monitor_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = monitor_state.monitor.run_pass().await {
                    error!("Monitor pass failed: {}", e);
                }
            }
        });
        info!(
            "Position monitor running every {}s (stop loss {}%, take profit {}%)",
            config.monitor_interval_secs,
            config.stop_loss_threshold_pct,
            config.take_profit_threshold_pct
        );
    } else {
        info!("Position monitor disabled");
    }

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let server = axum::serve(listener, app);
    info!("Listening on {}", config.bind_addr);

    // Set up graceful shutdown
    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Server started successfully. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Server shutting down gracefully...");
    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
