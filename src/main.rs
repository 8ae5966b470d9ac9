use std::sync::Arc;
use std::time::Duration;

use tokenvision::api::router::create_router;
use tokenvision::config::AppConfig;
use tokenvision::db::{self, InMemoryUserStore, PgUserStore, UserStore};
use tokenvision::vision::{ImageClassifier, ImageFetcher, LabelIndex, TfServingBackend};
use tokenvision::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // sqlx and reqwest both pull in rustls; pin the provider once.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = tokenvision::metrics::init_metrics()?;

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::init_pool(url).await?;
            tracing::info!("Database connected, migrations applied");
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set — using in-memory user store, data is lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    // --- Classifier: loaded once, shared by every request ---
    let labels = LabelIndex::load(&config.labels_path)?;
    let inference_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.inference_timeout_secs))
        .build()?;
    let backend = TfServingBackend::new(inference_http, &config.model_server_url, &config.model_name);
    tracing::info!(
        predict_url = %backend.predict_url(),
        classes = labels.len(),
        "Classifier configured"
    );
    let classifier = Arc::new(ImageClassifier::new(Arc::new(backend), labels));

    let fetch_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .build()?;
    let fetcher = ImageFetcher::new(fetch_http, config.max_image_bytes);

    if config.allow_negative_refill {
        tracing::info!("Negative refills are permitted (ALLOW_NEGATIVE_REFILL=true)");
    }

    let state = AppState::new(config, store, fetcher, classifier, metrics_handle)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
