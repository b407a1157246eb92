use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_registry::{
    blob_store::{BlobStore, LocalBlobStore},
    config::{Config, PublisherBackend},
    metadata_store::{MetadataStore, RedbMetadataStore},
    publisher::{LogPublisher, Publisher, WebhookPublisher},
    registry::FileRegistry,
    AppState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "file-registry starting");

    // Load configuration
    let config = Config::load()?;

    // Initialize the metadata store
    let metadata_store: Arc<dyn MetadataStore> =
        Arc::new(RedbMetadataStore::open(&config.data_dir)?);
    info!("Metadata store opened at: {}", config.data_dir);

    // Initialize the blob store backend
    let blob_store: Arc<dyn BlobStore> =
        Arc::new(LocalBlobStore::new(&config.blob_storage_path)?);
    info!("Using local blob storage at: {}", config.blob_storage_path);

    // Initialize the event publisher
    let publisher: Arc<dyn Publisher> = match config.publisher.backend {
        PublisherBackend::Log => {
            info!("Using log publisher for file events");
            Arc::new(LogPublisher)
        }
        PublisherBackend::Webhook => {
            let url = config
                .publisher
                .webhook_url
                .as_deref()
                .expect("WEBHOOK_URL validated in config");
            info!("Using webhook publisher, endpoint: {}", url);
            Arc::new(WebhookPublisher::new(url)?)
        }
    };

    let registry = FileRegistry::new(
        Arc::clone(&blob_store),
        Arc::clone(&metadata_store),
        Arc::clone(&publisher),
        config.publisher.topic.clone(),
    );

    // Create shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        registry,
        blob_store,
        metadata_store,
        publisher,
    });

    // Build and start the HTTP server
    let app = file_registry::api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on: {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
