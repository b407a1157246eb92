use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Which route set the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// Full registry API under /files.
    Rest,
    /// Flat route set (/listfiles, /files/{id}, /addfile) backed directly by
    /// the blob store and publisher -- a simplified deployment topology.
    Flat,
}

#[derive(Debug, Clone)]
pub enum PublisherBackend {
    Log,
    Webhook,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Directory holding the embedded metadata database.
    pub data_dir: String,
    /// Directory for the local blob store backend.
    pub blob_storage_path: String,
    pub api_flavor: ApiFlavor,
    /// In flat mode, whether deletes address blobs by local file name rather
    /// than remote blob name.
    pub flat_local_names: bool,
    pub publisher: PublisherConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub backend: PublisherBackend,
    /// Topic name stamped on every published event.
    pub topic: String,
    /// Delivery endpoint (required when backend is webhook)
    pub webhook_url: Option<String>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            backend: PublisherBackend::Log,
            topic: "file-events".to_string(),
            webhook_url: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let blob_storage_path =
            std::env::var("BLOB_STORAGE_PATH").unwrap_or_else(|_| "./blobs".to_string());

        let api_flavor = match std::env::var("API_FLAVOR")
            .unwrap_or_else(|_| "rest".to_string())
            .to_lowercase()
            .as_str()
        {
            "flat" => ApiFlavor::Flat,
            _ => ApiFlavor::Rest,
        };

        let flat_local_names = std::env::var("FLAT_LOCAL_NAMES")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let publisher_backend = match std::env::var("PUBLISHER_BACKEND")
            .unwrap_or_else(|_| "log".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => PublisherBackend::Webhook,
            _ => PublisherBackend::Log,
        };

        let topic = std::env::var("EVENT_TOPIC").unwrap_or_else(|_| "file-events".to_string());

        let webhook_url = std::env::var("WEBHOOK_URL").ok();

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let config = Config {
            bind_address,
            data_dir,
            blob_storage_path,
            api_flavor,
            flat_local_names,
            publisher: PublisherConfig {
                backend: publisher_backend,
                topic,
                webhook_url,
            },
            test_mode,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.publisher.topic.is_empty() {
            return Err(ConfigError::ValidationError(
                "EVENT_TOPIC cannot be empty".to_string(),
            ));
        }

        if matches!(self.publisher.backend, PublisherBackend::Webhook)
            && self.publisher.webhook_url.is_none()
        {
            return Err(ConfigError::ValidationError(
                "WEBHOOK_URL is required when PUBLISHER_BACKEND=webhook".to_string(),
            ));
        }

        Ok(())
    }
}
