//! Storage configuration types.

use todo_shared::config::{StorageProvider, StorageSettings};

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Presigned upload URL TTL in seconds (default: 300 = 5 minutes).
    pub presign_upload_ttl_secs: u64,
    /// Base URL attachments are retrieved from. Defaults to the provider's object URL.
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Default upload TTL: 5 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 300;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            public_base_url: None,
        }
    }

    /// Create a storage config from the application settings.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let mut config =
            Self::new(settings.provider.clone()).with_upload_ttl(settings.upload_ttl_secs);
        if let Some(base) = &settings.public_base_url {
            config = config.with_public_base_url(base.clone());
        }
        config
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set the public base URL for attachment retrieval.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Base URL attachment retrieval URLs are built from, without trailing slash.
    #[must_use]
    pub fn attachment_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.provider.object_base_url(),
        }
    }
}
