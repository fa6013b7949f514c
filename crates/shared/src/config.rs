//! Application configuration management.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::jwt::VerifierConfig;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Item store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Auth provider configuration.
    pub auth: AuthConfig,
    /// Blob store configuration.
    pub storage: StorageSettings,
    /// Static values handed to the front-end.
    #[serde(default)]
    pub client: Option<ClientConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL. Todos are kept in memory when unset.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Auth provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Auth provider domain, e.g. `dev-tenant.us.auth0.com`.
    pub domain: String,
    /// Expected token audience.
    #[serde(default)]
    pub audience: Option<String>,
    /// Expected token issuer.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Key set URL, defaults to the domain's well-known location.
    #[serde(default)]
    pub jwks_url: Option<String>,
    /// Key set cache lifetime in seconds.
    #[serde(default = "default_jwks_cache_ttl")]
    pub jwks_cache_ttl_secs: u64,
    /// Minimum seconds between key set refetches caused by an unknown key id.
    #[serde(default = "default_jwks_min_refetch")]
    pub jwks_min_refetch_secs: u64,
}

fn default_jwks_cache_ttl() -> u64 {
    600 // 10 minutes
}

fn default_jwks_min_refetch() -> u64 {
    30
}

impl AuthConfig {
    /// Builds the token verifier configuration.
    #[must_use]
    pub fn verifier_config(&self) -> VerifierConfig {
        let mut config = VerifierConfig::for_domain(&self.domain)
            .with_cache_ttl(Duration::from_secs(self.jwks_cache_ttl_secs))
            .with_min_refetch_interval(Duration::from_secs(self.jwks_min_refetch_secs));
        if let Some(url) = &self.jwks_url {
            config = config.with_jwks_url(url.clone());
        }
        if let Some(audience) = &self.audience {
            config = config.with_audience(audience.clone());
        }
        if let Some(issuer) = &self.issuer {
            config = config.with_issuer(issuer.clone());
        }
        config
    }
}

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: AWS S3, Cloudflare R2, MinIO
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider (AWS S3, Cloudflare R2, MinIO).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }

    /// URL objects in the bucket are addressed under, without trailing slash.
    #[must_use]
    pub fn object_base_url(&self) -> String {
        match self {
            Self::S3 {
                endpoint, bucket, ..
            } => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
            Self::AzureBlob {
                account, container, ..
            } => format!("https://{account}.blob.core.windows.net/{container}"),
            Self::LocalFs { root } => {
                format!("file://{}", root.display().to_string().trim_end_matches('/'))
            }
        }
    }
}

/// Blob store settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage provider.
    pub provider: StorageProvider,
    /// Presigned upload URL TTL in seconds.
    #[serde(default = "default_upload_ttl")]
    pub upload_ttl_secs: u64,
    /// Base URL attachments are served from, defaults to the provider's object URL.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

fn default_upload_ttl() -> u64 {
    300 // 5 minutes
}

/// Front-end configuration served to browsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ClientConfig {
    /// Public base URL of this API.
    pub api_endpoint: String,
    /// Auth provider application client id.
    pub client_id: String,
    /// Where the auth provider redirects after login.
    pub callback_url: String,
    /// Auth provider domain, defaults to `auth.domain`.
    #[serde(default)]
    pub auth_domain: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TODO").separator("__"))
            .build()?;

        config.try_deserialize().map(Self::with_client_defaults)
    }

    /// Fills client settings that fall back to other sections.
    #[must_use]
    pub fn with_client_defaults(mut self) -> Self {
        if let Some(client) = &mut self.client {
            client
                .auth_domain
                .get_or_insert_with(|| self.auth.domain.clone());
        }
        self
    }
}
