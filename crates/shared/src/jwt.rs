//! Bearer token verification.
//!
//! Access tokens are RS256 JWTs issued by the external auth provider. The
//! public verification keys are published as a JSON Web Key Set at
//! `https://{domain}/.well-known/jwks.json`; the key is selected by the token
//! header's `kid`.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::Claims;
use crate::error::AppError;

/// Token verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// URL of the JSON Web Key Set.
    pub jwks_url: String,
    /// Expected `aud` claim. Audience is not checked when unset.
    pub audience: Option<String>,
    /// Expected `iss` claim. Issuer is not checked when unset.
    pub issuer: Option<String>,
    /// How long a fetched key set is reused before being fetched again.
    pub cache_ttl: Duration,
    /// Minimum time between refetches triggered by an unknown `kid`.
    pub min_refetch_interval: Duration,
}

impl VerifierConfig {
    /// Default key set cache lifetime: 10 minutes.
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

    /// Default minimum interval between unknown-`kid` refetches: 30 seconds.
    pub const DEFAULT_MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

    /// Creates a configuration for an auth provider domain.
    #[must_use]
    pub fn for_domain(domain: &str) -> Self {
        let domain = domain.trim_end_matches('/');
        Self {
            jwks_url: format!("https://{domain}/.well-known/jwks.json"),
            audience: None,
            issuer: None,
            cache_ttl: Self::DEFAULT_CACHE_TTL,
            min_refetch_interval: Self::DEFAULT_MIN_REFETCH_INTERVAL,
        }
    }

    /// Overrides the key set URL.
    #[must_use]
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    /// Sets the expected audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Sets the expected issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the key set cache lifetime.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the minimum interval between unknown-`kid` refetches.
    #[must_use]
    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }
}

/// Errors that can occur while verifying a token.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token header has no `kid`.
    #[error("token header has no key id")]
    MissingKeyId,

    /// No key in the key set matches the token's `kid`.
    #[error("no signing key found for key id '{0}'")]
    UnknownKey(String),

    /// Token is malformed or its signature/claims do not validate.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// The key set could not be fetched or a key could not be used.
    #[error("key set unavailable: {0}")]
    KeySet(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::KeySet(msg) => Self::ExternalService(msg),
            other => Self::Unauthorized(other.to_string()),
        }
    }
}

enum KeySource {
    Static(Arc<JwkSet>),
    Remote {
        url: String,
        client: reqwest::Client,
        cache: Cache<String, Arc<JwkSet>>,
        /// Holds the URL while a refetch happened within the minimum interval.
        refetch_gate: Cache<String, ()>,
    },
}

/// Verifies bearer tokens and extracts their claims.
pub struct TokenVerifier {
    source: KeySource,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            KeySource::Static(_) => "static",
            KeySource::Remote { url, .. } => url.as_str(),
        };
        f.debug_struct("TokenVerifier")
            .field("source", &source)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl TokenVerifier {
    /// Creates a verifier that fetches its keys from the configured key set URL.
    #[must_use]
    pub fn new(config: VerifierConfig) -> Self {
        let validation = build_validation(config.audience.as_deref(), config.issuer.as_deref());
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.cache_ttl)
            .build();
        let refetch_gate = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.min_refetch_interval)
            .build();

        Self {
            source: KeySource::Remote {
                url: config.jwks_url,
                client: reqwest::Client::new(),
                cache,
                refetch_gate,
            },
            validation,
        }
    }

    /// Creates a verifier over a fixed key set.
    #[must_use]
    pub fn from_jwks(jwks: JwkSet, audience: Option<&str>, issuer: Option<&str>) -> Self {
        Self {
            source: KeySource::Static(Arc::new(jwks)),
            validation: build_validation(audience, issuer),
        }
    }

    /// Validates a token's signature and standard claims and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired, `JwtError::KeySet`
    /// if the key set is unreachable, and another variant for any other
    /// malformed or untrusted token.
    pub async fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let header = decode_header(token).map_err(|e| JwtError::Invalid(e.to_string()))?;
        let kid = header.kid.ok_or(JwtError::MissingKeyId)?;

        let jwk = self.find_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| JwtError::KeySet(e.to_string()))?;

        decode::<Claims>(token, &key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }

    async fn find_key(&self, kid: &str) -> Result<Jwk, JwtError> {
        match &self.source {
            KeySource::Static(set) => set
                .find(kid)
                .cloned()
                .ok_or_else(|| JwtError::UnknownKey(kid.to_string())),
            KeySource::Remote {
                url,
                client,
                cache,
                refetch_gate,
            } => {
                let set = load_key_set(url, client, cache).await?;
                if let Some(jwk) = set.find(kid) {
                    return Ok(jwk.clone());
                }

                // The provider may have rotated its keys since the last fetch,
                // but unknown kids refetch at most once per interval.
                let gate = refetch_gate.entry(url.clone()).or_insert(()).await;
                if !gate.is_fresh() {
                    debug!(kid, "Key id not in key set, refetched recently");
                    return Err(JwtError::UnknownKey(kid.to_string()));
                }

                debug!(kid, "Key id not in cached key set, refetching");
                cache.invalidate(url).await;
                let set = load_key_set(url, client, cache).await?;
                set.find(kid)
                    .cloned()
                    .ok_or_else(|| JwtError::UnknownKey(kid.to_string()))
            }
        }
    }
}

async fn load_key_set(
    url: &str,
    client: &reqwest::Client,
    cache: &Cache<String, Arc<JwkSet>>,
) -> Result<Arc<JwkSet>, JwtError> {
    cache
        .try_get_with(url.to_string(), fetch_key_set(client, url))
        .await
        .map_err(|e: Arc<JwtError>| JwtError::KeySet(e.to_string()))
}

async fn fetch_key_set(client: &reqwest::Client, url: &str) -> Result<Arc<JwkSet>, JwtError> {
    debug!(url, "Fetching signing key set");
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| {
            warn!(url, error = %e, "Failed to fetch signing key set");
            JwtError::KeySet(e.to_string())
        })?;

    response
        .json::<JwkSet>()
        .await
        .map(Arc::new)
        .map_err(|e| JwtError::KeySet(e.to_string()))
}

fn build_validation(audience: Option<&str>, issuer: Option<&str>) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }
    if let Some(iss) = issuer {
        validation.set_issuer(&[iss]);
    }
    validation
}
