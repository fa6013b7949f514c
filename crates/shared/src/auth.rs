//! Authentication types for bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token issued by the auth provider.
///
/// Only the claims the backend reads are modelled; anything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the opaque identity of the caller, used as the owner of todos.
    pub sub: String,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a subject.
    #[must_use]
    pub fn new(subject: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.into(),
            iss: None,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Sets the issuer claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    /// Returns the caller identity from claims.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}
