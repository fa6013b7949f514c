//! Unit tests for bearer token verification.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    use chrono::{Duration, Utc};

    use crate::auth::Claims;
    use crate::error::AppError;
    use crate::jwt::{JwtError, TokenVerifier, VerifierConfig};
    use crate::testing::{
        expired_token_for, forged_token_for, sign_claims, sign_with_kid, test_jwks, test_verifier,
        token_for,
    };

    #[tokio::test]
    async fn test_valid_token_yields_subject() {
        let verifier = test_verifier();
        let token = token_for("auth0|user-1");

        let claims = verifier.verify(&token).await.unwrap();

        assert_eq!(claims.user_id(), "auth0|user-1");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let verifier = test_verifier();
        let result = verifier.verify(&expired_token_for("auth0|user-1")).await;
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[tokio::test]
    async fn test_token_signed_by_other_key_is_rejected() {
        let verifier = test_verifier();
        let result = verifier.verify(&forged_token_for("auth0|user-1")).await;
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_token_without_kid_is_rejected() {
        let verifier = test_verifier();
        let claims = Claims::new("auth0|user-1", Utc::now() + Duration::hours(1));
        let result = verifier.verify(&sign_with_kid(&claims, None)).await;
        assert!(matches!(result, Err(JwtError::MissingKeyId)));
    }

    #[tokio::test]
    async fn test_token_with_unknown_kid_is_rejected() {
        let verifier = test_verifier();
        let claims = Claims::new("auth0|user-1", Utc::now() + Duration::hours(1));
        let result = verifier.verify(&sign_with_kid(&claims, Some("rotated"))).await;
        assert!(matches!(result, Err(JwtError::UnknownKey(kid)) if kid == "rotated"));
    }

    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let verifier = test_verifier();
        let result = verifier.verify("invalid.token.here").await;
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_issuer_is_checked_when_configured() {
        let verifier =
            TokenVerifier::from_jwks(test_jwks(), None, Some("https://tenant.example.com/"));

        let wrong = Claims::new("auth0|user-1", Utc::now() + Duration::hours(1))
            .with_issuer("https://evil.example.com/");
        assert!(verifier.verify(&sign_claims(&wrong)).await.is_err());

        let right = Claims::new("auth0|user-1", Utc::now() + Duration::hours(1))
            .with_issuer("https://tenant.example.com/");
        assert!(verifier.verify(&sign_claims(&right)).await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_key_set_is_external_failure() {
        // Nothing listens on port 9 on localhost.
        let config = VerifierConfig::for_domain("localhost")
            .with_jwks_url("http://127.0.0.1:9/.well-known/jwks.json")
            .with_cache_ttl(StdDuration::from_secs(1));
        let verifier = TokenVerifier::new(config);

        let err = verifier.verify(&token_for("auth0|user-1")).await.unwrap_err();

        assert!(matches!(err, JwtError::KeySet(_)));
        assert_eq!(AppError::from(err).status_code(), 500);
    }

    /// Serves the test key set on a local port and counts the requests.
    async fn serve_counting_jwks() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = axum::Router::new().route(
            "/.well-known/jwks.json",
            axum::routing::get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    axum::Json(test_jwks())
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/.well-known/jwks.json"), hits)
    }

    #[tokio::test]
    async fn test_remote_key_set_is_cached() {
        let (url, hits) = serve_counting_jwks().await;
        let verifier = TokenVerifier::new(VerifierConfig::for_domain("localhost").with_jwks_url(url));

        for _ in 0..3 {
            let claims = verifier.verify(&token_for("auth0|user-1")).await.unwrap();
            assert_eq!(claims.user_id(), "auth0|user-1");
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_kids_refetch_at_most_once_per_interval() {
        let (url, hits) = serve_counting_jwks().await;
        let verifier = TokenVerifier::new(
            VerifierConfig::for_domain("localhost")
                .with_jwks_url(url)
                .with_min_refetch_interval(StdDuration::from_secs(60)),
        );
        let claims = Claims::new("auth0|user-1", Utc::now() + Duration::hours(1));

        for i in 0..20 {
            let kid = format!("bogus-{i}");
            let result = verifier.verify(&sign_with_kid(&claims, Some(&kid))).await;
            assert!(matches!(result, Err(JwtError::UnknownKey(k)) if k == kid));
        }

        // One initial fetch plus a single refetch for the first unknown kid.
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // The cached key set still serves valid tokens.
        verifier.verify(&token_for("auth0|user-1")).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_config_for_domain_builds_well_known_url() {
        let config = VerifierConfig::for_domain("dev-tenant.us.auth0.com/");
        assert_eq!(
            config.jwks_url,
            "https://dev-tenant.us.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(config.cache_ttl, VerifierConfig::DEFAULT_CACHE_TTL);
        assert_eq!(
            config.min_refetch_interval,
            VerifierConfig::DEFAULT_MIN_REFETCH_INTERVAL
        );
        assert!(config.audience.is_none());
    }

    #[test]
    fn test_token_errors_map_to_unauthorized() {
        assert_eq!(AppError::from(JwtError::Expired).status_code(), 401);
        assert_eq!(AppError::from(JwtError::MissingKeyId).status_code(), 401);
        assert_eq!(
            AppError::from(JwtError::Invalid("bad".into())).status_code(),
            401
        );
    }
}
