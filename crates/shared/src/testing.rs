//! Test key material and token signing.
//!
//! The fixtures are a throwaway RSA key pair generated for tests only.

use chrono::{Duration, Utc};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

use crate::auth::Claims;
use crate::jwt::TokenVerifier;

/// Key id of the test signing key published in [`test_jwks`].
pub const TEST_KEY_ID: &str = "test-key-1";

const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/test_rsa.pem");
const OTHER_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/test_rsa_other.pem");
const TEST_JWKS: &str = include_str!("../fixtures/test_jwks.json");

/// Key set containing the public half of the test signing key.
#[must_use]
pub fn test_jwks() -> JwkSet {
    serde_json::from_str(TEST_JWKS).expect("test key set fixture is valid JSON")
}

/// Verifier trusting only the test signing key, with no audience or issuer checks.
#[must_use]
pub fn test_verifier() -> TokenVerifier {
    TokenVerifier::from_jwks(test_jwks(), None, None)
}

/// Signs claims with the test key.
#[must_use]
pub fn sign_claims(claims: &Claims) -> String {
    sign_with(claims, TEST_PRIVATE_KEY, Some(TEST_KEY_ID))
}

/// Signs a one hour token for `subject` with the test key.
#[must_use]
pub fn token_for(subject: &str) -> String {
    sign_claims(&Claims::new(subject, Utc::now() + Duration::hours(1)))
}

/// Signs a token that expired an hour ago.
#[must_use]
pub fn expired_token_for(subject: &str) -> String {
    sign_claims(&Claims::new(subject, Utc::now() - Duration::hours(1)))
}

/// Signs a token with a key that is not in the test key set but claims its key id.
#[must_use]
pub fn forged_token_for(subject: &str) -> String {
    let claims = Claims::new(subject, Utc::now() + Duration::hours(1));
    sign_with(&claims, OTHER_PRIVATE_KEY, Some(TEST_KEY_ID))
}

/// Signs claims with the test key under an arbitrary (or no) key id.
#[must_use]
pub fn sign_with_kid(claims: &Claims, kid: Option<&str>) -> String {
    sign_with(claims, TEST_PRIVATE_KEY, kid)
}

fn sign_with(claims: &Claims, pem: &[u8], kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(String::from);
    let key = EncodingKey::from_rsa_pem(pem).expect("test private key fixture is valid PEM");
    encode(&header, claims, &key).expect("test token signs")
}
