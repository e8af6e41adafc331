//! Bearer token verification with HMAC-SHA256
//!
//! Tokens are `base64url(payload).signature` where the signature is an
//! HMAC-SHA256 over the encoded payload, issued by the identity service
//! that shares the secret. Verification never branches on signature
//! content before the constant-time compare.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

use reelgate_types::{Role, UserId};

/// Token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    /// User ID
    pub user_id: String,
    /// User email
    pub email: String,
    /// Role (user or admin)
    pub role: String,
    /// Issue timestamp (milliseconds)
    pub issued: i64,
    /// Expiration timestamp (milliseconds)
    pub expires: i64,
}

impl TokenPayload {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires
    }

    /// Parse the user ID
    pub fn user_id(&self) -> Option<UserId> {
        uuid::Uuid::parse_str(&self.user_id).map(UserId).ok()
    }

    /// Parse the role, defaulting to the unprivileged one
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }
}

/// Token verification failure
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// Verifies HMAC-signed bearer tokens
#[derive(Clone)]
pub struct TokenVerifier {
    key_bytes: Arc<[u8]>,
}

impl TokenVerifier {
    /// Minimum allowed secret length in bytes (256 bits)
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a verifier.
    ///
    /// # Panics
    /// Panics if the secret is shorter than 32 bytes; config validation
    /// rejects short secrets before this runs.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        assert!(
            secret.len() >= Self::MIN_SECRET_LENGTH,
            "token secret must be at least 32 bytes"
        );
        Self {
            key_bytes: Arc::from(secret),
        }
    }

    /// Verify a bearer token and return its payload
    pub fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let parts: Vec<&str> = token.rsplitn(2, '.').collect();
        if parts.len() != 2 {
            return Err(TokenError::Invalid);
        }
        let (signature, payload_b64) = (parts[0], parts[1]);

        let expected = self.compute_signature(payload_b64);
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            tracing::debug!("token signature mismatch");
            return Err(TokenError::Invalid);
        }

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Invalid)?;
        let payload: TokenPayload =
            serde_json::from_slice(&payload_json).map_err(|_| TokenError::Invalid)?;

        if payload.is_expired() {
            return Err(TokenError::Expired);
        }
        Ok(payload)
    }

    /// Sign a payload into a token. The service only verifies; this
    /// exists for tests and local tooling.
    pub fn sign(&self, payload: &TokenPayload) -> String {
        let payload_json = serde_json::to_vec(payload).expect("payload serializes");
        let payload_b64 = URL_SAFE_NO_PAD.encode(&payload_json);
        let signature = self.compute_signature(&payload_b64);
        format!("{payload_b64}.{signature}")
    }

    fn compute_signature(&self, data: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key_bytes)
            .expect("HMAC accepts any key length");
        mac.update(data.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key_length", &self.key_bytes.len())
            .finish_non_exhaustive()
    }
}

/// Constant-time byte slice comparison.
///
/// Compares all bytes even after finding a difference so timing depends
/// only on length, which is not secret.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let result = a
        .iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new("test-secret-at-least-32-bytes-long!!")
    }

    fn payload(role: &str, expires_offset_ms: i64) -> TokenPayload {
        let now = Utc::now().timestamp_millis();
        TokenPayload {
            user_id: uuid::Uuid::new_v4().to_string(),
            email: "viewer@example.com".to_string(),
            role: role.to_string(),
            issued: now,
            expires: now + expires_offset_ms,
        }
    }

    #[test]
    fn test_roundtrip() {
        let v = verifier();
        let token = v.sign(&payload("user", 60_000));
        let parsed = v.verify(&token).unwrap();
        assert_eq!(parsed.email, "viewer@example.com");
        assert_eq!(parsed.role(), Role::User);
        assert!(parsed.user_id().is_some());
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let v = verifier();
        let mut token = v.sign(&payload("user", 60_000));
        let last = token.pop().unwrap();
        token.push(if last == 'a' { 'b' } else { 'a' });
        assert!(matches!(v.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let v = verifier();
        let token = v.sign(&payload("user", 60_000));
        let signature = token.rsplitn(2, '.').next().unwrap().to_string();

        // Re-sign nothing: swap in an admin payload with the old signature
        let evil = serde_json::to_vec(&payload("admin", 60_000)).unwrap();
        let evil_b64 = URL_SAFE_NO_PAD.encode(&evil);
        let forged = format!("{evil_b64}.{signature}");
        assert!(matches!(v.verify(&forged), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = TokenVerifier::new("first-secret-thats-32-bytes-long!!!!");
        let other = TokenVerifier::new("other-secret-thats-32-bytes-long!!!!");
        let token = signer.sign(&payload("user", 60_000));
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let v = verifier();
        let token = v.sign(&payload("user", -1_000));
        assert!(matches!(v.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let v = verifier();
        assert!(matches!(v.verify("nodots"), Err(TokenError::Invalid)));
        assert!(matches!(
            v.verify("!!!invalid!!!.sig"),
            Err(TokenError::Invalid)
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"not json");
        assert!(matches!(
            v.verify(&format!("{not_json}.sig")),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_unknown_role_defaults_to_user() {
        let v = verifier();
        let token = v.sign(&payload("superuser", 60_000));
        assert_eq!(v.verify(&token).unwrap().role(), Role::User);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc123", b"abc123"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"abc123", b"xyz789"));
        assert!(constant_time_eq(b"", b""));
    }
}
