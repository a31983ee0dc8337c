//! Signed session tokens for client authentication
//!
//! A [SessionToken] carries the authenticated user's id and the issuance timestamp. It is
//! serialized to a string of the form `base64(payload).base64(hmac)` with an HMAC-SHA256
//! signature over the payload, keyed with the application secret. The token is issued at login
//! and sent by the client in the `X-SESSION-TOKEN` header on every request; parsing verifies the
//! signature and the maximum age before the contained user id is trusted.
//!
//! The token only establishes identity. The user's capabilities are re-derived from the database
//! on every request (see [crate::data_store::BoardroomStoreFacade::get_actor_for_session]), so
//! deactivating a user takes effect immediately, without a token revocation mechanism.

use crate::data_store::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::hmac;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    user_id: UserId,
    issued_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The token string is not structured as `payload.signature` or contains invalid
    /// base64/JSON data
    Malformed,
    /// The signature does not match the payload (wrong secret or tampered token)
    InvalidSignature,
    /// The token's issuance timestamp is older than the allowed maximum age or lies in the future
    Expired,
}

impl SessionToken {
    /// Create a fresh token for the given user, issued now.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            issued_at: chrono::Utc::now(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Serialize and sign the token with the application secret.
    pub fn to_string(&self, secret: &str) -> String {
        let payload = serde_json::to_vec(self).expect("SessionToken serialization cannot fail");
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, &payload);
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.as_ref())
        )
    }

    /// Parse a token string, verifying the signature and the maximum token age.
    pub fn from_string(
        token: &str,
        secret: &str,
        max_age: std::time::Duration,
    ) -> Result<Self, SessionError> {
        let (payload_b64, signature_b64) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| SessionError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionError::Malformed)?;

        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        hmac::verify(&key, &payload, &signature).map_err(|_| SessionError::InvalidSignature)?;

        let token: SessionToken =
            serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)?;

        let age = chrono::Utc::now() - token.issued_at;
        if age < chrono::Duration::zero()
            || age > chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX)
        {
            return Err(SessionError::Expired);
        }
        Ok(token)
    }
}
