use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use std::sync::{Arc, RwLock};

/// The caller's identity as derived from the held credential.
///
/// Advisory only: it drives owner-gated UI controls and local permission
/// checks, never an authorization decision the server would trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    id: String,
}

/// Shared session provider with an explicit lifecycle: the token is set on
/// login, cleared on logout, and read through this handle everywhere else.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap() = None;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.token().as_deref().and_then(decode_identity)
    }

    pub fn user_id(&self) -> Option<String> {
        self.identity().map(|identity| identity.id)
    }
}

/// Decodes the payload segment of a bearer credential into an [`Identity`].
///
/// The decode is typed and fails closed: a token with a missing payload
/// segment, undecodable base64, a non-JSON payload, or a payload without a
/// non-empty `id` field yields no identity. The signature is not verified.
pub fn decode_identity(token: &str) -> Option<Identity> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD.decode(payload))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    if claims.id.is_empty() {
        return None;
    }
    Some(Identity { id: claims.id })
}
