use base64::prelude::BASE64_STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::models::session::SessionId;

pub const SESSION_TOKEN_LEN: usize = 32;
const SESSION_ID_LEN: usize = 16;

pub type SessionToken = [u8; SESSION_TOKEN_LEN];
pub type SessionTokenHash = [u8; 32];

pub fn generate_session_token() -> SessionToken {
    let mut token = [0u8; SESSION_TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut token);
    token
}

pub fn hash_session_token(token: &[u8]) -> SessionTokenHash {
    Sha256::digest(token).into()
}

/// Constant time comparison of a presented token against a stored hash.
pub fn token_matches(token: &[u8], stored_hash: &[u8]) -> bool {
    let hash = hash_session_token(token);
    hash[..].ct_eq(stored_hash).into()
}

pub fn pack_session_id_and_token(session_id: &SessionId, token: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(SESSION_ID_LEN + token.len());
    packed.extend_from_slice(session_id.as_bytes());
    packed.extend_from_slice(token);
    packed
}

pub fn unpack_session_id_and_token(packed: &[u8]) -> Option<(SessionId, SessionToken)> {
    if packed.len() != SESSION_ID_LEN + SESSION_TOKEN_LEN {
        return None;
    }
    let (sid, token) = packed.split_at(SESSION_ID_LEN);
    let sid = SessionId::from_slice(sid).ok()?;
    let token = SessionToken::try_from(token).ok()?;
    Some((sid, token))
}

/// Decodes the base64 wire form handed out in [`TokenExchangePayload`].
pub fn decode_token(encoded: &str) -> Option<(SessionId, SessionToken)> {
    let packed = BASE64.decode(encoded).ok()?;
    unpack_session_id_and_token(&packed)
}

/// Freshly generated token pair for a session, raw values are only ever
/// handed to the client.
pub struct IssuedTokens {
    pub refresh_token: SessionToken,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub access_token: SessionToken,
    pub access_token_expires_at: DateTime<Utc>,
}

impl IssuedTokens {
    pub fn issue(
        now: DateTime<Utc>,
        refresh_ttl: chrono::Duration,
        access_ttl: chrono::Duration,
    ) -> Self {
        Self {
            refresh_token: generate_session_token(),
            refresh_token_expires_at: now + refresh_ttl,
            access_token: generate_session_token(),
            access_token_expires_at: now + access_ttl,
        }
    }

    pub fn refresh_token_hash(&self) -> SessionTokenHash {
        hash_session_token(&self.refresh_token)
    }

    pub fn access_token_hash(&self) -> SessionTokenHash {
        hash_session_token(&self.access_token)
    }

    pub fn into_payload(self, session_id: &SessionId) -> TokenExchangePayload {
        TokenExchangePayload::new(
            session_id,
            self.refresh_token,
            self.refresh_token_expires_at,
            self.access_token,
            self.access_token_expires_at,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct TokenExchangePayload {
    pub refresh_token: String,
    pub refresh_token_expires_at: String,
    pub access_token: String,
    pub access_token_expires_at: String,
}

impl TokenExchangePayload {
    pub fn new<B1: AsRef<[u8]>, B2: AsRef<[u8]>>(
        session_id: &SessionId,
        refresh_token: B1,
        refresh_token_expires_at: DateTime<Utc>,
        access_token: B2,
        access_token_expires_at: DateTime<Utc>,
    ) -> Self {
        let refresh_token = pack_session_id_and_token(session_id, refresh_token.as_ref());
        let access_token = pack_session_id_and_token(session_id, access_token.as_ref());
        Self {
            refresh_token: BASE64.encode(refresh_token),
            refresh_token_expires_at: refresh_token_expires_at.to_rfc3339(),
            access_token: BASE64.encode(access_token),
            access_token_expires_at: access_token_expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    pub alias: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}
