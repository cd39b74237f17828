//! Access-token codec and refresh-secret generation.
//!
//! Access tokens are compact HS256 JWTs carrying `{sub, email, role, iat,
//! exp}` — signed, stateless, and verifiable without a store round-trip.
//! Refresh secrets are opaque high-entropy hex strings; only their SHA-256
//! hash is ever persisted, and that hash is the store's lookup key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::epoch_secs;
use super::store::{Principal, Role};

type HmacSha256 = Hmac<Sha256>;

/// Refresh secret length in bytes before hex encoding (64 bytes = 128 hex
/// chars, 512 bits of entropy).
const REFRESH_SECRET_BYTES: usize = 64;

/// Why an access token failed verification. The two kinds are deliberately
/// distinguishable: a client silently refreshes on `Expired` but gives up
/// and re-authenticates on `Invalid`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Well-formed and correctly signed, but past its expiry.
    #[error("Token expired")]
    Expired,
    /// Malformed, unparseable, or carrying a bad signature.
    #[error("Invalid token")]
    Invalid,
}

/// Claims embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Principal id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Creates and validates access tokens for a fixed signing secret and TTL.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    access_ttl_secs: u64,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            access_ttl_secs,
        }
    }

    /// Issue a signed access token for a principal.
    pub fn issue_access_token(&self, principal: &Principal) -> String {
        self.issue_at(principal, epoch_secs())
    }

    fn issue_at(&self, principal: &Principal, iat: u64) -> String {
        let claims = AccessClaims {
            sub: principal.id.clone(),
            email: principal.email.clone(),
            role: principal.role,
            iat,
            exp: iat + self.access_ttl_secs,
        };

        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims).expect("claims serialization cannot fail"),
        );
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));
        format!("{signing_input}.{signature}")
    }

    /// Verify signature then expiry. Signature failures win: a tampered
    /// token never reports `Expired`.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify_at(token, epoch_secs())
    }

    fn verify_at(&self, token: &str, now: u64) -> Result<AccessClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Invalid);
        };

        let claimed_sig = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Invalid)?;
        let signing_input = format!("{header}.{payload}");
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can accept any key length");
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&claimed_sig)
            .map_err(|_| TokenError::Invalid)?;

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Invalid)?;
        let claims: AccessClaims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Invalid)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC can accept any key length");
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Generate an opaque refresh secret (hex-encoded).
pub fn generate_refresh_secret() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; REFRESH_SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Deterministic lookup hash for a refresh secret. Single-pass SHA-256 and
/// unsalted: the secret is already high-entropy, and the hash must be
/// computable from the secret alone to serve as the store's key.
pub fn hash_refresh_secret(secret: &str) -> String {
    let mut h = Sha256::new();
    h.update(secret.as_bytes());
    hex::encode(h.finalize())
}
