//! Session and credential lifecycle for the CRM backend.
//!
//! Provides:
//! - Password verification (PBKDF2-HMAC-SHA256, 100k rounds + per-user salt)
//! - Short-lived signed access tokens (HS256, stateless verification)
//! - Long-lived opaque refresh secrets, stored only as SHA-256 hashes
//! - Rotation-on-every-use with reuse detection and cascade revocation
//! - SQLite-backed persistent storage with a bounded revoked-token history
//!
//! ## Design Decisions
//! - Refresh secrets are opaque hex strings; the server keeps only their
//!   SHA-256 hash, so a database compromise alone yields no usable tokens.
//! - Access tokens are stateless and cannot be revoked before expiry; the
//!   short lifetime bounds the exposure window.
//! - A rotated-out hash is remembered for a grace window. Presenting it
//!   again is treated as theft: every session of the owning account is
//!   revoked before the request fails.

pub mod credentials;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod token;

pub use service::{AuthError, AuthService, ClientContext};
pub use store::{Role, SessionStore};
pub use token::{AccessClaims, TokenCodec};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix epoch in seconds.
pub(crate) fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
