//! Session-key lifecycle: an ephemeral keypair plus a
//! wallet-signed assertion binding `(user, package_id, expires_at)`, used to
//! authenticate to key servers for a bounded TTL. Never persisted in
//! plaintext off-device; a process restart means the user reauthenticates.

use std::time::Duration;

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use moka::sync::Cache;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use pdw_core::errors::{PdwError, PdwResult};

/// Bytes a wallet must sign off-device to finalize a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedSessionAssertion {
    pub user: String,
    pub package_id: String,
    pub expires_at: DateTime<Utc>,
    session_public_key: [u8; 32],
}

impl UnsignedSessionAssertion {
    pub fn to_bytes(&self) -> PdwResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PdwError::internal(format!("session assertion encode failed: {e}")))
    }
}

/// A finalized, wallet-authenticated session key, held only in memory.
#[derive(Clone)]
pub struct SessionKey {
    signing_key_bytes: [u8; 32],
    verifying_key_bytes: [u8; 32],
    pub user: String,
    pub package_id: String,
    pub expires_at: DateTime<Utc>,
    wallet_signature: Vec<u8>,
}

impl SessionKey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.signing_key_bytes)
    }

    /// The bytes sent to key servers as `session_key_assertion` in the
    /// `/derive-key` request.
    pub fn assertion_bytes(&self) -> PdwResult<Vec<u8>> {
        let assertion = UnsignedSessionAssertion {
            user: self.user.clone(),
            package_id: self.package_id.clone(),
            expires_at: self.expires_at,
            session_public_key: self.verifying_key_bytes,
        };
        let mut bytes = assertion.to_bytes()?;
        bytes.extend_from_slice(&self.wallet_signature);
        Ok(bytes)
    }

    /// Signs arbitrary bytes with the ephemeral session keypair — used by
    /// callers that need to prove possession of the live session, as
    /// distinct from the one-time wallet signature bound at creation.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key().sign(message).to_bytes().to_vec()
    }

    fn to_exported(&self) -> ExportedSessionKey {
        ExportedSessionKey {
            signing_key_bytes: self.signing_key_bytes,
            verifying_key_bytes: self.verifying_key_bytes,
            user: self.user.clone(),
            package_id: self.package_id.clone(),
            expires_at: self.expires_at,
            wallet_signature: self.wallet_signature.clone(),
        }
    }

    /// Serializes the full key material for export, e.g. to hand a session
    /// to another in-memory component. Never written to disk by this crate.
    pub fn export(&self) -> PdwResult<Vec<u8>> {
        bincode::serialize(&self.to_exported()).map_err(|e| PdwError::internal(format!("session export failed: {e}")))
    }

    pub fn import(bytes: &[u8]) -> PdwResult<Self> {
        let exported: ExportedSessionKey =
            bincode::deserialize(bytes).map_err(|e| PdwError::internal(format!("session import failed: {e}")))?;
        Ok(Self {
            signing_key_bytes: exported.signing_key_bytes,
            verifying_key_bytes: exported.verifying_key_bytes,
            user: exported.user,
            package_id: exported.package_id,
            expires_at: exported.expires_at,
            wallet_signature: exported.wallet_signature,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct ExportedSessionKey {
    signing_key_bytes: [u8; 32],
    verifying_key_bytes: [u8; 32],
    user: String,
    package_id: String,
    expires_at: DateTime<Utc>,
    wallet_signature: Vec<u8>,
}

/// Begins a session: generates an ephemeral keypair and returns the bytes
/// the user's wallet must sign to finalize it.
pub fn begin_session(user: &str, package_id: &str, ttl_min: i64) -> PdwResult<(SigningKey, UnsignedSessionAssertion)> {
    if ttl_min <= 0 {
        return Err(PdwError::invalid_input("ttl_min must be positive"));
    }
    let signing_key = SigningKey::generate(&mut OsRng);
    let expires_at = Utc::now() + chrono::Duration::minutes(ttl_min);
    let assertion = UnsignedSessionAssertion {
        user: user.to_string(),
        package_id: package_id.to_string(),
        expires_at,
        session_public_key: signing_key.verifying_key().to_bytes(),
    };
    Ok((signing_key, assertion))
}

/// Binds a wallet signature over `assertion` to the ephemeral keypair
/// generated by `begin_session`, producing a usable [`SessionKey`].
///
/// `verify_wallet_signature` is the caller-supplied check that
/// `wallet_signature` really is the user's wallet signing `assertion`'s
/// bytes; this crate has no wallet-verification logic of its own.
pub fn finalize_session(
    signing_key: SigningKey,
    assertion: UnsignedSessionAssertion,
    wallet_signature: Vec<u8>,
) -> SessionKey {
    SessionKey {
        signing_key_bytes: signing_key.to_bytes(),
        verifying_key_bytes: signing_key.verifying_key().to_bytes(),
        user: assertion.user,
        package_id: assertion.package_id,
        expires_at: assertion.expires_at,
        wallet_signature,
    }
}

/// Verifies a message was signed by the live ephemeral session keypair
/// (not the one-time wallet signature).
pub fn verify_session_signature(session: &SessionKey, message: &[u8], signature_bytes: &[u8; 64]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&session.verifying_key_bytes) else {
        return false;
    };
    let signature = Signature::from_bytes(signature_bytes);
    verifying_key.verify(message, &signature).is_ok()
}

/// Bounded, TTL-purged, process-wide cache of live sessions keyed by
/// `user:package_id`.
pub struct SessionKeyCache {
    cache: Cache<String, SessionKey>,
}

impl SessionKeyCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).time_to_live(ttl).build(),
        }
    }

    fn cache_key(user: &str, package_id: &str) -> String {
        format!("{user}:{package_id}")
    }

    pub fn insert(&self, session: SessionKey) {
        let key = Self::cache_key(&session.user, &session.package_id);
        self.cache.insert(key, session);
    }

    /// Returns the cached session, or `None` if absent or past its own TTL
    /// (distinct from the cache's own eviction, which is a size/time bound
    /// on the cache itself, not the session's declared `expires_at`).
    pub fn get(&self, user: &str, package_id: &str) -> Option<SessionKey> {
        let session = self.cache.get(&Self::cache_key(user, package_id))?;
        if session.is_expired(Utc::now()) {
            self.cache.invalidate(&Self::cache_key(user, package_id));
            return None;
        }
        Some(session)
    }

    pub fn remove(&self, user: &str, package_id: &str) {
        self.cache.invalidate(&Self::cache_key(user, package_id));
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }
}
