//! `AccessEngine`: context-id derivation and on-chain grant/revoke
//! transaction builders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pdw_core::errors::{PdwError, PdwResult};
use pdw_core::model::{ContextId, Scope};
use pdw_core::traits::UnsignedTx;
use pdw_encryption::{build_allowlist_approval, build_grant_approval, ApprovalTx};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum AccessCall {
    Grant {
        context_id: String,
        grantee: String,
        scopes: Vec<Scope>,
        expires_at: Option<DateTime<Utc>>,
    },
    Revoke {
        grant_id: String,
    },
}

fn encode(call: AccessCall) -> PdwResult<UnsignedTx> {
    bincode::serialize(&call).map(UnsignedTx).map_err(|e| PdwError::internal(format!("access transaction encode failed: {e}")))
}

/// Salt source for context-id derivation. Lives on the user's main-wallet
/// object and never leaves authenticated contexts — this crate
/// only consumes it through a caller-supplied lookup.
pub trait ISaltStore: Send + Sync {
    fn salt_for(&self, user: &str) -> PdwResult<Vec<u8>>;
}

pub struct AccessEngine<S: ISaltStore> {
    salt_store: S,
}

impl<S: ISaltStore> AccessEngine<S> {
    pub fn new(salt_store: S) -> Self {
        Self { salt_store }
    }

    /// `sha3_256(user || app_id || salt(user))`. Pure given a
    /// fixed salt; the salt lookup itself may fail (e.g. unauthenticated).
    pub fn derive_context_id(&self, user: &str, app_id: &str) -> PdwResult<ContextId> {
        let salt = self.salt_store.salt_for(user)?;
        Ok(ContextId::derive(user, app_id, &salt))
    }

    pub fn grant(&self, context_id: ContextId, grantee: &str, scopes: &[Scope], expires_at: Option<DateTime<Utc>>) -> PdwResult<UnsignedTx> {
        if scopes.is_empty() {
            return Err(PdwError::invalid_input("grant must name at least one scope"));
        }
        encode(AccessCall::Grant {
            context_id: context_id.to_hex(),
            grantee: grantee.to_string(),
            scopes: scopes.to_vec(),
            expires_at,
        })
    }

    pub fn revoke(&self, grant_id: &str) -> PdwResult<UnsignedTx> {
        encode(AccessCall::Revoke { grant_id: grant_id.to_string() })
    }

    /// Constructs the approval transaction consumed by the encryption
    /// engine's threshold decryption path. When `app_id` is
    /// absent this authorizes the owner directly rather than a grantee app.
    pub fn build_seal_approve(&self, context_or_content_id: &str, app_id: Option<&str>) -> PdwResult<ApprovalTx> {
        match app_id {
            Some(app) => build_grant_approval(app, context_or_content_id),
            None => build_allowlist_approval("owner", context_or_content_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSalt;
    impl ISaltStore for FixedSalt {
        fn salt_for(&self, _user: &str) -> PdwResult<Vec<u8>> {
            Ok(b"fixed-salt".to_vec())
        }
    }

    struct DenySalt;
    impl ISaltStore for DenySalt {
        fn salt_for(&self, _user: &str) -> PdwResult<Vec<u8>> {
            Err(PdwError::unauthorized("not authenticated"))
        }
    }

    #[test]
    fn context_id_derivation_is_deterministic() {
        let engine = AccessEngine::new(FixedSalt);
        let a = engine.derive_context_id("0xUA", "app-1").unwrap();
        let b = engine.derive_context_id("0xUA", "app-1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn salt_lookup_failure_propagates() {
        let engine = AccessEngine::new(DenySalt);
        let err = engine.derive_context_id("0xUA", "app-1").unwrap_err();
        assert_eq!(err.kind, pdw_core::errors::ErrorKind::Unauthorized);
    }

    #[test]
    fn grant_requires_at_least_one_scope() {
        let engine = AccessEngine::new(FixedSalt);
        let context_id = engine.derive_context_id("0xUA", "app-1").unwrap();
        let err = engine.grant(context_id, "0xUB", &[], None).unwrap_err();
        assert_eq!(err.kind, pdw_core::errors::ErrorKind::InvalidInput);
    }

    #[test]
    fn grant_round_trips_through_bincode() {
        let engine = AccessEngine::new(FixedSalt);
        let context_id = engine.derive_context_id("0xUA", "app-1").unwrap();
        let tx = engine.grant(context_id, "0xUB", &[Scope::ReadMemories], None).unwrap();
        let decoded: AccessCall = bincode::deserialize(&tx.0).unwrap();
        match decoded {
            AccessCall::Grant { grantee, scopes, .. } => {
                assert_eq!(grantee, "0xUB");
                assert_eq!(scopes, vec![Scope::ReadMemories]);
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[test]
    fn build_seal_approve_with_app_id_is_a_grant_predicate() {
        let engine = AccessEngine::new(FixedSalt);
        let tx = engine.build_seal_approve("content:abc", Some("app-1")).unwrap();
        assert!(!tx.0.is_empty());
    }
}
