use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// A deterministic per-(user, app) identity used as the IBE identity for
/// app-scoped data: `sha3_256(user_address || app_id || salt)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub [u8; 32]);

impl ContextId {
    /// Derive a context id. Pure: identical inputs always yield an identical
    /// 32-byte output.
    pub fn derive(user_address: &str, app_id: &str, salt: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(user_address.as_bytes());
        hasher.update(app_id.as_bytes());
        hasher.update(salt);
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        Self(out)
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_pure() {
        let a = ContextId::derive("0xUA", "app-1", b"salt");
        let b = ContextId::derive("0xUA", "app-1", b"salt");
        assert_eq!(a, b);
    }

    #[test]
    fn different_inputs_differ() {
        let a = ContextId::derive("0xUA", "app-1", b"salt");
        let b = ContextId::derive("0xUB", "app-1", b"salt");
        let c = ContextId::derive("0xUA", "app-2", b"salt");
        let d = ContextId::derive("0xUA", "app-1", b"other-salt");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn hex_round_trips_through_display() {
        let id = ContextId::derive("0xUA", "app-1", b"salt");
        assert_eq!(id.to_string(), id.to_hex());
        assert_eq!(id.to_hex().len(), 64);
    }
}
