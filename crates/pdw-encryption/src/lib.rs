//! Threshold encryption engine (C5): IBE-style sealing under a content
//! identity, Shamir-split key shares across a key-server fleet, approval-
//! transaction builders, and the session-key lifecycle used to authenticate
//! threshold decryption requests.

mod approval;
mod engine;
mod key_server;
mod session;
mod shamir;

pub use approval::{build_allowlist_approval, build_grant_approval, build_self_approval, build_timelock_approval, ApprovalPredicate, ApprovalTx};
pub use engine::{EncryptionEngine, ThresholdConfig};
pub use key_server::{HttpKeyServer, IKeyServer, LocalKeyServer, Policy};
pub use session::{begin_session, finalize_session, verify_session_signature, SessionKey, SessionKeyCache, UnsignedSessionAssertion};
pub use shamir::ShamirShare;
