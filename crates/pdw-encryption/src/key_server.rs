//! The client-side view of an IBE key server.
//! A key server's actual derivation internals are an out-of-scope external
//! collaborator — this crate only needs the threshold contract: ask for a
//! share, get back a share or a denial.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use pdw_core::errors::{PdwError, PdwResult};

use crate::approval::{self, ApprovalPredicate, ApprovalTx};
use crate::shamir::ShamirShare;

/// A server's view of its own Shamir share for a given content identity.
/// Distributing shares to the fleet happens out of band during a real
/// deployment via a DKG/enrollment ceremony that lives outside this crate;
/// `provision_share` models that handoff directly since both sides of it
/// live in this workspace's test and local-deployment code.
pub trait IKeyServer: Send + Sync {
    fn server_index(&self) -> u8;
    fn provision_share(&self, identity: &[u8], share: ShamirShare) -> PdwResult<()>;
    fn request_key_share(&self, identity: &[u8], approval_tx: &ApprovalTx, session_assertion: &[u8]) -> PdwResult<ShamirShare>;
}

/// A policy predicate a [`LocalKeyServer`] evaluates against a decoded
/// [`ApprovalPredicate`] before releasing its share — the in-process stand-in
/// for the on-chain `seal_approve` evaluation real servers perform.
pub type Policy = Arc<dyn Fn(&ApprovalPredicate, &[u8]) -> bool + Send + Sync>;

/// A local, same-process key server used for single-node/dev deployments
/// and tests.
pub struct LocalKeyServer {
    server_index: u8,
    shares: Mutex<HashMap<Vec<u8>, ShamirShare>>,
    policy: Policy,
}

impl LocalKeyServer {
    pub fn new(server_index: u8, policy: Policy) -> Self {
        Self {
            server_index,
            shares: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// A policy that approves everything — useful for tests that don't
    /// exercise authorization.
    pub fn allow_all_policy() -> Policy {
        Arc::new(|_, _| true)
    }

    /// A policy that approves only `SelfApproval { user }` for the given
    /// owner address.
    pub fn self_approval_policy(owner: impl Into<String>) -> Policy {
        let owner = owner.into();
        Arc::new(move |predicate, _identity| matches!(predicate, ApprovalPredicate::SelfApproval { user } if *user == owner))
    }
}

impl IKeyServer for LocalKeyServer {
    fn server_index(&self) -> u8 {
        self.server_index
    }

    fn provision_share(&self, identity: &[u8], share: ShamirShare) -> PdwResult<()> {
        self.shares.lock().unwrap().insert(identity.to_vec(), share);
        Ok(())
    }

    fn request_key_share(&self, identity: &[u8], approval_tx: &ApprovalTx, _session_assertion: &[u8]) -> PdwResult<ShamirShare> {
        let predicate = approval::decode(approval_tx)?;
        if !(self.policy)(&predicate, identity) {
            return Err(PdwError::unauthorized(format!(
                "key server {} denied approval for predicate {predicate:?}",
                self.server_index
            )));
        }
        self.shares
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .ok_or_else(|| PdwError::not_found(format!("key server {} holds no share for this identity", self.server_index)))
    }
}

#[derive(Serialize)]
struct DeriveKeyRequest<'a> {
    identity: &'a [u8],
    approval_tx_bytes: &'a [u8],
    session_key_assertion: &'a [u8],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeriveKeyResponse {
    Approved { key_share: [u8; 32] },
    Denied { deny: String },
}

/// A real networked key server, called over the documented `/derive-key`
/// contract. `provision_share` has no HTTP counterpart in the
/// documented interface — real fleets enroll identities through a separate,
/// out-of-scope ceremony — so it is a deliberate no-op here.
pub struct HttpKeyServer {
    client: reqwest::blocking::Client,
    base_url: String,
    server_index: u8,
}

impl HttpKeyServer {
    pub fn new(base_url: impl Into<String>, server_index: u8) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into(),
            server_index,
        }
    }
}

impl IKeyServer for HttpKeyServer {
    fn server_index(&self) -> u8 {
        self.server_index
    }

    fn provision_share(&self, _identity: &[u8], _share: ShamirShare) -> PdwResult<()> {
        warn!(server = self.server_index, "no-op: real key server fleets enroll identities out of band");
        Ok(())
    }

    fn request_key_share(&self, identity: &[u8], approval_tx: &ApprovalTx, session_assertion: &[u8]) -> PdwResult<ShamirShare> {
        let body = DeriveKeyRequest {
            identity,
            approval_tx_bytes: &approval_tx.0,
            session_key_assertion: session_assertion,
        };
        let response = self
            .client
            .post(format!("{}/derive-key", self.base_url))
            .json(&body)
            .send()
            .map_err(|e| PdwError::unavailable(format!("key server {} unreachable: {e}", self.server_index)))?;

        if !response.status().is_success() {
            return Err(PdwError::unavailable(format!(
                "key server {} returned status {}",
                self.server_index,
                response.status()
            )));
        }

        let parsed: DeriveKeyResponse = response
            .json()
            .map_err(|e| PdwError::internal(format!("malformed derive-key response: {e}")))?;

        match parsed {
            DeriveKeyResponse::Approved { key_share } => Ok(ShamirShare {
                server_index: self.server_index,
                bytes: key_share,
            }),
            DeriveKeyResponse::Denied { deny } => Err(PdwError::unauthorized(format!("key server {} denied: {deny}", self.server_index))),
        }
    }
}
