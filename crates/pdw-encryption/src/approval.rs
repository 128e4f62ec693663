//! Approval-transaction builders consumed by key servers' `seal_approve`
//! predicate evaluation. Like `pdw-registry`'s builders,
//! these never sign — they return opaque bytes for the caller to sign.

use serde::{Deserialize, Serialize};

use pdw_core::errors::PdwResult;

/// Opaque, unsigned approval-transaction bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalTx(pub Vec<u8>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApprovalPredicate {
    SelfApproval { user: String },
    GrantApproval { grantee_app: String, content_or_context_id: String },
    AllowlistApproval { allowlist_id: String, caller: String },
    TimelockApproval { timelock_id: String },
}

fn encode(predicate: ApprovalPredicate) -> PdwResult<ApprovalTx> {
    bincode::serialize(&predicate)
        .map(ApprovalTx)
        .map_err(|e| pdw_core::errors::PdwError::internal(format!("approval tx encode failed: {e}")))
}

/// Authorizes the content owner.
pub fn build_self_approval(user: &str) -> PdwResult<ApprovalTx> {
    encode(ApprovalPredicate::SelfApproval { user: user.to_string() })
}

/// Authorizes an OAuth-style grantee app over a specific content/context id.
pub fn build_grant_approval(grantee_app: &str, content_or_context_id: &str) -> PdwResult<ApprovalTx> {
    encode(ApprovalPredicate::GrantApproval {
        grantee_app: grantee_app.to_string(),
        content_or_context_id: content_or_context_id.to_string(),
    })
}

/// Authorizes members of a named allowlist.
pub fn build_allowlist_approval(allowlist_id: &str, caller: &str) -> PdwResult<ApprovalTx> {
    encode(ApprovalPredicate::AllowlistApproval {
        allowlist_id: allowlist_id.to_string(),
        caller: caller.to_string(),
    })
}

/// Authorizes after a time threshold has elapsed.
pub fn build_timelock_approval(timelock_id: &str) -> PdwResult<ApprovalTx> {
    encode(ApprovalPredicate::TimelockApproval { timelock_id: timelock_id.to_string() })
}

pub(crate) fn decode(tx: &ApprovalTx) -> PdwResult<ApprovalPredicate> {
    bincode::deserialize(&tx.0)
        .map_err(|e| pdw_core::errors::PdwError::tampered(format!("malformed approval transaction: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_decode() {
        let tx = build_self_approval("0xUA").unwrap();
        match decode(&tx).unwrap() {
            ApprovalPredicate::SelfApproval { user } => assert_eq!(user, "0xUA"),
            other => panic!("unexpected predicate: {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_tampered() {
        let tx = ApprovalTx(vec![1, 2, 3]);
        let err = decode(&tx).unwrap_err();
        assert_eq!(err.kind, pdw_core::errors::ErrorKind::Tampered);
    }
}
