//! Consent requests and per-user pending-request bookkeeping.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pdw_core::errors::{PdwError, PdwResult};
use pdw_core::model::Scope;

#[derive(Debug, Clone)]
pub struct ConsentRequest {
    pub id: String,
    pub user: String,
    pub requester_app: String,
    pub scopes: Vec<Scope>,
    pub purpose: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRequestArgs {
    pub requester_app: String,
    pub scopes: Vec<String>,
    pub purpose: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Per-user registry of pending consent requests, bounded to
/// `max_pending_requests` per user (oldest evicted first), using the same
/// concurrent-map-of-per-owner-state shape as a session manager.
pub struct ConsentRegistry {
    pending: DashMap<String, VecDeque<ConsentRequest>>,
    max_pending_requests: usize,
}

impl ConsentRegistry {
    pub fn new(max_pending_requests: usize) -> Self {
        Self {
            pending: DashMap::new(),
            max_pending_requests,
        }
    }

    /// Persists a pending consent request for `user` to later approve or
    /// deny, rejecting unknown scopes at request time.
    pub fn request_consent(&self, user: &str, args: ConsentRequestArgs) -> PdwResult<String> {
        let scopes = args
            .scopes
            .iter()
            .map(|raw| Scope::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if scopes.is_empty() {
            return Err(PdwError::invalid_input("consent request must name at least one scope"));
        }

        let request = ConsentRequest {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            requester_app: args.requester_app,
            scopes,
            purpose: args.purpose,
            expires_at: args.expires_at,
            requested_at: Utc::now(),
        };
        let id = request.id.clone();

        let mut queue = self.pending.entry(user.to_string()).or_default();
        queue.push_back(request);
        while queue.len() > self.max_pending_requests {
            queue.pop_front();
        }
        Ok(id)
    }

    pub fn pending_for(&self, user: &str) -> Vec<ConsentRequest> {
        self.pending.get(user).map(|q| q.iter().cloned().collect()).unwrap_or_default()
    }

    /// Removes and returns a specific pending request, e.g. once the user
    /// has approved or denied it.
    pub fn take(&self, user: &str, request_id: &str) -> Option<ConsentRequest> {
        let mut queue = self.pending.get_mut(user)?;
        let pos = queue.iter().position(|r| r.id == request_id)?;
        queue.remove(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ConsentRequestArgs {
        ConsentRequestArgs {
            requester_app: "app-1".to_string(),
            scopes: vec!["read:memories".to_string()],
            purpose: "recommendations".to_string(),
            expires_at: None,
        }
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let registry = ConsentRegistry::new(10);
        let mut bad = args();
        bad.scopes = vec!["read:everything".to_string()];
        let err = registry.request_consent("0xUA", bad).unwrap_err();
        assert_eq!(err.kind, pdw_core::errors::ErrorKind::InvalidInput);
    }

    #[test]
    fn empty_scope_list_is_rejected() {
        let registry = ConsentRegistry::new(10);
        let mut bad = args();
        bad.scopes = vec![];
        let err = registry.request_consent("0xUA", bad).unwrap_err();
        assert_eq!(err.kind, pdw_core::errors::ErrorKind::InvalidInput);
    }

    #[test]
    fn request_is_visible_in_pending_until_taken() {
        let registry = ConsentRegistry::new(10);
        let id = registry.request_consent("0xUA", args()).unwrap();
        assert_eq!(registry.pending_for("0xUA").len(), 1);
        let taken = registry.take("0xUA", &id).unwrap();
        assert_eq!(taken.id, id);
        assert!(registry.pending_for("0xUA").is_empty());
    }

    #[test]
    fn bound_evicts_oldest_pending_request() {
        let registry = ConsentRegistry::new(2);
        let first = registry.request_consent("0xUA", args()).unwrap();
        registry.request_consent("0xUA", args()).unwrap();
        registry.request_consent("0xUA", args()).unwrap();
        let pending = registry.pending_for("0xUA");
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|r| r.id != first));
    }
}
