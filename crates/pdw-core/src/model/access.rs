use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PdwError;

/// The closed set of permission scopes. Unknown scopes are
/// rejected at request time by [`Scope::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    ReadMemories,
    WriteMemories,
    ReadPreferences,
    WritePreferences,
    ReadContexts,
    WriteContexts,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::ReadMemories => "read:memories",
            Scope::WriteMemories => "write:memories",
            Scope::ReadPreferences => "read:preferences",
            Scope::WritePreferences => "write:preferences",
            Scope::ReadContexts => "read:contexts",
            Scope::WriteContexts => "write:contexts",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, PdwError> {
        match raw {
            "read:memories" => Ok(Scope::ReadMemories),
            "write:memories" => Ok(Scope::WriteMemories),
            "read:preferences" => Ok(Scope::ReadPreferences),
            "write:preferences" => Ok(Scope::WritePreferences),
            "read:contexts" => Ok(Scope::ReadContexts),
            "write:contexts" => Ok(Scope::WriteContexts),
            other => Err(PdwError::invalid_input(format!("unknown scope: {other}"))),
        }
    }
}

/// An on-chain access grant. Expiry is enforced by smart-contract
/// predicates on-chain; this struct mirrors the shape so off-chain code can
/// reason about grants it has read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: String,
    pub content_or_context_id: String,
    pub owner: String,
    pub grantee_app_or_address: String,
    pub scope: Scope,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessGrant {
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| at >= exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn unknown_scopes_are_rejected() {
        assert!(Scope::parse("read:everything").is_err());
    }

    #[test]
    fn known_scopes_round_trip() {
        for s in [
            Scope::ReadMemories,
            Scope::WriteMemories,
            Scope::ReadPreferences,
            Scope::WritePreferences,
            Scope::ReadContexts,
            Scope::WriteContexts,
        ] {
            assert_eq!(Scope::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn expiry_boundary() {
        let now = Utc::now();
        let grant = AccessGrant {
            id: "g1".into(),
            content_or_context_id: "c1".into(),
            owner: "0xUA".into(),
            grantee_app_or_address: "0xUB".into(),
            scope: Scope::ReadMemories,
            expires_at: Some(now + Duration::seconds(3600)),
        };
        assert!(!grant.is_expired(now + Duration::seconds(10)));
        assert!(grant.is_expired(now + Duration::seconds(3700)));
    }
}
