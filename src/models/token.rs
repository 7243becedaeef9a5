use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// 64 lowercase hex characters.
    pub value: String,
    /// Identity asserted by the authorization endpoint.
    pub me: String,
    pub client_id: String,
    /// Space-separated scope list.
    pub scope: String,
    pub created_at: DateTime<Utc>,
    /// Set once, never cleared.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Token {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Fields needed to store a new, active token.
#[derive(Debug, Clone)]
pub struct NewToken {
    pub value: String,
    pub me: String,
    pub client_id: String,
    pub scope: String,
}

/// Shortened form of a token value that is safe to put in logs.
pub fn log_prefix(value: &str) -> &str {
    value.get(..8).unwrap_or(value)
}
