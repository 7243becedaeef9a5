//! Token lifecycle: issue, look up, revoke.

use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;

use crate::models::token::{log_prefix, NewToken, Token};
use crate::store::{InsertOutcome, TokenRepository};

/// How many fresh values to try before giving up on a colliding insert.
pub const MAX_ISSUE_ATTEMPTS: usize = 10;

static TOKEN_VALUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{64}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Issued(String),
    /// Every attempt collided with an existing token.
    Exhausted,
}

/// Could `value` have come from [`generate_token_value`]?
pub fn is_token_shaped(value: &str) -> bool {
    TOKEN_VALUE_RE.is_match(value)
}

/// 256 bits from the OS CSPRNG as 64 lowercase hex characters.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Store a new active token under a random value.
pub async fn issue(
    repo: &dyn TokenRepository,
    me: &str,
    client_id: &str,
    scope: &str,
) -> anyhow::Result<IssueOutcome> {
    issue_with(repo, generate_token_value, me, client_id, scope).await
}

/// Like [`issue`], drawing candidate values from `next_value`.
pub async fn issue_with<F>(
    repo: &dyn TokenRepository,
    mut next_value: F,
    me: &str,
    client_id: &str,
    scope: &str,
) -> anyhow::Result<IssueOutcome>
where
    F: FnMut() -> String + Send,
{
    for attempt in 1..=MAX_ISSUE_ATTEMPTS {
        let token = NewToken {
            value: next_value(),
            me: me.to_string(),
            client_id: client_id.to_string(),
            scope: scope.to_string(),
        };
        match repo.insert_token(&token).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    token = log_prefix(&token.value),
                    me = %me,
                    client_id = %client_id,
                    "issued token"
                );
                return Ok(IssueOutcome::Issued(token.value));
            }
            InsertOutcome::Conflict => {
                tracing::warn!(attempt, "token value collided, regenerating");
            }
        }
    }
    tracing::error!(attempts = MAX_ISSUE_ATTEMPTS, "gave up issuing token after repeated collisions");
    Ok(IssueOutcome::Exhausted)
}

pub async fn lookup(repo: &dyn TokenRepository, value: &str) -> anyhow::Result<Option<Token>> {
    repo.get_token(value).await
}

/// Revoke if active. Unknown and already revoked tokens are left alone.
/// Values that cannot be a token never reach the store.
pub async fn revoke(repo: &dyn TokenRepository, value: &str) -> anyhow::Result<()> {
    if !is_token_shaped(value) {
        tracing::debug!("revoke of a value that is not token-shaped ignored");
        return Ok(());
    }
    if repo.revoke_token(value).await? {
        tracing::info!(token = log_prefix(value), "revoked token");
    } else {
        tracing::debug!(token = log_prefix(value), "revoke was a no-op");
    }
    Ok(())
}
