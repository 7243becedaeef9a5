//! Token endpoint flows: issue, introspect, revoke.
//!
//! Issuance runs discovery, the trust gate, code exchange and storage in
//! that order and stops at the first negative answer. Callers only ever learn
//! that issuance was rejected; the reason goes to the logs.

use std::collections::HashMap;

use serde::Serialize;

use crate::errors::AppError;
use crate::indieauth::validate::{is_valid_code, is_valid_url};
use crate::indieauth::{discovery, exchange, trust};
use crate::models::token::{log_prefix, Token};
use crate::store::tokens::{self, IssueOutcome as StoreOutcome};
use crate::store::TokenRepository;
use crate::AppState;

pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

// ── Introspection ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Introspection {
    Active(Token),
    Unknown,
    Revoked,
}

pub async fn introspect(repo: &dyn TokenRepository, bearer: &str) -> anyhow::Result<Introspection> {
    let outcome = match tokens::lookup(repo, bearer).await? {
        None => Introspection::Unknown,
        Some(token) if token.is_revoked() => Introspection::Revoked,
        Some(token) => Introspection::Active(token),
    };
    tracing::debug!(token = log_prefix(bearer), outcome = outcome.label(), "introspected token");
    Ok(outcome)
}

impl Introspection {
    pub fn label(&self) -> &'static str {
        match self {
            Introspection::Active(_) => "active",
            Introspection::Unknown => "unknown",
            Introspection::Revoked => "revoked",
        }
    }
}

// ── Revocation ───────────────────────────────────────────────

/// Revoke `token` if given. Possession of the value is the only credential
/// required, and the caller learns nothing about whether it existed.
pub async fn revoke(repo: &dyn TokenRepository, token: Option<&str>) -> anyhow::Result<()> {
    match token {
        Some(value) => tokens::revoke(repo, value).await,
        None => {
            tracing::debug!("revocation request without a token");
            Ok(())
        }
    }
}

// ── Issuance ─────────────────────────────────────────────────

/// A shape-checked authorization code grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub me: String,
}

impl IssueRequest {
    /// All fields or nothing.
    pub fn from_form(form: &HashMap<String, String>) -> Option<Self> {
        let field = |name: &str| form.get(name).map(String::as_str);

        if field("grant_type")? != AUTHORIZATION_CODE_GRANT {
            return None;
        }
        let code = field("code").filter(|v| is_valid_code(v))?;
        let client_id = field("client_id").filter(|v| is_valid_url(v))?;
        let redirect_uri = field("redirect_uri").filter(|v| is_valid_url(v))?;
        let me = field("me").filter(|v| is_valid_url(v))?;

        Some(Self {
            code: code.to_string(),
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            me: me.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub scope: String,
    pub me: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Issued(IssuedToken),
    Rejected,
}

/// Redeem an authorization code for a bearer token.
///
/// Protocol failures are `Rejected`. Storage failures and an exhausted
/// token space are errors.
pub async fn issue(state: &AppState, req: &IssueRequest) -> Result<IssueOutcome, AppError> {
    let Some(endpoint) =
        discovery::discover(state.fetcher.as_ref(), state.markup.as_ref(), &req.me).await
    else {
        return Ok(IssueOutcome::Rejected);
    };

    if !trust::is_trusted(state.settings.as_ref(), &endpoint).await? {
        return Ok(IssueOutcome::Rejected);
    }

    let Some(assertion) = exchange::exchange(
        state.fetcher.as_ref(),
        &req.code,
        &req.client_id,
        &req.redirect_uri,
        &endpoint,
    )
    .await
    else {
        return Ok(IssueOutcome::Rejected);
    };

    match tokens::issue(
        state.tokens.as_ref(),
        &assertion.me,
        &req.client_id,
        &assertion.scope,
    )
    .await?
    {
        StoreOutcome::Issued(value) => Ok(IssueOutcome::Issued(IssuedToken {
            access_token: value,
            token_type: "Bearer",
            scope: assertion.scope,
            me: assertion.me,
        })),
        StoreOutcome::Exhausted => Err(AppError::TokenSpaceExhausted),
    }
}
