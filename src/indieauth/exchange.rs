//! Authorization code verification against a trusted authorization endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::indieauth::fetch::Fetch;
use crate::indieauth::validate::{is_valid_scope, is_valid_url};

/// Deepest JSON document accepted from an authorization endpoint: one
/// object whose members are all scalars.
const MAX_RESPONSE_DEPTH: usize = 2;

/// Identity and scope vouched for by the authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub me: String,
    pub scope: String,
}

/// Redeem `code` at `endpoint`. `None` if the endpoint could not be reached
/// or answered with anything other than a well-formed assertion.
pub async fn exchange(
    fetch: &dyn Fetch,
    code: &str,
    client_id: &str,
    redirect_uri: &str,
    endpoint: &str,
) -> Option<Assertion> {
    let form = [("code", code), ("client_id", client_id), ("redirect_uri", redirect_uri)];
    let resp = match fetch.post_form(endpoint, &form).await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::info!(endpoint = %endpoint, error = %e, "code verification request failed");
            return None;
        }
    };

    let assertion = parse_assertion(&resp.body);
    if assertion.is_none() {
        tracing::info!(endpoint = %endpoint, status = resp.status, "authorization endpoint rejected code");
    }
    assertion
}

/// Validate the shape of an authorization endpoint's JSON answer.
pub fn parse_assertion(body: &str) -> Option<Assertion> {
    let value: Value = serde_json::from_str(body).ok()?;
    if nesting_depth(&value) > MAX_RESPONSE_DEPTH {
        return None;
    }

    let obj = value.as_object()?;
    let me = obj.get("me")?.as_str()?;
    let scope = obj.get("scope")?.as_str()?;
    if !is_valid_url(me) || !is_valid_scope(scope) {
        return None;
    }

    Some(Assertion {
        me: me.to_string(),
        scope: scope.to_string(),
    })
}

/// Scalars are depth 1; each enclosing array or object adds one.
fn nesting_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(nesting_depth).max().unwrap_or(0),
        Value::Object(members) => 1 + members.values().map(nesting_depth).max().unwrap_or(0),
        _ => 1,
    }
}
