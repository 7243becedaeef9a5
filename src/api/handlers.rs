use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;
use crate::flows::{self, Introspection, IssueOutcome, IssueRequest};
use crate::indieauth::validate::{parse_bearer, BearerHeader};
use crate::middleware::metrics::{encode_metrics, metrics};
use crate::AppState;

static FORM_CONTENT_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^application/x-www-form-urlencoded(;.*)?$").unwrap());

// ── Response DTOs ────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IntrospectionResponse {
    pub me: String,
    pub client_id: String,
    pub scope: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// ANY / — the token endpoint. GET introspects, POST issues or revokes.
pub async fn token_endpoint(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    match method {
        Method::GET => introspect(&state, &headers).await,
        Method::POST => {
            let form = read_form(&headers, &body)?;
            if form.get("action").map(String::as_str) == Some("revoke") {
                revoke(&state, &form).await
            } else {
                issue(&state, &form).await
            }
        }
        _ => Err(AppError::MethodNotAllowed),
    }
}

/// GET /metrics — Prometheus text exposition.
pub async fn prometheus_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

async fn introspect(state: &AppState, headers: &HeaderMap) -> Result<Response, AppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());

    let bearer = match parse_bearer(authorization) {
        BearerHeader::Token(token) => token,
        BearerHeader::Missing => {
            metrics().introspected("missing");
            return Err(AppError::MissingToken);
        }
        BearerHeader::Malformed => {
            metrics().introspected("malformed");
            return Err(AppError::MalformedToken);
        }
    };

    let outcome = flows::introspect(state.tokens.as_ref(), bearer).await?;
    metrics().introspected(outcome.label());
    match outcome {
        Introspection::Active(token) => Ok(Json(IntrospectionResponse {
            me: token.me,
            client_id: token.client_id,
            scope: token.scope,
        })
        .into_response()),
        Introspection::Unknown => Err(AppError::UnknownToken),
        Introspection::Revoked => Err(AppError::RevokedToken),
    }
}

async fn revoke(state: &AppState, form: &HashMap<String, String>) -> Result<Response, AppError> {
    metrics().revocation();
    flows::revoke(state.tokens.as_ref(), form.get("token").map(String::as_str)).await?;
    Ok(StatusCode::OK.into_response())
}

async fn issue(state: &AppState, form: &HashMap<String, String>) -> Result<Response, AppError> {
    let Some(req) = IssueRequest::from_form(form) else {
        tracing::debug!("token request failed shape validation");
        metrics().issuance_rejected();
        return Err(AppError::InvalidRequest);
    };

    match flows::issue(state, &req).await? {
        IssueOutcome::Issued(issued) => {
            metrics().token_issued();
            Ok(Json(issued).into_response())
        }
        IssueOutcome::Rejected => {
            metrics().issuance_rejected();
            Err(AppError::InvalidRequest)
        }
    }
}

/// Decode a url-encoded POST body. A repeated key keeps its last value.
fn read_form(headers: &HeaderMap, body: &[u8]) -> Result<HashMap<String, String>, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !FORM_CONTENT_TYPE.is_match(content_type) {
        return Err(AppError::UnsupportedMediaType);
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).map_err(|e| {
        tracing::debug!(error = %e, "undecodable form body");
        AppError::InvalidRequest
    })?;
    Ok(pairs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn form_headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_read_form_accepts_parameters() {
        let form = read_form(
            &form_headers("application/x-www-form-urlencoded; charset=utf-8"),
            b"action=revoke&token=abc",
        )
        .unwrap();
        assert_eq!(form.get("action").unwrap(), "revoke");
        assert_eq!(form.get("token").unwrap(), "abc");
    }

    #[test]
    fn test_read_form_last_value_wins() {
        let form = read_form(
            &form_headers("application/x-www-form-urlencoded"),
            b"code=one&code=two+words",
        )
        .unwrap();
        assert_eq!(form.get("code").unwrap(), "two words");
    }

    #[test]
    fn test_read_form_rejects_other_media_types() {
        for ct in ["application/json", "text/plain", "application/x-www-form-urlencodedx"] {
            assert!(matches!(
                read_form(&form_headers(ct), b"a=b"),
                Err(AppError::UnsupportedMediaType)
            ));
        }
        assert!(matches!(
            read_form(&HeaderMap::new(), b"a=b"),
            Err(AppError::UnsupportedMediaType)
        ));
    }
}
