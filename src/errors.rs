use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Any issuance failure. The reason is logged, never returned.
    #[error("invalid request")]
    InvalidRequest,

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed bearer token")]
    MalformedToken,

    #[error("unknown bearer token")]
    UnknownToken,

    #[error("revoked bearer token")]
    RevokedToken,

    #[error("could not generate an unused token value")]
    TokenSpaceExhausted,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn invalid_token(description: &'static str) -> Response {
        let challenge = format!(
            "Bearer error=\"invalid_token\", error_description=\"{}\"",
            description
        );
        let mut response = StatusCode::UNAUTHORIZED.into_response();
        if let Ok(value) = HeaderValue::from_str(&challenge) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "invalid_request",
            )
                .into_response(),
            AppError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response(),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET, POST")],
            )
                .into_response(),
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
            )
                .into_response(),
            AppError::MalformedToken => Self::invalid_token("The access token is malformed"),
            AppError::UnknownToken => Self::invalid_token("The access token is unknown"),
            AppError::RevokedToken => Self::invalid_token("The access token is revoked"),
            AppError::TokenSpaceExhausted => {
                tracing::error!("token issuance exhausted its retry budget");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
