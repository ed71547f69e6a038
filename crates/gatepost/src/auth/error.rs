//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Request-level authentication failures.
///
/// Both variants reject the request; an undecodable cookie is never quietly
/// downgraded to anonymous access.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session cookie failed authentication or did not parse.
    #[error("malformed session cookie")]
    MalformedSessionCookie,

    /// The cookie decoded, but its identifier has been revoked.
    #[error("session has been revoked")]
    RevokedIdentity,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AuthError::MalformedSessionCookie => {
                (StatusCode::UNAUTHORIZED, "malformed_session_cookie")
            }
            AuthError::RevokedIdentity => (StatusCode::UNAUTHORIZED, "revoked_identity"),
        };

        let body = Json(AuthErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
        });

        (status, body).into_response()
    }
}
