//! Session middleware and the request-identity accessor.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{header::COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::error::AuthError;
use crate::codec::{EncodeError, TokenCodec};
use crate::identity::Identity;
use crate::keys::SecretKeyPair;
use crate::revocation::RevocationSet;

/// Logical name of the session cookie. Private: callers mint cookies through
/// [`AuthState::issue_session_cookie`] and read identities through
/// [`CurrentIdentity`], never through raw cookie plumbing.
const SESSION_COOKIE: &str = "session";

/// Extract the value of `name` from a Cookie header.
fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (cookie_name, value) = pair.split_once('=')?;
        if cookie_name.trim() == name {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Authentication state shared across requests.
///
/// Built once at server construction and cloned into the middleware layer.
/// The codec is read-only after startup; the revocation set is the only
/// mutable state shared between in-flight requests.
#[derive(Clone)]
pub struct AuthState {
    codec: Arc<TokenCodec>,
    revocations: Arc<RevocationSet>,
}

impl AuthState {
    pub fn new(keys: &SecretKeyPair) -> Self {
        Self {
            codec: Arc::new(TokenCodec::new(keys)),
            revocations: Arc::new(RevocationSet::new()),
        }
    }

    /// The revocation set for this middleware instance. Handlers with the
    /// right capability can revoke identifiers here; in-flight requests see
    /// the change on their next decode.
    pub fn revocations(&self) -> &RevocationSet {
        &self.revocations
    }

    /// A `Set-Cookie` value establishing a session for `identity`.
    pub fn issue_session_cookie(&self, identity: &Identity) -> Result<String, EncodeError> {
        let token = self.codec.encode(SESSION_COOKIE, identity)?;
        Ok(format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
        ))
    }

    /// A `Set-Cookie` value that clears the session on logout.
    pub fn clear_session_cookie(&self) -> String {
        format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
    }
}

/// Session middleware.
///
/// Resolves an [`Identity`] for the request and injects it into the request
/// extensions before invoking the delegate:
///
/// 1. No session cookie: the anonymous identity.
/// 2. Cookie decodes and is not revoked: the decoded identity.
/// 3. Cookie undecodable or revoked: reject with 401; the delegate never
///    runs. The raw token is logged by name and failure reason only.
pub async fn session_middleware(
    State(auth): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|header| cookie_value(header, SESSION_COOKIE));

    let identity = match token {
        Some(token) => {
            let identity = auth.codec.decode(SESSION_COOKIE, token).map_err(|err| {
                warn!(cookie = SESSION_COOKIE, error = %err, "session cookie rejected");
                AuthError::MalformedSessionCookie
            })?;
            if auth.revocations.is_revoked(&identity.id) {
                warn!(
                    cookie = SESSION_COOKIE,
                    user = %identity.id,
                    "revoked identifier presented a valid token"
                );
                return Err(AuthError::RevokedIdentity);
            }
            identity
        }
        None => {
            debug!("anonymous access");
            Identity::anonymous()
        }
    };

    // The value's own type is the extension key, so a handler can only get
    // an Identity out, never a mistyped value.
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// The identity resolved for the current request.
///
/// Usable by any handler layered under [`session_middleware`]. Extracting it
/// from a request that never passed through the middleware is a programming
/// error in the router layering and panics rather than inventing an
/// unauthenticated identity.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl std::ops::Deref for CurrentIdentity {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .expect("CurrentIdentity extracted before session_middleware ran; fix the router layering");
        Ok(CurrentIdentity(identity))
    }
}
