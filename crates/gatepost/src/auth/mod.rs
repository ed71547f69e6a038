//! Session-cookie authentication.
//!
//! [`session_middleware`] resolves an identity for every request it wraps:
//! no cookie yields the anonymous identity, a valid cookie yields the
//! decoded one, and an undecodable or revoked cookie rejects the request
//! with a 401 before the delegate handler runs. Handlers read the resolved
//! identity through the [`CurrentIdentity`] extractor.

mod error;
mod middleware;

pub use error::{AuthError, AuthErrorResponse};
pub use middleware::{AuthState, CurrentIdentity, session_middleware};
