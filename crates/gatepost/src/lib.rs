//! Session-cookie authentication and capability layer for axum services.
//!
//! The [`auth::session_middleware`] decodes the tamper-evident session
//! cookie on every request, reconstructs the holder's [`identity::Identity`]
//! (falling back to an anonymous, minimally privileged one when no cookie is
//! present), and injects it into the request so downstream handlers can read
//! it through the [`auth::CurrentIdentity`] extractor and apply
//! [`capability::CapabilitySet`] checks.
//!
//! Requests bearing an undecodable or revoked session cookie are rejected
//! with a 401 before the wrapped handler runs; undecodable never silently
//! degrades to anonymous.

pub mod auth;
pub mod capability;
pub mod codec;
pub mod identity;
pub mod keys;
pub mod revocation;
