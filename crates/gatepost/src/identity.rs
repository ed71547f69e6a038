//! The decoded representation of a request's principal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::CapabilitySet;

/// One authenticated (or anonymous) principal.
///
/// Reconstructed per request from the session token (or default-initialized
/// to anonymous) and owned by that request's extensions; never persisted
/// beyond the request or shared across requests.
///
/// Invariant: `id` is nil exactly when `capabilities` is anonymous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// The user identifier.
    pub id: Uuid,

    /// A mask of capabilities.
    pub capabilities: CapabilitySet,

    /// When the session token was created. Reserved to drive expiry and
    /// rotation once those exist.
    pub issued_at: DateTime<Utc>,

    /// Presentation only; never an input to authorization decisions.
    pub display_name: String,
}

impl Identity {
    /// The minimally privileged identity attached when no session cookie is
    /// present.
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            capabilities: CapabilitySet::ANONYMOUS,
            issued_at: Utc::now(),
            display_name: String::new(),
        }
    }

    /// An authenticated principal, stamped with the current time.
    pub fn new(id: Uuid, capabilities: CapabilitySet, display_name: impl Into<String>) -> Self {
        debug_assert!(
            !capabilities.is_anonymous() && !id.is_nil(),
            "authenticated identities need a real id and at least one capability"
        );
        Self {
            id,
            capabilities,
            issued_at: Utc::now(),
            display_name: display_name.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.capabilities.is_anonymous()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn has_capability(&self, caps: CapabilitySet) -> bool {
        self.capabilities.contains(caps)
    }

    pub fn can_edit_resource(&self) -> bool {
        self.has_capability(CapabilitySet::EDIT_RESOURCE)
    }

    pub fn can_view_users(&self) -> bool {
        self.has_capability(CapabilitySet::VIEW_USERS)
    }

    pub fn can_invite_users(&self) -> bool {
        self.has_capability(CapabilitySet::INVITE_NEW_VOLUNTEER | CapabilitySet::INVITE_NEW_ADMIN)
    }

    /// The identity was altered after issuance; route the holder through
    /// re-authentication instead of trusting the token for normal access.
    pub fn needs_reauthentication(&self) -> bool {
        self.has_capability(CapabilitySet::REAUTHENTICATE)
    }

    /// Nil id and anonymous capabilities must imply each other.
    pub(crate) fn is_consistent(&self) -> bool {
        self.id.is_nil() == self.capabilities.is_anonymous()
    }
}
