//! Capability bitmask model.
//!
//! Each capability is a single grantable permission bit; a role is a named
//! union of bits. The mask is a sized integer because it may need to cross
//! an IPC boundary.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A composed set of capability bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(i64);

impl CapabilitySet {
    /// Finding this value in a session token implies the user id is empty.
    pub const ANONYMOUS: CapabilitySet = CapabilitySet(0);

    /// This is also the default for freshly invited users.
    pub const VIEW_PUBLIC_RESOURCE_ENTRY: CapabilitySet = CapabilitySet(1 << 0);
    pub const VIEW_OWN_VOLUNTEER_COMMENT: CapabilitySet = CapabilitySet(1 << 1);
    pub const VIEW_OTHER_VOLUNTEER_COMMENT: CapabilitySet = CapabilitySet(1 << 2);

    /// Edit includes adding or removing.
    pub const EDIT_OWN_VOLUNTEER_COMMENT: CapabilitySet = CapabilitySet(1 << 3);
    pub const EDIT_OTHER_VOLUNTEER_COMMENT: CapabilitySet = CapabilitySet(1 << 4);

    pub const EDIT_RESOURCE: CapabilitySet = CapabilitySet(1 << 5);

    pub const VIEW_USERS: CapabilitySet = CapabilitySet(1 << 6);
    pub const INVITE_NEW_VOLUNTEER: CapabilitySet = CapabilitySet(1 << 7);
    pub const INVITE_NEW_ADMIN: CapabilitySet = CapabilitySet(1 << 8);
    pub const EDIT_USERS: CapabilitySet = CapabilitySet(1 << 9);

    /// The identity was altered after the token was issued. Finding this bit
    /// in a decoded token means the holder must be routed through
    /// re-authentication; detecting and acting on it is the delegate
    /// handler's job, not the middleware's.
    pub const REAUTHENTICATE: CapabilitySet = CapabilitySet(1 << 10);

    pub const ADMINISTRATOR: CapabilitySet = CapabilitySet(
        Self::VIEW_USERS.0
            | Self::INVITE_NEW_VOLUNTEER.0
            | Self::INVITE_NEW_ADMIN.0
            | Self::EDIT_USERS.0
            | Self::VIEW_PUBLIC_RESOURCE_ENTRY.0,
    );
    pub const VOLUNTEER: CapabilitySet = CapabilitySet(
        Self::VIEW_PUBLIC_RESOURCE_ENTRY.0
            | Self::VIEW_OWN_VOLUNTEER_COMMENT.0
            | Self::VIEW_OTHER_VOLUNTEER_COMMENT.0
            | Self::EDIT_OWN_VOLUNTEER_COMMENT.0
            | Self::EDIT_RESOURCE.0
            | Self::INVITE_NEW_VOLUNTEER.0,
    );

    /// True iff at least one bit of `caps` is present in `self`.
    pub const fn contains(self, caps: CapabilitySet) -> bool {
        self.0 & caps.0 != 0
    }

    pub const fn is_anonymous(self) -> bool {
        self.0 == 0
    }

    /// The raw mask, for transport across process boundaries.
    pub const fn bits(self) -> i64 {
        self.0
    }
}

impl BitOr for CapabilitySet {
    type Output = CapabilitySet;

    fn bitor(self, rhs: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 | rhs.0)
    }
}

impl BitOrAssign for CapabilitySet {
    fn bitor_assign(&mut self, rhs: CapabilitySet) {
        self.0 |= rhs.0;
    }
}
