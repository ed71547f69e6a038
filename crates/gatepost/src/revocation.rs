//! Revoked-identifier tracking.

use dashmap::DashSet;
use uuid::Uuid;

/// Identifiers whose previously issued tokens must no longer be trusted.
///
/// Owned by one middleware instance and shared read/write across every
/// request it handles; membership checks stay O(1) amortized and a revoke
/// is safe to call concurrently with in-flight decode checks.
///
/// Nothing populates this yet at runtime. The middleware already consults
/// it, so wiring up an admin-facing revoke path needs no structural change.
#[derive(Debug, Default)]
pub struct RevocationSet {
    revoked: DashSet<Uuid>,
}

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as revoked. Returns false if it already was.
    pub fn revoke(&self, id: Uuid) -> bool {
        self.revoked.insert(id)
    }

    pub fn is_revoked(&self, id: &Uuid) -> bool {
        self.revoked.contains(id)
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}
