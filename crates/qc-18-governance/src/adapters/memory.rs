//! In-memory governance object store
//!
//! Holds objects, vote tallies and the cached chain height behind one
//! `parking_lot::Mutex`. The guard returned by [`GovernanceStore::lock`] is
//! the governance view handed to the registry.

use crate::domain::{GovernanceObjectId, GovernanceObjectType, VoteSignal};
use crate::ports::{GovernanceObject, GovernanceStore, GovernanceView};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;

/// A governance object with a local vote tally
#[derive(Clone, Debug)]
pub struct MemoryGovernanceObject {
    id: GovernanceObjectId,
    object_type: GovernanceObjectType,
    payload_hex: String,
    yes_counts: HashMap<VoteSignal, i64>,
    funding_threshold: i64,
    cached_funding: bool,
    deleted: bool,
    expired: bool,
    deletion_time: i64,
}

impl MemoryGovernanceObject {
    /// Create an object with no votes
    pub fn new(
        id: GovernanceObjectId,
        object_type: GovernanceObjectType,
        payload_hex: impl Into<String>,
    ) -> Self {
        Self {
            id,
            object_type,
            payload_hex: payload_hex.into(),
            yes_counts: HashMap::new(),
            funding_threshold: 1,
            cached_funding: false,
            deleted: false,
            expired: false,
            deletion_time: 0,
        }
    }

    /// Set the absolute yes count for a signal
    pub fn with_yes_count(mut self, signal: VoteSignal, count: i64) -> Self {
        self.set_yes_count(signal, count);
        self
    }

    /// Absolute yes count needed before funding is considered active
    pub fn with_funding_threshold(mut self, threshold: i64) -> Self {
        self.funding_threshold = threshold;
        self
    }

    /// Replace the absolute yes count for a signal
    pub fn set_yes_count(&mut self, signal: VoteSignal, count: i64) {
        self.yes_counts.insert(signal, count);
    }

    /// Change the object type
    pub fn set_object_type(&mut self, object_type: GovernanceObjectType) {
        self.object_type = object_type;
    }

    /// Deletion requested
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Flagged expired
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Deletion timestamp, 0 when unset
    pub fn deletion_time(&self) -> i64 {
        self.deletion_time
    }
}

impl GovernanceObject for MemoryGovernanceObject {
    fn id(&self) -> GovernanceObjectId {
        self.id
    }

    fn object_type(&self) -> GovernanceObjectType {
        self.object_type
    }

    fn payload_hex(&self) -> &str {
        &self.payload_hex
    }

    fn absolute_yes_count(&self, signal: VoteSignal) -> i64 {
        self.yes_counts.get(&signal).copied().unwrap_or(0)
    }

    fn update_sentinel_variables(&mut self) {
        self.cached_funding =
            self.absolute_yes_count(VoteSignal::Funding) >= self.funding_threshold;
    }

    fn is_cached_funding(&self) -> bool {
        self.cached_funding
    }

    fn mark_deleted(&mut self, timestamp: i64) {
        self.deleted = true;
        if self.deletion_time == 0 {
            self.deletion_time = timestamp;
        }
    }

    fn mark_expired(&mut self, timestamp: i64) {
        self.expired = true;
        self.deletion_time = timestamp;
    }
}

#[derive(Debug, Default)]
struct StoreState {
    objects: HashMap<GovernanceObjectId, MemoryGovernanceObject>,
    cached_block_height: i64,
}

/// Governance store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct InMemoryGovernanceStore {
    state: Mutex<StoreState>,
}

impl InMemoryGovernanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object
    pub fn insert(&self, object: MemoryGovernanceObject) {
        self.lock().insert(object);
    }

    /// Update the cached chain height
    pub fn set_cached_block_height(&self, height: i64) {
        self.lock().set_cached_block_height(height);
    }
}

impl GovernanceStore for InMemoryGovernanceStore {
    type View<'a> = MemoryGovernanceView<'a>;

    fn lock(&self) -> Self::View<'_> {
        MemoryGovernanceView {
            state: self.state.lock(),
        }
    }
}

/// Locked view of an [`InMemoryGovernanceStore`]
pub struct MemoryGovernanceView<'a> {
    state: MutexGuard<'a, StoreState>,
}

impl MemoryGovernanceView<'_> {
    /// Insert or replace an object
    pub fn insert(&mut self, object: MemoryGovernanceObject) {
        self.state.objects.insert(object.id, object);
    }

    /// Remove an object
    pub fn remove(&mut self, id: &GovernanceObjectId) -> Option<MemoryGovernanceObject> {
        self.state.objects.remove(id)
    }

    /// Concrete object access
    pub fn object(&self, id: &GovernanceObjectId) -> Option<&MemoryGovernanceObject> {
        self.state.objects.get(id)
    }

    /// Concrete mutable object access
    pub fn object_mut(&mut self, id: &GovernanceObjectId) -> Option<&mut MemoryGovernanceObject> {
        self.state.objects.get_mut(id)
    }

    /// Update the cached chain height
    pub fn set_cached_block_height(&mut self, height: i64) {
        self.state.cached_block_height = height;
    }
}

impl GovernanceView for MemoryGovernanceView<'_> {
    fn find(&self, id: &GovernanceObjectId) -> Option<&dyn GovernanceObject> {
        self.state
            .objects
            .get(id)
            .map(|object| object as &dyn GovernanceObject)
    }

    fn find_mut(&mut self, id: &GovernanceObjectId) -> Option<&mut dyn GovernanceObject> {
        self.state
            .objects
            .get_mut(id)
            .map(|object| object as &mut dyn GovernanceObject)
    }

    fn cached_block_height(&self) -> i64 {
        self.state.cached_block_height
    }
}
