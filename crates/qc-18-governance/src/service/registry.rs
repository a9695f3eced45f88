//! Trigger registry

use crate::config::{ExpirationConfig, GovernanceConfig, SuperblockParams};
use crate::domain::{GovernanceObjectId, GovernanceObjectType, Superblock, SuperblockStatus};
use crate::error::{GovernanceError, Result};
use crate::ports::{AddressCodec, GovernanceView};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Governance objects promoted to superblock triggers
///
/// Entries are kept in ascending id order. Superblocks are handed out as
/// `Arc`s, so a reaping pass never invalidates a caller's reference.
pub struct TriggerRegistry {
    triggers: Mutex<BTreeMap<GovernanceObjectId, Arc<Superblock>>>,
    codec: Arc<dyn AddressCodec>,
    params: SuperblockParams,
    expiration: ExpirationConfig,
}

impl TriggerRegistry {
    /// Create an empty registry
    pub fn new(config: &GovernanceConfig, codec: Arc<dyn AddressCodec>) -> Self {
        Self {
            triggers: Mutex::new(BTreeMap::new()),
            codec,
            params: config.superblock.clone(),
            expiration: config.expiration.clone(),
        }
    }

    /// Track a trigger object; false if already tracked or it fails to decode
    pub fn add(&self, view: &dyn GovernanceView, id: GovernanceObjectId) -> bool {
        match self.try_add(view, id) {
            Ok(_) => true,
            Err(GovernanceError::DuplicateTrigger(_)) => {
                debug!(target: "gobject", %id, "trigger already tracked");
                false
            }
            Err(e) => {
                warn!(target: "gobject", %id, "[qc-18] error creating superblock: {}", e);
                false
            }
        }
    }

    /// Track a trigger object, reporting why it was refused
    pub fn try_add(
        &self,
        view: &dyn GovernanceView,
        id: GovernanceObjectId,
    ) -> Result<Arc<Superblock>> {
        let mut triggers = self.triggers.lock();
        if triggers.contains_key(&id) {
            return Err(GovernanceError::DuplicateTrigger(id.to_hex()));
        }

        let superblock = Superblock::from_object(view, id, self.codec.as_ref(), &self.params)?;
        superblock.set_status(SuperblockStatus::Valid);
        let superblock = Arc::new(superblock);
        triggers.insert(id, Arc::clone(&superblock));

        info!(
            target: "gobject",
            %id,
            height = superblock.target_height(),
            payments = superblock.payments().len(),
            "[qc-18] trigger added"
        );
        Ok(superblock)
    }

    /// Tracked superblocks whose backing object still exists, in id order
    pub fn active_triggers(&self, view: &dyn GovernanceView) -> Vec<Arc<Superblock>> {
        self.triggers
            .lock()
            .iter()
            .filter(|(id, _)| view.find(id).is_some())
            .map(|(_, superblock)| Arc::clone(superblock))
            .collect()
    }

    /// Reap invalid and expired triggers
    ///
    /// Entries whose object vanished or is no longer a trigger become
    /// `Invalid`. `Invalid` and `Unknown` entries are dropped; `Valid` and
    /// `Executed` ones once expired. Dropped objects are marked for deletion
    /// at `now`. Returns the number of entries removed.
    pub fn clean_and_remove(&self, view: &mut dyn GovernanceView, now: i64) -> usize {
        let mut triggers = self.triggers.lock();
        let before = triggers.len();
        debug!(target: "gobject", tracked = before, "clean and remove");

        triggers.retain(|id, superblock| {
            let is_trigger = view
                .find(id)
                .is_some_and(|object| object.object_type() == GovernanceObjectType::Trigger);
            if !is_trigger {
                debug!(target: "gobject", %id, "unknown or non-trigger superblock");
                superblock.set_status(SuperblockStatus::Invalid);
            }

            let remove = match superblock.status() {
                SuperblockStatus::Invalid | SuperblockStatus::Unknown => true,
                SuperblockStatus::Valid | SuperblockStatus::Executed => superblock.is_expired(
                    &mut *view,
                    &self.expiration,
                    self.params.cycle_length,
                    now,
                ),
            };

            if remove {
                info!(
                    target: "gobject",
                    %id,
                    status = ?superblock.status(),
                    "[qc-18] removing trigger"
                );
                if let Some(object) = view.find_mut(id) {
                    object.mark_deleted(now);
                }
            }
            !remove
        });

        before - triggers.len()
    }

    /// Look up a tracked superblock
    pub fn get(&self, id: &GovernanceObjectId) -> Option<Arc<Superblock>> {
        self.triggers.lock().get(id).cloned()
    }

    /// Number of tracked triggers
    pub fn len(&self) -> usize {
        self.triggers.lock().len()
    }

    /// True when nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.triggers.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Base58CheckAddressCodec, InMemoryGovernanceStore, MemoryGovernanceObject};
    use crate::ports::GovernanceStore;
    use serde_json::json;

    const ADDRESS: &str = "XcF5mKwWsiv3k394GBQNpYAuk3CVJ48Xnp";

    fn config() -> GovernanceConfig {
        let mut config = GovernanceConfig::default();
        config.superblock.activation_height = 100;
        config.superblock.cycle_length = 10;
        config
    }

    fn registry() -> TriggerRegistry {
        TriggerRegistry::new(&config(), Arc::new(Base58CheckAddressCodec::default()))
    }

    fn id(n: u8) -> GovernanceObjectId {
        GovernanceObjectId([n; 32])
    }

    fn trigger(n: u8, height: i64) -> MemoryGovernanceObject {
        let payload = json!({
            "event_block_height": height,
            "payment_addresses": ADDRESS,
            "payment_amounts": "1"
        });
        MemoryGovernanceObject::new(
            id(n),
            GovernanceObjectType::Trigger,
            hex::encode(payload.to_string()),
        )
    }

    #[test]
    fn test_add_rejects_duplicates_and_bad_objects() {
        let store = InMemoryGovernanceStore::new();
        store.insert(trigger(1, 110));
        store.insert(trigger(2, 115));
        let registry = registry();
        let view = store.lock();

        assert!(registry.add(&view, id(1)));
        assert!(!registry.add(&view, id(1)));
        assert!(!registry.add(&view, id(2)));
        assert!(!registry.add(&view, id(3)));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&id(1)).map(|sb| sb.status()),
            Some(SuperblockStatus::Valid)
        );
        assert!(matches!(
            registry.try_add(&view, id(1)),
            Err(GovernanceError::DuplicateTrigger(_))
        ));
    }

    #[test]
    fn test_active_triggers_skip_missing_objects() {
        let store = InMemoryGovernanceStore::new();
        store.insert(trigger(1, 110));
        store.insert(trigger(2, 120));
        let registry = registry();
        let mut view = store.lock();
        assert!(registry.add(&view, id(1)));
        assert!(registry.add(&view, id(2)));

        view.remove(&id(1));
        let active = registry.active_triggers(&view);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].object_id(), id(2));
        // filtered, not removed
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clean_and_remove_invalidates_changed_objects() {
        let store = InMemoryGovernanceStore::new();
        store.insert(trigger(1, 110));
        store.insert(trigger(2, 120));
        let registry = registry();
        let mut view = store.lock();
        assert!(registry.add(&view, id(1)));
        assert!(registry.add(&view, id(2)));
        let held = registry.get(&id(1)).unwrap();

        if let Some(object) = view.object_mut(&id(1)) {
            object.set_object_type(GovernanceObjectType::Proposal);
        }
        assert_eq!(registry.clean_and_remove(&mut view, 1_000), 1);
        assert!(registry.get(&id(1)).is_none());
        assert_eq!(held.status(), SuperblockStatus::Invalid);
        assert!(view.object(&id(1)).is_some_and(|o| o.is_deleted()));
        assert_eq!(view.object(&id(1)).map(|o| o.deletion_time()), Some(1_000));
        assert!(registry.get(&id(2)).is_some());
    }

    #[test]
    fn test_clean_and_remove_drops_unknown_status() {
        let store = InMemoryGovernanceStore::new();
        store.insert(trigger(1, 110));
        store.insert(trigger(2, 110));
        let registry = registry();
        let mut view = store.lock();
        assert!(registry.add(&view, id(1)));
        assert!(registry.add(&view, id(2)));
        registry.get(&id(1)).unwrap().set_status(SuperblockStatus::Unknown);

        // well inside every expiry window, object still a trigger
        view.set_cached_block_height(110);
        assert_eq!(registry.clean_and_remove(&mut view, 2_000), 1);
        assert!(registry.get(&id(1)).is_none());
        assert!(registry.get(&id(2)).is_some());
        assert!(view.object(&id(1)).is_some_and(|o| o.is_deleted()));
        assert_eq!(view.object(&id(1)).map(|o| o.deletion_time()), Some(2_000));
        assert!(view.object(&id(2)).is_some_and(|o| !o.is_deleted()));
    }

    #[test]
    fn test_clean_and_remove_expiry_thresholds() {
        let store = InMemoryGovernanceStore::new();
        store.insert(trigger(1, 110));
        store.insert(trigger(2, 110));
        let registry = registry();
        let mut view = store.lock();
        assert!(registry.add(&view, id(1)));
        assert!(registry.add(&view, id(2)));
        registry.get(&id(2)).unwrap().set_executed();

        // executed: cycle (10) blocks, valid: 576 blocks
        view.set_cached_block_height(120);
        assert_eq!(registry.clean_and_remove(&mut view, 5), 0);
        view.set_cached_block_height(121);
        assert_eq!(registry.clean_and_remove(&mut view, 5), 1);
        assert!(registry.get(&id(2)).is_none());

        view.set_cached_block_height(110 + 576);
        assert_eq!(registry.clean_and_remove(&mut view, 5), 0);
        view.set_cached_block_height(110 + 577);
        assert_eq!(registry.clean_and_remove(&mut view, 5), 1);
        assert!(registry.is_empty());
    }
}
