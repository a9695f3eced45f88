//! Superblock Manager - winner selection and block checks

use super::registry::TriggerRegistry;
use crate::domain::{is_valid_block_height, GovernanceObjectId, Superblock, VoteSignal};
use crate::ports::{
    AddressCodec, ChainStateProvider, GovernanceStore, GovernanceView, SuperblockApi,
};
use shared_types::{Amount, Transaction, TxOut};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Stateless query layer over the trigger registry
///
/// Every operation takes the governance store lock first and then consults
/// the registry, so listing and scoring triggers see one snapshot.
pub struct SuperblockManager<S: GovernanceStore, C: ChainStateProvider> {
    store: Arc<S>,
    registry: Arc<TriggerRegistry>,
    chain: Arc<C>,
    codec: Arc<dyn AddressCodec>,
}

impl<S: GovernanceStore, C: ChainStateProvider> SuperblockManager<S, C> {
    /// Create a manager over shared collaborators
    pub fn new(
        store: Arc<S>,
        registry: Arc<TriggerRegistry>,
        chain: Arc<C>,
        codec: Arc<dyn AddressCodec>,
    ) -> Self {
        Self {
            store,
            registry,
            chain,
            codec,
        }
    }

    /// Registry shared with this manager
    pub fn registry(&self) -> &Arc<TriggerRegistry> {
        &self.registry
    }

    /// Promote a governance object to a tracked trigger
    pub fn add_trigger(&self, id: GovernanceObjectId) -> bool {
        let view = self.store.lock();
        self.registry.add(&view, id)
    }

    /// Run a reaping pass at the network-adjusted time
    pub fn clean_and_remove(&self) -> usize {
        let mut view = self.store.lock();
        self.registry
            .clean_and_remove(&mut view, self.chain.adjusted_time())
    }

    /// Winning superblock for `height`
    ///
    /// Highest absolute funding yes count wins; it must be positive. Ties go
    /// to the lowest object id.
    pub fn best_superblock(&self, height: i64) -> Option<Arc<Superblock>> {
        let view = self.store.lock();
        self.best_in_view(&view, height)
    }

    fn best_in_view(&self, view: &dyn GovernanceView, height: i64) -> Option<Arc<Superblock>> {
        if !is_valid_block_height(self.chain.superblock_params(), height) {
            return None;
        }

        let mut best: Option<Arc<Superblock>> = None;
        let mut best_yes = 0i64;
        for superblock in self.registry.active_triggers(view) {
            if superblock.target_height() != height {
                continue;
            }
            // Removed since listing
            let Some(object) = view.find(&superblock.object_id()) else {
                continue;
            };
            let yes = object.absolute_yes_count(VoteSignal::Funding);
            if yes > best_yes {
                best_yes = yes;
                best = Some(superblock);
            }
        }
        best
    }

    fn payee_address(&self, superblock: &Superblock, index: usize) -> String {
        let payment = &superblock.payments()[index];
        self.codec
            .extract_address(&payment.script)
            .unwrap_or_else(|| payment.address.clone())
    }
}

impl<S: GovernanceStore, C: ChainStateProvider> SuperblockApi for SuperblockManager<S, C> {
    #[instrument(skip(self))]
    fn is_triggered(&self, height: i64) -> bool {
        if !is_valid_block_height(self.chain.superblock_params(), height) {
            return false;
        }

        let mut view = self.store.lock();
        let triggers = self.registry.active_triggers(&view);
        debug!(target: "gobject", triggers = triggers.len(), "checking active triggers");

        for superblock in triggers {
            if superblock.target_height() != height {
                continue;
            }
            let Some(object) = view.find_mut(&superblock.object_id()) else {
                continue;
            };
            object.update_sentinel_variables();
            if object.is_cached_funding() {
                debug!(target: "gobject", id = %superblock.object_id(), "funding active");
                return true;
            }
        }
        false
    }

    #[instrument(skip(self))]
    fn superblock_payments(&self, height: i64) -> Option<Vec<TxOut>> {
        let Some(superblock) = self.best_superblock(height) else {
            debug!(target: "gobject", "no superblock for height");
            return None;
        };
        for (index, payment) in superblock.payments().iter().enumerate() {
            debug!(
                target: "gobject",
                index,
                address = %self.payee_address(&superblock, index),
                amount = payment.amount,
                "superblock output"
            );
        }
        Some(superblock.outputs())
    }

    #[instrument(skip(self, tx))]
    fn is_valid(&self, tx: &Transaction, height: i64, block_reward: Amount) -> bool {
        match self.best_superblock(height) {
            Some(superblock) => {
                superblock.is_valid(tx, height, block_reward, self.chain.as_ref())
            }
            None => false,
        }
    }

    #[instrument(skip(self))]
    fn execute_best(&self, height: i64) -> bool {
        match self.best_superblock(height) {
            Some(superblock) => {
                superblock.set_executed();
                true
            }
            None => false,
        }
    }

    fn required_payments_string(&self, height: i64) -> String {
        let Some(superblock) = self.best_superblock(height) else {
            debug!(target: "gobject", height, "no superblock for height");
            return "error".to_string();
        };
        if superblock.payments().is_empty() {
            return "Unknown".to_string();
        }
        (0..superblock.payments().len())
            .map(|index| self.payee_address(&superblock, index))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        Base58CheckAddressCodec, InMemoryGovernanceStore, MemoryGovernanceObject,
    };
    use crate::config::{GovernanceConfig, SuperblockParams};
    use crate::domain::{GovernanceObjectType, PaymentDestination, SuperblockStatus};
    use serde_json::json;
    use shared_types::COIN;

    struct TestChain {
        params: SuperblockParams,
    }

    impl ChainStateProvider for TestChain {
        fn superblock_params(&self) -> &SuperblockParams {
            &self.params
        }
        fn block_subsidy(&self, _bits: u32, _height: i64, _superblock_part_only: bool) -> Amount {
            COIN
        }
        fn adjusted_time(&self) -> i64 {
            1_700_000_000
        }
    }

    type Manager = SuperblockManager<InMemoryGovernanceStore, TestChain>;

    fn setup() -> (Arc<InMemoryGovernanceStore>, Manager) {
        let mut config = GovernanceConfig::default();
        config.superblock.activation_height = 100;
        config.superblock.cycle_length = 10;
        let codec: Arc<dyn AddressCodec> = Arc::new(Base58CheckAddressCodec::default());
        let store = Arc::new(InMemoryGovernanceStore::new());
        let registry = Arc::new(TriggerRegistry::new(&config, Arc::clone(&codec)));
        let chain = Arc::new(TestChain {
            params: config.superblock.clone(),
        });
        let manager = SuperblockManager::new(Arc::clone(&store), registry, chain, codec);
        (store, manager)
    }

    fn address(n: u8) -> String {
        Base58CheckAddressCodec::default().encode(&PaymentDestination::KeyHash([n; 20]))
    }

    fn id(n: u8) -> GovernanceObjectId {
        GovernanceObjectId([n; 32])
    }

    fn add(manager: &Manager, store: &InMemoryGovernanceStore, n: u8, yes: i64, payees: &[u8]) {
        let addresses: Vec<String> = payees.iter().map(|p| address(*p)).collect();
        let amounts: Vec<&str> = payees.iter().map(|_| "1").collect();
        let payload = json!({
            "event_block_height": 110,
            "payment_addresses": addresses.join("|"),
            "payment_amounts": amounts.join("|")
        });
        store.insert(
            MemoryGovernanceObject::new(
                id(n),
                GovernanceObjectType::Trigger,
                hex::encode(payload.to_string()),
            )
            .with_yes_count(VoteSignal::Funding, yes),
        );
        assert!(manager.add_trigger(id(n)));
    }

    #[test]
    fn test_best_superblock_highest_yes_count() {
        let (store, manager) = setup();
        add(&manager, &store, 1, 5, &[1]);
        add(&manager, &store, 2, 9, &[2]);
        add(&manager, &store, 3, 7, &[3]);
        assert_eq!(manager.best_superblock(110).map(|s| s.object_id()), Some(id(2)));
        assert!(manager.best_superblock(120).is_none());
        assert!(manager.best_superblock(115).is_none());
    }

    #[test]
    fn test_tie_resolves_to_lowest_id() {
        let (store, manager) = setup();
        add(&manager, &store, 7, 4, &[1]);
        add(&manager, &store, 3, 4, &[2]);
        assert_eq!(manager.best_superblock(110).map(|s| s.object_id()), Some(id(3)));
    }

    #[test]
    fn test_no_winner_without_yes_votes() {
        let (store, manager) = setup();
        add(&manager, &store, 1, 0, &[1]);
        assert!(manager.best_superblock(110).is_none());
        assert_eq!(manager.required_payments_string(110), "error");
        assert!(manager.superblock_payments(110).is_none());
        assert!(!manager.execute_best(110));
        assert!(!manager.is_valid(&Transaction::default(), 110, COIN));
    }

    #[test]
    fn test_is_triggered_uses_funding_flag() {
        let (store, manager) = setup();
        add(&manager, &store, 1, 0, &[1]);
        assert!(!manager.is_triggered(110));
        if let Some(object) = store.lock().object_mut(&id(1)) {
            object.set_yes_count(VoteSignal::Funding, 1);
        }
        assert!(manager.is_triggered(110));
        assert!(!manager.is_triggered(120));
    }

    #[test]
    fn test_payments_and_required_string() {
        let (store, manager) = setup();
        add(&manager, &store, 1, 3, &[1, 2]);
        let outputs = manager.superblock_payments(110).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].value, COIN);
        assert_eq!(
            manager.required_payments_string(110),
            format!("{}, {}", address(1), address(2))
        );

        let tx = Transaction::new(outputs);
        assert!(manager.is_valid(&tx, 110, 0));
        assert!(manager.execute_best(110));
        assert_eq!(
            manager.registry().get(&id(1)).map(|s| s.status()),
            Some(SuperblockStatus::Executed)
        );
    }

    #[test]
    fn test_clean_and_remove_uses_adjusted_time() {
        let (store, manager) = setup();
        add(&manager, &store, 1, 3, &[1]);
        store.lock().remove(&id(1));
        assert_eq!(manager.clean_and_remove(), 1);
        assert!(manager.registry().is_empty());
    }
}
