// 9.0: conditional orders. three kinds (position-increase, position-decrease,
// asset-swap), each stored in a per-owner slot arena: slots are appended in
// creation order, cleared in place on cancel/execute, and never compacted,
// so an order's index is stable for its whole life.
//
// 9.1 lifecycle.rs has create/update/cancel; 9.2 execute.rs has trigger
// validation and the vault-driving execution paths.

mod lifecycle;
mod execute;

use crate::bank::BankError;
use crate::config::OrderParams;
use crate::events::EventLog;
use crate::types::{AccountId, Amount, AssetId, Price, Side, Timestamp, Usd};
use crate::vault::VaultError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Increase,
    Decrease,
    Swap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncreaseOrder {
    pub owner: AccountId,
    // escrowed asset and amount; swapped to the collateral asset at
    // execution when they differ
    pub purchase_asset: AssetId,
    pub purchase_amount: Amount,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub size_delta: Usd,
    pub side: Side,
    pub trigger_price: Price,
    pub trigger_above_threshold: bool,
    pub execution_fee: Amount,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecreaseOrder {
    pub owner: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub collateral_delta: Usd,
    pub size_delta: Usd,
    pub side: Side,
    pub trigger_price: Price,
    pub trigger_above_threshold: bool,
    pub execution_fee: Amount,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapOrder {
    pub owner: AccountId,
    // 2 or 3 hops, distinct endpoints
    pub path: Vec<AssetId>,
    pub amount_in: Amount,
    pub min_out: Amount,
    // output/input price ratio that gates execution when
    // trigger_above_threshold is set; ignored otherwise
    pub trigger_ratio: Decimal,
    pub trigger_above_threshold: bool,
    pub execution_fee: Amount,
    pub created_at: Timestamp,
}

// 9.0.1: per-owner slot arena. a slot is freed by clearing it to None,
// never by removal, so sibling indices stay valid.
#[derive(Debug, Clone, Default)]
pub(crate) struct OrderSlots<T> {
    slots: HashMap<AccountId, Vec<Option<T>>>,
}

impl<T> OrderSlots<T> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    fn append(&mut self, owner: AccountId, order: T) -> u64 {
        let list = self.slots.entry(owner).or_default();
        list.push(Some(order));
        (list.len() - 1) as u64
    }

    fn get(&self, owner: AccountId, index: u64) -> Option<&T> {
        self.slots
            .get(&owner)
            .and_then(|list| list.get(index as usize))
            .and_then(|slot| slot.as_ref())
    }

    fn get_mut(&mut self, owner: AccountId, index: u64) -> Option<&mut T> {
        self.slots
            .get_mut(&owner)
            .and_then(|list| list.get_mut(index as usize))
            .and_then(|slot| slot.as_mut())
    }

    fn take(&mut self, owner: AccountId, index: u64) -> Option<T> {
        self.slots
            .get_mut(&owner)
            .and_then(|list| list.get_mut(index as usize))
            .and_then(|slot| slot.take())
    }

    fn count(&self, owner: AccountId) -> usize {
        self.slots
            .get(&owner)
            .map(|list| list.iter().filter(|slot| slot.is_some()).count())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("execution fee {provided} below minimum {minimum}")]
    InsufficientExecutionFee { provided: Amount, minimum: Amount },

    #[error("incorrect execution fee transferred: sent {provided}, expected {expected}")]
    IncorrectExecutionFee { provided: Amount, expected: Amount },

    #[error("incorrect value transferred: sent {provided}, expected {expected}")]
    IncorrectValueTransferred { provided: Amount, expected: Amount },

    #[error("swap path must have 2 or 3 assets, got {0}")]
    InvalidPathLength(usize),

    #[error("swap path must not start and end on the same asset")]
    InvalidPathEnds,

    #[error("order amount must be positive")]
    ZeroAmountIn,

    #[error("non-existent order: owner {owner:?}, index {index}")]
    NonExistentOrder { owner: AccountId, index: u64 },

    #[error("invalid price for execution")]
    InvalidPriceForExecution,

    #[error("insufficient amountOut: {amount} below minimum {min_out}")]
    InsufficientAmountOut { amount: Amount, min_out: Amount },

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Bank(#[from] BankError),
}

// 9.0.2: the order engine service. holds the three stores and the escrow
// it has pulled from order owners; the wrapped native asset carries the
// execution fees.
#[derive(Debug)]
pub struct OrderEngine {
    pub(crate) params: OrderParams,
    pub(crate) native_asset: AssetId,
    pub(crate) increase_orders: OrderSlots<IncreaseOrder>,
    pub(crate) decrease_orders: OrderSlots<DecreaseOrder>,
    pub(crate) swap_orders: OrderSlots<SwapOrder>,
    pub(crate) log: EventLog,
}

impl OrderEngine {
    pub fn new(params: OrderParams, native_asset: AssetId) -> Self {
        let log = EventLog::new(params.max_events, params.verbose);
        Self {
            params,
            native_asset,
            increase_orders: OrderSlots::new(),
            decrease_orders: OrderSlots::new(),
            swap_orders: OrderSlots::new(),
            log,
        }
    }

    pub fn params(&self) -> &OrderParams {
        &self.params
    }

    pub fn native_asset(&self) -> AssetId {
        self.native_asset
    }

    pub fn increase_order(&self, owner: AccountId, index: u64) -> Option<&IncreaseOrder> {
        self.increase_orders.get(owner, index)
    }

    pub fn decrease_order(&self, owner: AccountId, index: u64) -> Option<&DecreaseOrder> {
        self.decrease_orders.get(owner, index)
    }

    pub fn swap_order(&self, owner: AccountId, index: u64) -> Option<&SwapOrder> {
        self.swap_orders.get(owner, index)
    }

    pub fn pending_order_count(&self, owner: AccountId) -> usize {
        self.increase_orders.count(owner)
            + self.decrease_orders.count(owner)
            + self.swap_orders.count(owner)
    }

    pub fn events(&self) -> &[crate::events::Event] {
        self.log.events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_indices_are_stable() {
        let mut slots: OrderSlots<u32> = OrderSlots::new();
        let owner = AccountId(1);

        assert_eq!(slots.append(owner, 10), 0);
        assert_eq!(slots.append(owner, 20), 1);
        assert_eq!(slots.append(owner, 30), 2);

        // clearing the middle slot leaves its siblings addressable
        assert_eq!(slots.take(owner, 1), Some(20));
        assert_eq!(slots.get(owner, 0), Some(&10));
        assert_eq!(slots.get(owner, 2), Some(&30));
        assert_eq!(slots.get(owner, 1), None);

        // freed slots are never reused
        assert_eq!(slots.append(owner, 40), 3);
        assert_eq!(slots.count(owner), 3);
    }

    #[test]
    fn take_is_idempotent_on_empty_slot() {
        let mut slots: OrderSlots<u32> = OrderSlots::new();
        let owner = AccountId(1);
        slots.append(owner, 1);

        assert_eq!(slots.take(owner, 0), Some(1));
        assert_eq!(slots.take(owner, 0), None);
        assert_eq!(slots.take(owner, 5), None);
        assert_eq!(slots.take(AccountId(2), 0), None);
    }

    #[test]
    fn per_owner_isolation() {
        let mut slots: OrderSlots<u32> = OrderSlots::new();
        assert_eq!(slots.append(AccountId(1), 1), 0);
        assert_eq!(slots.append(AccountId(2), 2), 0);
        assert_eq!(slots.append(AccountId(1), 3), 1);
        assert_eq!(slots.get(AccountId(2), 0), Some(&2));
        assert_eq!(slots.get(AccountId(3), 0), None);
    }
}
