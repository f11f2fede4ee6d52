// 8.1 vault/core.rs: the vault service. owns the asset registry, the pool
// ledgers, the position map and the vault's view of its own bank balances.
// operation modules (liquidity, swap, positions, ...) hang methods off this.

use super::results::VaultError;
use crate::asset::{AssetConfig, PoolState};
use crate::bank::Bank;
use crate::config::VaultParams;
use crate::events::{EventLog, EventPayload};
use crate::position::{Position, PositionKey};
use crate::types::{AccountId, Amount, AssetId, Holder, Timestamp, Usd};
use std::collections::{HashMap, HashSet};

// accounting-unit granularity in the bank
pub(super) const UNIT_DECIMALS: u32 = 18;

#[derive(Debug)]
pub struct Vault {
    pub(super) params: VaultParams,
    // bank asset id of the accounting-unit liability this vault mints
    pub(super) unit_asset: AssetId,
    pub(super) assets: HashMap<AssetId, AssetConfig>,
    pub(super) pools: HashMap<AssetId, PoolState>,
    // registration order, for deterministic valuation sweeps
    pub(super) asset_order: Vec<AssetId>,
    pub(super) total_weights: u64,
    // total outstanding accounting-unit liability across all assets
    pub(super) unit_supply: Usd,
    pub(super) positions: HashMap<PositionKey, Position>,
    // last observed own balance per asset; transfer_in derives amounts sent
    // to the vault from the delta against this
    pub(super) recorded_balances: HashMap<AssetId, Amount>,
    pub(super) max_global_short_sizes: HashMap<AssetId, Usd>,
    pub(super) liquidators: HashSet<AccountId>,
    // re-entrancy latch: mutating operations refuse nested entry
    pub(super) entered: bool,
    pub(super) log: EventLog,
    pub(super) current_time: Timestamp,
}

impl Vault {
    pub fn new(params: VaultParams, unit_asset: AssetId) -> Self {
        let log = EventLog::new(params.max_events, params.verbose);
        Self {
            log,
            params,
            unit_asset,
            assets: HashMap::new(),
            pools: HashMap::new(),
            asset_order: Vec::new(),
            total_weights: 0,
            unit_supply: Usd::zero(),
            positions: HashMap::new(),
            recorded_balances: HashMap::new(),
            max_global_short_sizes: HashMap::new(),
            liquidators: HashSet::new(),
            entered: false,
            current_time: Timestamp::from_secs(0),
        }
    }

    pub fn params(&self) -> &VaultParams {
        &self.params
    }

    pub fn unit_asset(&self) -> AssetId {
        self.unit_asset
    }

    pub fn unit_supply(&self) -> Usd {
        self.unit_supply
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: i64) {
        self.current_time = self.current_time.plus_secs(secs);
    }

    // registers or re-registers an asset. re-registration replaces the
    // config but keeps the pool ledger.
    pub fn register_asset(&mut self, config: AssetConfig) {
        let id = config.id;
        if let Some(previous) = self.assets.insert(id, config) {
            self.total_weights -= previous.weight;
        } else {
            self.asset_order.push(id);
            self.pools.insert(id, PoolState::new());
        }
        self.total_weights += self.assets[&id].weight;
    }

    pub fn is_whitelisted(&self, asset: AssetId) -> bool {
        self.assets.contains_key(&asset)
    }

    pub fn asset_config(&self, asset: AssetId) -> Result<&AssetConfig, VaultError> {
        self.assets
            .get(&asset)
            .ok_or(VaultError::AssetNotWhitelisted(asset))
    }

    pub fn pool(&self, asset: AssetId) -> Result<&PoolState, VaultError> {
        self.pools
            .get(&asset)
            .ok_or(VaultError::AssetNotWhitelisted(asset))
    }

    pub(super) fn pool_mut(&mut self, asset: AssetId) -> &mut PoolState {
        self.pools.get_mut(&asset).expect("pool exists for whitelisted asset")
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = (&PositionKey, &Position)> {
        self.positions.iter()
    }

    pub fn set_buffer_amount(&mut self, asset: AssetId, amount: Amount) -> Result<(), VaultError> {
        self.asset_config(asset)?;
        self.pool_mut(asset).buffer_amount = amount;
        Ok(())
    }

    pub fn set_max_global_short_size(&mut self, asset: AssetId, cap: Usd) {
        self.max_global_short_sizes.insert(asset, cap);
    }

    pub fn max_global_short_size(&self, asset: AssetId) -> Option<Usd> {
        self.max_global_short_sizes.get(&asset).copied()
    }

    pub fn add_liquidator(&mut self, account: AccountId) {
        self.liquidators.insert(account);
    }

    pub fn remove_liquidator(&mut self, account: AccountId) {
        self.liquidators.remove(&account);
    }

    pub fn is_liquidator(&self, account: AccountId) -> bool {
        self.liquidators.contains(&account)
    }

    pub fn set_swap_enabled(&mut self, enabled: bool) {
        self.params.swap_enabled = enabled;
    }

    pub fn set_leverage_enabled(&mut self, enabled: bool) {
        self.params.leverage_enabled = enabled;
    }

    // 8.2: re-entrancy latch. all mutating operations run through here; a
    // nested call observes `entered` and aborts before touching state.
    pub(super) fn with_guard<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        if self.entered {
            return Err(VaultError::Reentered);
        }
        self.entered = true;
        let result = f(self);
        self.entered = false;
        result
    }

    // 8.3: transfer-in pattern. callers move value to the vault first; the
    // operation derives the amount from the balance delta. pending_in only
    // reads; settle_in records the new balance and is called once all
    // validations have passed, so a failed operation leaves the sent value
    // claimable by a retry instead of silently absorbing it.
    pub(super) fn pending_in(&self, bank: &Bank, asset: AssetId) -> Amount {
        let balance = bank.balance(asset, Holder::Vault);
        let recorded = self
            .recorded_balances
            .get(&asset)
            .copied()
            .unwrap_or(Amount::zero());
        balance.sub(recorded)
    }

    pub(super) fn settle_in(&mut self, bank: &Bank, asset: AssetId) {
        let balance = bank.balance(asset, Holder::Vault);
        self.recorded_balances.insert(asset, balance);
    }

    // the only way value leaves the vault. ledger mutations are always
    // committed before this is called.
    pub(super) fn transfer_out(
        &mut self,
        bank: &mut Bank,
        asset: AssetId,
        to: Holder,
        amount: Amount,
    ) -> Result<(), VaultError> {
        bank.transfer(asset, Holder::Vault, to, amount)?;
        let recorded = self
            .recorded_balances
            .get(&asset)
            .copied()
            .unwrap_or(Amount::zero());
        self.recorded_balances.insert(asset, recorded.sub(amount));
        Ok(())
    }

    pub(super) fn emit(&mut self, payload: EventPayload) {
        let timestamp = self.current_time;
        self.log.emit(timestamp, payload);
    }

    pub fn events(&self) -> &[crate::events::Event] {
        self.log.events()
    }

    pub fn recent_events(&self, count: usize) -> &[crate::events::Event] {
        self.log.recent(count)
    }

    // audit hook for tests: the at-rest identity. the vault's recorded
    // balance must equal pool_amount + fee_reserves exactly; the bank
    // balance may only exceed it by value sent ahead of an operation that
    // has not absorbed it yet (an aborted call leaves it claimable).
    pub fn pool_identity_holds(&self, bank: &Bank, asset: AssetId) -> bool {
        match self.pools.get(&asset) {
            Some(pool) => {
                let recorded = self
                    .recorded_balances
                    .get(&asset)
                    .copied()
                    .unwrap_or(Amount::zero());
                recorded.value() == pool.pool_amount.value() + pool.fee_reserves.value()
                    && bank.balance(asset, Holder::Vault) >= recorded
            }
            None => true,
        }
    }
}
