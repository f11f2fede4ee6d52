// 2.0: whitelisted assets. AssetConfig is immutable after registration,
// PoolState is the per-asset ledger the vault mutates on every operation.

use crate::types::{Amount, Price, Timestamp, Usd};
use serde::{Deserialize, Serialize};

// Static per-asset configuration, set by an administrative operation and
// read on every valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub id: crate::types::AssetId,
    // display symbol, e.g. "WBTC"
    pub symbol: String,
    // native decimal places; all Amount values for this asset are floored here
    pub decimals: u32,
    // relative weight: target share of total pool value
    pub weight: u64,
    // favorable deltas below this threshold are suppressed until
    // min_profit_time has elapsed since the last increase
    pub min_profit_bps: crate::types::Bps,
    // cap on outstanding accounting-unit liability backed by this asset
    pub max_unit_amount: Usd,
    // stable assets use the stable fee/funding variants and collateralize shorts
    pub is_stable: bool,
    // whether positions may short this asset
    pub is_shortable: bool,
}

// Mutable per-asset pool ledger. at rest the vault's recorded balance for
// the asset equals pool_amount + fee_reserves, exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    // native units held for pooled liquidity and traders' collateral
    pub pool_amount: Amount,
    // native units owed to fee collectors; not part of the pool
    pub fee_reserves: Amount,
    // native units committed against open positions; never exceeds pool_amount
    pub reserved_amount: Amount,
    // USD upside the pool guarantees for longs beyond the traders' own margin
    pub guaranteed_usd: Usd,
    // minimum pool floor enforced on swap exits
    pub buffer_amount: Amount,
    // outstanding accounting-unit liability backed by this asset
    pub unit_amount: Usd,
    // sum of all open short notionals on this index asset
    pub global_short_size: Usd,
    // volume-weighted entry price across those shorts
    pub global_short_average_price: Option<Price>,
    pub cumulative_funding_rate: rust_decimal::Decimal,
    pub last_funding_time: Option<Timestamp>,
}

impl PoolState {
    pub fn new() -> Self {
        Self {
            pool_amount: Amount::zero(),
            fee_reserves: Amount::zero(),
            reserved_amount: Amount::zero(),
            guaranteed_usd: Usd::zero(),
            buffer_amount: Amount::zero(),
            unit_amount: Usd::zero(),
            global_short_size: Usd::zero(),
            global_short_average_price: None,
            cumulative_funding_rate: rust_decimal::Decimal::ZERO,
            last_funding_time: None,
        }
    }

    pub fn utilization(&self) -> rust_decimal::Decimal {
        if self.pool_amount.is_zero() {
            return rust_decimal::Decimal::ZERO;
        }
        self.reserved_amount.value() / self.pool_amount.value()
    }
}

impl Default for PoolState {
    fn default() -> Self {
        Self::new()
    }
}
