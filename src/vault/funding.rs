// 8.6 vault/funding.rs: funding accrual on the service. every position
// operation calls this before using entry-rate deltas; skipping it would
// silently under- or over-charge funding fees.

use super::core::Vault;
use crate::events::{EventPayload, FundingUpdatedEvent};
use crate::funding;
use crate::types::AssetId;
use rust_decimal::Decimal;

impl Vault {
    pub fn update_cumulative_funding_rate(&mut self, asset: AssetId) {
        let Some(pool) = self.pools.get(&asset) else {
            return;
        };
        let config = &self.assets[&asset];

        let factor = if config.is_stable {
            self.params.stable_funding_rate_factor
        } else {
            self.params.funding_rate_factor
        };

        let Some(accrual) = funding::accrue(
            pool.last_funding_time,
            self.current_time,
            self.params.funding_interval_secs,
            pool.reserved_amount,
            pool.pool_amount,
            factor,
        ) else {
            return;
        };

        let pool = self.pool_mut(asset);
        pool.cumulative_funding_rate += accrual.rate_added;
        pool.last_funding_time = Some(accrual.last_funding_time);
        let cumulative = pool.cumulative_funding_rate;

        if accrual.rate_added > Decimal::ZERO {
            self.emit(EventPayload::FundingUpdated(FundingUpdatedEvent {
                asset,
                rate_added: accrual.rate_added,
                cumulative_rate: cumulative,
            }));
        }
    }
}
