// 8.4 vault/pricing.rs: read-only valuation. price lookups always pick the
// side least favorable to the pool; usd->amount conversions floor to the
// asset's decimals.

use super::core::Vault;
use super::results::VaultError;
use crate::fees;
use crate::oracle::PriceOracle;
use crate::position::{self, Delta, PositionKey};
use crate::types::{floor_to_dp, Amount, AssetId, Bps, Price, Side, Usd};

impl Vault {
    pub(super) fn min_price(
        &self,
        oracle: &dyn PriceOracle,
        asset: AssetId,
    ) -> Result<Price, VaultError> {
        Ok(oracle.price(asset, false)?)
    }

    pub(super) fn max_price(
        &self,
        oracle: &dyn PriceOracle,
        asset: AssetId,
    ) -> Result<Price, VaultError> {
        Ok(oracle.price(asset, true)?)
    }

    pub fn amount_to_usd(&self, amount: Amount, price: Price) -> Usd {
        Usd::new(amount.value() * price.value())
    }

    // floors, so the vault never hands out more native units than the USD
    // value covers
    pub fn usd_to_amount(&self, asset: AssetId, usd: Usd, price: Price) -> Result<Amount, VaultError> {
        let config = self.asset_config(asset)?;
        Ok(Amount::new(floor_to_dp(
            usd.value() / price.value(),
            config.decimals,
        )))
    }

    // target accounting-unit amount for an asset given current supply
    pub fn target_unit_amount(&self, asset: AssetId) -> Result<Usd, VaultError> {
        let config = self.asset_config(asset)?;
        Ok(fees::target_unit_amount(
            self.unit_supply,
            config.weight,
            self.total_weights,
        ))
    }

    // dynamic rate for minting/burning against one asset
    pub fn mint_burn_fee_bps(
        &self,
        asset: AssetId,
        usd_delta: Usd,
        increment: bool,
    ) -> Result<Bps, VaultError> {
        let pool = self.pool(asset)?;
        Ok(fees::dynamic_fee_bps(
            pool.unit_amount,
            self.target_unit_amount(asset)?,
            usd_delta,
            increment,
            self.params.mint_burn_fee_bps,
            self.params.tax_bps,
            self.params.dynamic_fees,
        ))
    }

    // the swap rate is the worse of the two legs: the in-leg grows its
    // asset's unit amount, the out-leg shrinks its own
    pub fn swap_fee_bps(
        &self,
        asset_in: AssetId,
        asset_out: AssetId,
        usd_delta: Usd,
    ) -> Result<Bps, VaultError> {
        let in_stable = self.asset_config(asset_in)?.is_stable;
        let out_stable = self.asset_config(asset_out)?.is_stable;
        let (base, tax) = fees::swap_fee_rates(in_stable, out_stable, &self.params);

        let leg_in = fees::dynamic_fee_bps(
            self.pool(asset_in)?.unit_amount,
            self.target_unit_amount(asset_in)?,
            usd_delta,
            true,
            base,
            tax,
            self.params.dynamic_fees,
        );
        let leg_out = fees::dynamic_fee_bps(
            self.pool(asset_out)?.unit_amount,
            self.target_unit_amount(asset_out)?,
            usd_delta,
            false,
            base,
            tax,
            self.params.dynamic_fees,
        );
        Ok(leg_in.max(leg_out))
    }

    // unrealized delta for an open position at current oracle prices
    pub fn position_delta(
        &self,
        oracle: &dyn PriceOracle,
        key: &PositionKey,
    ) -> Result<Delta, VaultError> {
        let position = self.position(key).ok_or(VaultError::PositionNotFound)?;
        let mark = match key.side {
            Side::Long => self.min_price(oracle, key.index_asset)?,
            Side::Short => self.max_price(oracle, key.index_asset)?,
        };
        let config = self.asset_config(key.index_asset)?;
        Ok(position::position_delta(
            position.size,
            position.average_price,
            mark,
            key.side,
            position.last_increased_time,
            config.min_profit_bps,
            self.params.min_profit_time_secs,
            self.current_time,
        ))
    }

    // 8.5: pool valuation. stables count at face; other assets count their
    // unreserved pool value plus the USD the pool has guaranteed to longs,
    // with aggregate short PnL folded in from the global short ledger.
    pub fn aum(&self, oracle: &dyn PriceOracle, maximize: bool) -> Result<Usd, VaultError> {
        let mut aum = Usd::zero();

        for asset in &self.asset_order {
            let config = &self.assets[asset];
            let pool = &self.pools[asset];
            let price = oracle.price(*asset, maximize)?;

            if config.is_stable {
                aum = aum.add(self.amount_to_usd(pool.pool_amount, price));
                continue;
            }

            aum = aum.add(pool.guaranteed_usd);
            let unreserved = pool.pool_amount.sub(pool.reserved_amount);
            aum = aum.add(self.amount_to_usd(unreserved, price));

            if !pool.global_short_size.is_zero() {
                if let Some(average) = pool.global_short_average_price {
                    let price_delta = (average.value() - price.value()).abs();
                    let delta = Usd::new(
                        pool.global_short_size.value() * price_delta / average.value(),
                    );
                    if price.value() > average.value() {
                        // shorts under water: their loss accrues to the pool
                        aum = aum.add(delta);
                    } else {
                        aum = aum.sub(delta);
                    }
                }
            }
        }

        Ok(aum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetConfig;
    use crate::config::VaultParams;
    use crate::types::AssetId;
    use rust_decimal_macros::dec;

    fn test_vault() -> Vault {
        let mut vault = Vault::new(VaultParams::default(), AssetId(0));
        vault.register_asset(AssetConfig {
            id: AssetId(1),
            symbol: "WBTC".to_string(),
            decimals: 8,
            weight: 50,
            min_profit_bps: Bps::zero(),
            max_unit_amount: Usd::zero(),
            is_stable: false,
            is_shortable: true,
        });
        vault
    }

    #[test]
    fn usd_to_amount_floors_to_decimals() {
        let vault = test_vault();
        let amount = vault
            .usd_to_amount(
                AssetId(1),
                Usd::new(dec!(100)),
                Price::new_unchecked(dec!(30000)),
            )
            .unwrap();
        // 100/30000 = 0.00333333... floored at 8 dp
        assert_eq!(amount.value(), dec!(0.00333333));
    }

    #[test]
    fn amount_round_trip_never_gains() {
        let vault = test_vault();
        let price = Price::new_unchecked(dec!(41234.56));
        let usd = Usd::new(dec!(987.65));
        let amount = vault.usd_to_amount(AssetId(1), usd, price).unwrap();
        assert!(vault.amount_to_usd(amount, price) <= usd);
    }
}
