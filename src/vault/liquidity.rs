// 8.7 vault/liquidity.rs: pool entry and exit. deposits value at the
// minimum price and redemptions at the maximum, so the pool never overpays
// in either direction. the dynamic mint/burn fee prices pool balance.

use super::core::{Vault, UNIT_DECIMALS};
use super::results::{SupplyResult, VaultError, WithdrawResult};
use crate::bank::Bank;
use crate::events::{
    EventPayload, FeesWithdrawnEvent, LiquiditySuppliedEvent, LiquidityWithdrawnEvent,
};
use crate::oracle::PriceOracle;
use crate::types::{floor_to_dp, AccountId, Amount, AssetId, Holder, Usd};

impl Vault {
    // deposit `asset` (sent to the vault beforehand), mint accounting units
    // to `recipient` for the post-fee USD value.
    pub fn supply_liquidity(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        asset: AssetId,
        recipient: AccountId,
    ) -> Result<SupplyResult, VaultError> {
        self.with_guard(|vault| {
            let config = vault.asset_config(asset)?;
            let decimals = config.decimals;
            let max_unit_amount = config.max_unit_amount;

            let amount_in = vault.pending_in(bank, asset);
            if amount_in.is_zero() {
                return Err(VaultError::ZeroAmountIn);
            }

            vault.update_cumulative_funding_rate(asset);

            let price = vault.min_price(oracle, asset)?;
            let usd_delta = vault.amount_to_usd(amount_in, price);
            let fee_bps = vault.mint_burn_fee_bps(asset, usd_delta, true)?;

            let fee_amount = Amount::new(floor_to_dp(
                fee_bps.of_amount(amount_in).value(),
                decimals,
            ));
            let after_fee = amount_in.sub(fee_amount);
            let minted_usd = Usd::new(floor_to_dp(
                vault.amount_to_usd(after_fee, price).value(),
                UNIT_DECIMALS,
            ));
            if minted_usd.is_zero() {
                return Err(VaultError::ZeroMintAmount);
            }

            let pool = vault.pool(asset)?;
            let next_unit_amount = pool.unit_amount.add(minted_usd);
            if !max_unit_amount.is_zero() && next_unit_amount > max_unit_amount {
                return Err(VaultError::UnitCapExceeded {
                    asset,
                    attempted: next_unit_amount,
                    cap: max_unit_amount,
                });
            }

            // commit
            vault.settle_in(bank, asset);
            let pool = vault.pool_mut(asset);
            pool.pool_amount = pool.pool_amount.add(after_fee);
            pool.fee_reserves = pool.fee_reserves.add(fee_amount);
            pool.unit_amount = next_unit_amount;
            vault.unit_supply = vault.unit_supply.add(minted_usd);

            let unit_asset = vault.unit_asset;
            bank.mint(
                unit_asset,
                Holder::User(recipient),
                Amount::new(minted_usd.value()),
            );

            vault.emit(EventPayload::LiquiditySupplied(LiquiditySuppliedEvent {
                asset,
                recipient,
                amount_in,
                minted_usd,
                fee_bps,
            }));

            Ok(SupplyResult {
                amount_in,
                minted_usd,
                fee_bps,
                fee_amount,
            })
        })
    }

    // burn the accounting units sent to the vault beforehand and redeem the
    // backing asset at the maximum price. the reserve invariant is the pool
    // floor here.
    pub fn withdraw_liquidity(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        asset: AssetId,
        recipient: AccountId,
    ) -> Result<WithdrawResult, VaultError> {
        self.with_guard(|vault| {
            let config = vault.asset_config(asset)?;
            let decimals = config.decimals;

            let unit_asset = vault.unit_asset;
            let unit_in = vault.pending_in(bank, unit_asset);
            if unit_in.is_zero() {
                return Err(VaultError::ZeroAmountIn);
            }
            let burned_usd = Usd::new(unit_in.value());

            vault.update_cumulative_funding_rate(asset);

            let price = vault.max_price(oracle, asset)?;
            let redemption = vault.usd_to_amount(asset, burned_usd, price)?;
            if redemption.is_zero() {
                return Err(VaultError::ZeroRedemptionAmount);
            }

            let fee_bps = vault.mint_burn_fee_bps(asset, burned_usd, false)?;
            let fee_amount = Amount::new(floor_to_dp(
                fee_bps.of_amount(redemption).value(),
                decimals,
            ));
            let amount_out = redemption.sub(fee_amount);
            if amount_out.is_zero() {
                return Err(VaultError::ZeroRedemptionAmount);
            }

            let pool = vault.pool(asset)?;
            if redemption > pool.pool_amount {
                return Err(VaultError::PoolExhausted {
                    asset,
                    requested: redemption,
                    available: pool.pool_amount,
                });
            }
            let next_pool = pool.pool_amount.sub(redemption);
            if pool.reserved_amount > next_pool {
                return Err(VaultError::ReserveExceedsPool {
                    asset,
                    attempted: pool.reserved_amount,
                    available: next_pool,
                });
            }

            // commit
            vault.settle_in(bank, unit_asset);
            bank.burn(unit_asset, Holder::Vault, unit_in)?;
            // the burned units are gone from the vault's balance as well
            let recorded = vault
                .recorded_balances
                .get(&unit_asset)
                .copied()
                .unwrap_or(Amount::zero());
            vault
                .recorded_balances
                .insert(unit_asset, recorded.sub(unit_in));

            let pool = vault.pool_mut(asset);
            pool.pool_amount = next_pool;
            pool.fee_reserves = pool.fee_reserves.add(fee_amount);
            if burned_usd > pool.unit_amount {
                pool.unit_amount = Usd::zero();
            } else {
                pool.unit_amount = pool.unit_amount.sub(burned_usd);
            }
            vault.unit_supply = if burned_usd > vault.unit_supply {
                Usd::zero()
            } else {
                vault.unit_supply.sub(burned_usd)
            };

            vault.transfer_out(bank, asset, Holder::User(recipient), amount_out)?;

            vault.emit(EventPayload::LiquidityWithdrawn(LiquidityWithdrawnEvent {
                asset,
                recipient,
                burned_usd,
                amount_out,
                fee_bps,
            }));

            Ok(WithdrawResult {
                burned_usd,
                amount_out,
                fee_bps,
                fee_amount,
            })
        })
    }

    // drain accumulated fee reserves to a collector. the only admin
    // operation that moves vault balance.
    pub fn withdraw_fees(
        &mut self,
        bank: &mut Bank,
        asset: AssetId,
        recipient: Holder,
    ) -> Result<Amount, VaultError> {
        self.with_guard(|vault| {
            vault.asset_config(asset)?;
            let amount = vault.pool(asset)?.fee_reserves;
            if amount.is_zero() {
                return Ok(Amount::zero());
            }

            vault.pool_mut(asset).fee_reserves = Amount::zero();
            vault.transfer_out(bank, asset, recipient, amount)?;

            vault.emit(EventPayload::FeesWithdrawn(FeesWithdrawnEvent {
                asset,
                amount,
                recipient,
            }));

            Ok(amount)
        })
    }
}
