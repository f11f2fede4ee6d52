// 8.8 vault/swap.rs: pool-to-pool swap. in-leg valued at its minimum price,
// out-leg at its maximum; the fee is the worse of the two legs' dynamic
// rates and is collected on the output side.

use super::core::Vault;
use super::results::{SwapResult, VaultError};
use crate::bank::Bank;
use crate::events::{EventPayload, SwapEvent};
use crate::fees;
use crate::oracle::PriceOracle;
use crate::types::{floor_to_dp, Amount, AssetId, Holder, Usd};
use std::collections::HashMap;

impl Vault {
    // 8.8.1: dry-run of a swap path (2 or 3 hops). runs the same math and
    // the same solvency checks as the real legs, with unit-amount overlays
    // standing in for the mutations earlier legs would commit, so callers
    // can gate on the realizable output without touching state.
    pub fn preview_swap_path(
        &self,
        oracle: &dyn PriceOracle,
        path: &[AssetId],
        amount_in: Amount,
    ) -> Result<Amount, VaultError> {
        let mut overlays: HashMap<AssetId, Usd> = HashMap::new();
        let mut current = amount_in;
        for pair in path.windows(2) {
            current = self.preview_leg(oracle, pair[0], pair[1], current, &mut overlays)?;
        }
        Ok(current)
    }

    fn preview_leg(
        &self,
        oracle: &dyn PriceOracle,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: Amount,
        overlays: &mut HashMap<AssetId, Usd>,
    ) -> Result<Amount, VaultError> {
        if !self.params.swap_enabled {
            return Err(VaultError::SwapsDisabled);
        }
        if asset_in == asset_out {
            return Err(VaultError::IdenticalAssets(asset_in));
        }
        let in_config = self.asset_config(asset_in)?;
        let out_config = self.asset_config(asset_out)?;
        if amount_in.is_zero() {
            return Err(VaultError::ZeroAmountIn);
        }

        let price_in = self.min_price(oracle, asset_in)?;
        let price_out = self.max_price(oracle, asset_out)?;
        let usd_delta = self.amount_to_usd(amount_in, price_in);
        let amount_out = self.usd_to_amount(asset_out, usd_delta, price_out)?;
        if amount_out.is_zero() {
            return Err(VaultError::ZeroSwapOutput);
        }

        let unit_in = *overlays
            .entry(asset_in)
            .or_insert(self.pool(asset_in)?.unit_amount);
        let unit_out = *overlays
            .entry(asset_out)
            .or_insert(self.pool(asset_out)?.unit_amount);

        let (base, tax) = fees::swap_fee_rates(in_config.is_stable, out_config.is_stable, &self.params);
        let leg_in = fees::dynamic_fee_bps(
            unit_in,
            self.target_unit_amount(asset_in)?,
            usd_delta,
            true,
            base,
            tax,
            self.params.dynamic_fees,
        );
        let leg_out = fees::dynamic_fee_bps(
            unit_out,
            self.target_unit_amount(asset_out)?,
            usd_delta,
            false,
            base,
            tax,
            self.params.dynamic_fees,
        );
        let fee_bps = leg_in.max(leg_out);

        let fee_amount = Amount::new(floor_to_dp(
            fee_bps.of_amount(amount_out).value(),
            out_config.decimals,
        ));
        let after_fee = amount_out.sub(fee_amount);
        if after_fee.is_zero() {
            return Err(VaultError::ZeroSwapOutput);
        }

        let in_cap = in_config.max_unit_amount;
        let next_unit_in = unit_in.add(usd_delta);
        if !in_cap.is_zero() && next_unit_in > in_cap {
            return Err(VaultError::UnitCapExceeded {
                asset: asset_in,
                attempted: next_unit_in,
                cap: in_cap,
            });
        }

        let pool_out = self.pool(asset_out)?;
        if amount_out > pool_out.pool_amount {
            return Err(VaultError::PoolExhausted {
                asset: asset_out,
                requested: amount_out,
                available: pool_out.pool_amount,
            });
        }
        let next_pool_out = pool_out.pool_amount.sub(amount_out);
        if pool_out.reserved_amount > next_pool_out {
            return Err(VaultError::ReserveExceedsPool {
                asset: asset_out,
                attempted: pool_out.reserved_amount,
                available: next_pool_out,
            });
        }
        if next_pool_out < pool_out.buffer_amount {
            return Err(VaultError::PoolBelowBuffer {
                asset: asset_out,
                attempted: next_pool_out,
                buffer: pool_out.buffer_amount,
            });
        }

        overlays.insert(asset_in, next_unit_in);
        overlays.insert(
            asset_out,
            if usd_delta > unit_out {
                Usd::zero()
            } else {
                unit_out.sub(usd_delta)
            },
        );

        Ok(after_fee)
    }
    pub fn swap(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        asset_in: AssetId,
        asset_out: AssetId,
        receiver: Holder,
    ) -> Result<SwapResult, VaultError> {
        self.with_guard(|vault| {
            if !vault.params.swap_enabled {
                return Err(VaultError::SwapsDisabled);
            }
            if asset_in == asset_out {
                return Err(VaultError::IdenticalAssets(asset_in));
            }
            vault.asset_config(asset_in)?;
            let out_decimals = vault.asset_config(asset_out)?.decimals;

            let amount_in = vault.pending_in(bank, asset_in);
            if amount_in.is_zero() {
                return Err(VaultError::ZeroAmountIn);
            }

            vault.update_cumulative_funding_rate(asset_in);
            vault.update_cumulative_funding_rate(asset_out);

            let price_in = vault.min_price(oracle, asset_in)?;
            let price_out = vault.max_price(oracle, asset_out)?;

            let usd_delta = vault.amount_to_usd(amount_in, price_in);
            let amount_out = vault.usd_to_amount(asset_out, usd_delta, price_out)?;
            if amount_out.is_zero() {
                return Err(VaultError::ZeroSwapOutput);
            }

            // rates computed strictly from pre-swap unit amounts
            let fee_bps = vault.swap_fee_bps(asset_in, asset_out, usd_delta)?;
            let fee_amount = Amount::new(floor_to_dp(
                fee_bps.of_amount(amount_out).value(),
                out_decimals,
            ));
            let after_fee = amount_out.sub(fee_amount);
            if after_fee.is_zero() {
                return Err(VaultError::ZeroSwapOutput);
            }

            let in_cap = vault.asset_config(asset_in)?.max_unit_amount;
            let pool_in = vault.pool(asset_in)?;
            let next_unit_in = pool_in.unit_amount.add(usd_delta);
            if !in_cap.is_zero() && next_unit_in > in_cap {
                return Err(VaultError::UnitCapExceeded {
                    asset: asset_in,
                    attempted: next_unit_in,
                    cap: in_cap,
                });
            }

            let pool_out = vault.pool(asset_out)?;
            if amount_out > pool_out.pool_amount {
                return Err(VaultError::PoolExhausted {
                    asset: asset_out,
                    requested: amount_out,
                    available: pool_out.pool_amount,
                });
            }
            let next_pool_out = pool_out.pool_amount.sub(amount_out);
            if pool_out.reserved_amount > next_pool_out {
                return Err(VaultError::ReserveExceedsPool {
                    asset: asset_out,
                    attempted: pool_out.reserved_amount,
                    available: next_pool_out,
                });
            }
            if next_pool_out < pool_out.buffer_amount {
                return Err(VaultError::PoolBelowBuffer {
                    asset: asset_out,
                    attempted: next_pool_out,
                    buffer: pool_out.buffer_amount,
                });
            }

            // commit
            vault.settle_in(bank, asset_in);

            let pool_in = vault.pool_mut(asset_in);
            pool_in.pool_amount = pool_in.pool_amount.add(amount_in);
            pool_in.unit_amount = next_unit_in;

            let pool_out = vault.pool_mut(asset_out);
            pool_out.pool_amount = next_pool_out;
            pool_out.fee_reserves = pool_out.fee_reserves.add(fee_amount);
            pool_out.unit_amount = if usd_delta > pool_out.unit_amount {
                Usd::zero()
            } else {
                pool_out.unit_amount.sub(usd_delta)
            };

            vault.transfer_out(bank, asset_out, receiver, after_fee)?;

            vault.emit(EventPayload::Swap(SwapEvent {
                asset_in,
                asset_out,
                receiver,
                amount_in,
                amount_out: after_fee,
                fee_bps,
            }));

            Ok(SwapResult {
                amount_in,
                amount_out: after_fee,
                fee_bps,
                fee_amount,
            })
        })
    }
}
