// 8.10 vault/liquidations.rs: forced closes. three-state health check:
// a position past max leverage but still solvent is decreased at market;
// an insolvent one is seized, its collateral absorbed by the pool and a
// fixed fee paid to whoever pulled the trigger.

use super::core::Vault;
use super::results::{LiquidationResult, LiquidationState, VaultError};
use crate::bank::Bank;
use crate::events::{EventPayload, PositionLiquidatedEvent};
use crate::fees;
use crate::oracle::PriceOracle;
use crate::position::{self, PositionKey};
use crate::types::{AccountId, AssetId, Holder, Side, Usd};

impl Vault {
    // read-only health classification plus the margin fees currently owed
    pub fn liquidation_state(
        &self,
        oracle: &dyn PriceOracle,
        key: &PositionKey,
    ) -> Result<(LiquidationState, Usd), VaultError> {
        let position = self.position(key).ok_or(VaultError::PositionNotFound)?;

        let mark = match key.side {
            Side::Long => self.min_price(oracle, key.index_asset)?,
            Side::Short => self.max_price(oracle, key.index_asset)?,
        };
        let index_config = self.asset_config(key.index_asset)?;
        let delta = position::position_delta(
            position.size,
            position.average_price,
            mark,
            key.side,
            position.last_increased_time,
            index_config.min_profit_bps,
            self.params.min_profit_time_secs,
            self.current_time,
        );

        let cumulative_rate = self.pool(key.collateral_asset)?.cumulative_funding_rate;
        let margin_fees = fees::margin_fee_usd(position.size, self.params.margin_fee_bps).add(
            fees::funding_fee_usd(position.size, cumulative_rate, position.entry_funding_rate),
        );

        if !delta.has_profit && delta.usd > position.collateral {
            return Ok((LiquidationState::Insolvent, margin_fees));
        }

        let remaining = if delta.has_profit {
            position.collateral
        } else {
            position.collateral.sub(delta.usd)
        };

        if remaining < margin_fees {
            return Ok((LiquidationState::Insolvent, margin_fees));
        }
        if remaining < margin_fees.add(self.params.liquidation_fee_usd) {
            return Ok((LiquidationState::Insolvent, margin_fees));
        }
        if position.size.value() > remaining.value() * self.params.max_leverage {
            return Ok((LiquidationState::OverLeveraged, margin_fees));
        }

        Ok((LiquidationState::Healthy, margin_fees))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn liquidate_position(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        caller: AccountId,
        owner: AccountId,
        collateral_asset: AssetId,
        index_asset: AssetId,
        side: Side,
        fee_receiver: Holder,
    ) -> Result<LiquidationResult, VaultError> {
        self.with_guard(|vault| {
            if !vault.params.anyone_can_liquidate && !vault.is_liquidator(caller) {
                return Err(VaultError::UnauthorizedLiquidator(caller));
            }

            vault.update_cumulative_funding_rate(collateral_asset);

            let key = PositionKey {
                owner,
                collateral_asset,
                index_asset,
                side,
            };
            let position = vault
                .positions
                .get(&key)
                .cloned()
                .ok_or(VaultError::PositionNotFound)?;

            let (state, margin_fees) = vault.liquidation_state(oracle, &key)?;

            let mark = match side {
                Side::Long => vault.min_price(oracle, index_asset)?,
                Side::Short => vault.max_price(oracle, index_asset)?,
            };

            match state {
                LiquidationState::Healthy => Err(VaultError::PositionHealthy),

                // solvent but past max leverage: force a market close back
                // to the owner rather than seizing collateral
                LiquidationState::OverLeveraged => {
                    let result = vault.decrease_position_inner(
                        bank,
                        oracle,
                        owner,
                        collateral_asset,
                        index_asset,
                        Usd::zero(),
                        position.size,
                        side,
                        Holder::User(owner),
                    )?;
                    Ok(LiquidationResult {
                        size: position.size,
                        collateral: position.collateral,
                        mark_price: result.price,
                        fee_to_liquidator: crate::types::Amount::zero(),
                        deleveraged: true,
                    })
                }

                LiquidationState::Insolvent => {
                    let collateral_max_price = vault.max_price(oracle, collateral_asset)?;
                    // fee claims cannot exceed what the position actually held
                    let fee_usd = margin_fees.min(position.collateral);
                    let fee_tokens =
                        vault.usd_to_amount(collateral_asset, fee_usd, collateral_max_price)?;
                    let liquidator_fee_tokens = vault.usd_to_amount(
                        collateral_asset,
                        vault.params.liquidation_fee_usd,
                        collateral_max_price,
                    )?;

                    let pool = vault.pool(collateral_asset)?;
                    let total_out = fee_tokens.add(liquidator_fee_tokens);
                    if total_out > pool.pool_amount {
                        return Err(VaultError::PoolExhausted {
                            asset: collateral_asset,
                            requested: total_out,
                            available: pool.pool_amount,
                        });
                    }

                    // commit: the remaining collateral stays in the pool,
                    // absorbing as much of the loss as it can
                    let pool = vault.pool_mut(collateral_asset);
                    pool.pool_amount = pool.pool_amount.sub(total_out);
                    pool.fee_reserves = pool.fee_reserves.add(fee_tokens);
                    pool.reserved_amount = pool.reserved_amount.sub(position.reserve_amount);
                    if side == Side::Long {
                        pool.guaranteed_usd = pool
                            .guaranteed_usd
                            .sub(position.size.sub(position.collateral));
                    } else {
                        let index_pool = vault.pool_mut(index_asset);
                        index_pool.global_short_size =
                            if position.size > index_pool.global_short_size {
                                Usd::zero()
                            } else {
                                index_pool.global_short_size.sub(position.size)
                            };
                        if index_pool.global_short_size.is_zero() {
                            index_pool.global_short_average_price = None;
                        }
                    }

                    vault.positions.remove(&key);

                    vault.transfer_out(
                        bank,
                        collateral_asset,
                        fee_receiver,
                        liquidator_fee_tokens,
                    )?;

                    vault.emit(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
                        owner,
                        collateral_asset,
                        index_asset,
                        side,
                        size: position.size,
                        collateral: position.collateral,
                        mark_price: mark,
                        liquidator: fee_receiver,
                    }));

                    Ok(LiquidationResult {
                        size: position.size,
                        collateral: position.collateral,
                        mark_price: mark,
                        fee_to_liquidator: liquidator_fee_tokens,
                        deleveraged: false,
                    })
                }
            }
        })
    }
}
