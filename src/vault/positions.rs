// 8.9 vault/positions.rs: the leveraged position lifecycle. increase blends
// entry prices and reserves pool backing for the full notional; decrease
// realizes pnl pro-rata and releases backing. collateral for both sides
// lives inside pool_amount so the pool balance identity stays exact.

use super::core::Vault;
use super::results::{DecreaseResult, IncreaseResult, VaultError};
use crate::bank::Bank;
use crate::events::{EventPayload, PositionDecreasedEvent, PositionIncreasedEvent};
use crate::fees;
use crate::oracle::PriceOracle;
use crate::position::{self, Position, PositionKey};
use crate::types::{floor_to_dp, AccountId, Amount, AssetId, Holder, Side, Usd};
use rust_decimal::Decimal;

impl Vault {
    // 8.9.1: open or grow a position. collateral is whatever was
    // transferred in beforehand, valued at its minimum price.
    #[allow(clippy::too_many_arguments)]
    pub fn increase_position(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        owner: AccountId,
        collateral_asset: AssetId,
        index_asset: AssetId,
        size_delta: Usd,
        side: Side,
    ) -> Result<IncreaseResult, VaultError> {
        self.with_guard(|vault| {
            if !vault.params.leverage_enabled {
                return Err(VaultError::LeverageDisabled);
            }
            vault.validate_position_assets(collateral_asset, index_asset, side)?;

            vault.update_cumulative_funding_rate(collateral_asset);

            let key = PositionKey {
                owner,
                collateral_asset,
                index_asset,
                side,
            };
            let existing = vault.positions.get(&key).cloned();
            let (size, collateral, reserve_amount, average_price) = match &existing {
                Some(p) => (p.size, p.collateral, p.reserve_amount, p.average_price),
                None => (
                    Usd::zero(),
                    Usd::zero(),
                    Amount::zero(),
                    // placeholder until the entry price is taken below
                    vault.max_price(oracle, index_asset)?,
                ),
            };

            // entry is marked against the trader: longs enter at the
            // maximum price, shorts at the minimum
            let price = match side {
                Side::Long => vault.max_price(oracle, index_asset)?,
                Side::Short => vault.min_price(oracle, index_asset)?,
            };

            let index_config = vault.asset_config(index_asset)?;
            let next_average_price = if size.is_zero() {
                price
            } else if size_delta.is_zero() {
                average_price
            } else {
                position::next_average_price(
                    size,
                    average_price,
                    price,
                    size_delta,
                    side,
                    existing.as_ref().map(|p| p.last_increased_time).unwrap(),
                    index_config.min_profit_bps,
                    vault.params.min_profit_time_secs,
                    vault.current_time,
                )
            };

            let cumulative_rate = vault.pool(collateral_asset)?.cumulative_funding_rate;
            let entry_rate = existing
                .as_ref()
                .map(|p| p.entry_funding_rate)
                .unwrap_or(cumulative_rate);
            let fee = fees::margin_fee_usd(size_delta, vault.params.margin_fee_bps)
                .add(fees::funding_fee_usd(size, cumulative_rate, entry_rate));

            let collateral_amount = vault.pending_in(bank, collateral_asset);
            let collateral_min_price = vault.min_price(oracle, collateral_asset)?;
            let collateral_delta_usd = vault.amount_to_usd(collateral_amount, collateral_min_price);

            let funded = collateral.add(collateral_delta_usd);
            if funded < fee {
                return Err(VaultError::InsufficientCollateralForFees {
                    collateral: funded,
                    fee,
                });
            }
            let next_collateral = funded.sub(fee);

            let next_size = size.add(size_delta);
            if next_size.is_zero() {
                return Err(VaultError::EmptyPosition);
            }
            if next_collateral.is_zero() {
                return Err(VaultError::InsufficientCollateralForFees {
                    collateral: funded,
                    fee,
                });
            }
            if next_size < next_collateral {
                return Err(VaultError::SizeBelowCollateral {
                    size: next_size,
                    collateral: next_collateral,
                });
            }
            if next_size.value() > next_collateral.value() * vault.params.max_leverage {
                return Err(VaultError::MaxLeverageExceeded {
                    size: next_size,
                    collateral: next_collateral,
                });
            }

            // reserve the whole notional in collateral tokens, priced
            // conservatively (minimum price -> more tokens held back)
            let reserve_delta =
                vault.usd_to_amount(collateral_asset, size_delta, collateral_min_price)?;
            let collateral_max_price = vault.max_price(oracle, collateral_asset)?;
            let fee_tokens = vault.usd_to_amount(collateral_asset, fee, collateral_max_price)?;

            let pool = vault.pool(collateral_asset)?;
            let next_pool = pool.pool_amount.add(collateral_amount).sub(fee_tokens);
            let next_reserved = pool.reserved_amount.add(reserve_delta);
            if next_reserved > next_pool {
                return Err(VaultError::ReserveExceedsPool {
                    asset: collateral_asset,
                    attempted: next_reserved,
                    available: next_pool,
                });
            }

            // shorts move the global book; validate the cap before commit
            let next_global_short = if side == Side::Long {
                None
            } else {
                let index_pool = vault.pool(index_asset)?;
                let next_size_total = index_pool.global_short_size.add(size_delta);
                if let Some(cap) = vault.max_global_short_size(index_asset) {
                    if !cap.is_zero() && next_size_total > cap {
                        return Err(VaultError::MaxGlobalShortExceeded {
                            asset: index_asset,
                            attempted: next_size_total,
                            cap,
                        });
                    }
                }
                let next_average = match index_pool.global_short_average_price {
                    Some(average) if !index_pool.global_short_size.is_zero() => {
                        position::next_global_short_average_price(
                            index_pool.global_short_size,
                            average,
                            price,
                            size_delta,
                        )
                    }
                    _ => price,
                };
                Some((next_size_total, next_average))
            };

            // commit
            vault.settle_in(bank, collateral_asset);

            let pool = vault.pool_mut(collateral_asset);
            pool.pool_amount = next_pool;
            pool.fee_reserves = pool.fee_reserves.add(fee_tokens);
            pool.reserved_amount = next_reserved;
            if side == Side::Long {
                pool.guaranteed_usd = pool
                    .guaranteed_usd
                    .add(size_delta)
                    .add(fee)
                    .sub(collateral_delta_usd);
            }

            if let Some((global_size, global_average)) = next_global_short {
                let index_pool = vault.pool_mut(index_asset);
                index_pool.global_short_size = global_size;
                index_pool.global_short_average_price = Some(global_average);
            }

            let timestamp = vault.current_time;
            let position = Position {
                size: next_size,
                collateral: next_collateral,
                average_price: next_average_price,
                entry_funding_rate: cumulative_rate,
                reserve_amount: reserve_amount.add(reserve_delta),
                realized_pnl: existing.map(|p| p.realized_pnl).unwrap_or(Decimal::ZERO),
                last_increased_time: timestamp,
            };
            vault.positions.insert(key, position);

            vault.emit(EventPayload::PositionIncreased(PositionIncreasedEvent {
                owner,
                collateral_asset,
                index_asset,
                side,
                size_delta,
                collateral_delta: collateral_delta_usd,
                price,
                fee,
            }));

            Ok(IncreaseResult {
                price,
                collateral_delta: collateral_delta_usd,
                fee,
                size: next_size,
            })
        })
    }

    // 8.9.2: shrink or close a position, realizing pnl on the closed slice.
    #[allow(clippy::too_many_arguments)]
    pub fn decrease_position(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        owner: AccountId,
        collateral_asset: AssetId,
        index_asset: AssetId,
        collateral_delta: Usd,
        size_delta: Usd,
        side: Side,
        receiver: Holder,
    ) -> Result<DecreaseResult, VaultError> {
        self.with_guard(|vault| {
            vault.decrease_position_inner(
                bank,
                oracle,
                owner,
                collateral_asset,
                index_asset,
                collateral_delta,
                size_delta,
                side,
                receiver,
            )
        })
    }

    // shared by decrease_position and over-leverage deleveraging, which
    // already runs under the guard
    #[allow(clippy::too_many_arguments)]
    pub(super) fn decrease_position_inner(
        &mut self,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        owner: AccountId,
        collateral_asset: AssetId,
        index_asset: AssetId,
        collateral_delta: Usd,
        size_delta: Usd,
        side: Side,
        receiver: Holder,
    ) -> Result<DecreaseResult, VaultError> {
        let key = PositionKey {
            owner,
            collateral_asset,
            index_asset,
            side,
        };
        let position = self
            .positions
            .get(&key)
            .cloned()
            .ok_or(VaultError::PositionNotFound)?;

        if size_delta > position.size {
            return Err(VaultError::SizeDeltaExceedsPosition {
                delta: size_delta,
                size: position.size,
            });
        }
        if collateral_delta > position.collateral {
            return Err(VaultError::CollateralDeltaExceedsPosition {
                delta: collateral_delta,
                collateral: position.collateral,
            });
        }

        self.update_cumulative_funding_rate(collateral_asset);

        // exit is marked against the trader: longs leave at the minimum
        // price, shorts at the maximum
        let price = match side {
            Side::Long => self.min_price(oracle, index_asset)?,
            Side::Short => self.max_price(oracle, index_asset)?,
        };

        let index_config = self.asset_config(index_asset)?;
        let delta = position::position_delta(
            position.size,
            position.average_price,
            price,
            side,
            position.last_increased_time,
            index_config.min_profit_bps,
            self.params.min_profit_time_secs,
            self.current_time,
        );
        // only the slice being closed realizes pnl
        let adjusted_delta = if size_delta.is_zero() {
            Usd::zero()
        } else {
            Usd::new(delta.usd.value() * size_delta.value() / position.size.value())
        };

        let cumulative_rate = self.pool(collateral_asset)?.cumulative_funding_rate;
        let fee = fees::margin_fee_usd(size_delta, self.params.margin_fee_bps).add(
            fees::funding_fee_usd(position.size, cumulative_rate, position.entry_funding_rate),
        );

        let mut collateral = position.collateral;
        let mut usd_out = Usd::zero();
        let mut realized = Decimal::ZERO;

        if delta.has_profit && !adjusted_delta.is_zero() {
            usd_out = usd_out.add(adjusted_delta);
            realized += adjusted_delta.value();
        }
        if !delta.has_profit && !adjusted_delta.is_zero() {
            if adjusted_delta > collateral {
                return Err(VaultError::LossesExceedCollateral {
                    loss: adjusted_delta,
                    collateral,
                });
            }
            collateral = collateral.sub(adjusted_delta);
            realized -= adjusted_delta.value();
        }

        if !collateral_delta.is_zero() {
            if collateral < collateral_delta {
                return Err(VaultError::CollateralDeltaExceedsPosition {
                    delta: collateral_delta,
                    collateral,
                });
            }
            usd_out = usd_out.add(collateral_delta);
            collateral = collateral.sub(collateral_delta);
        }

        let closing = size_delta == position.size;
        if closing {
            usd_out = usd_out.add(collateral);
            collateral = Usd::zero();
        }

        let usd_out_after_fee = if usd_out >= fee {
            usd_out.sub(fee)
        } else {
            if collateral < fee {
                return Err(VaultError::InsufficientCollateralForFees { collateral, fee });
            }
            collateral = collateral.sub(fee);
            usd_out
        };

        let next_size = position.size.sub(size_delta);
        if !next_size.is_zero() {
            if collateral.is_zero() {
                return Err(VaultError::EmptyCollateral);
            }
            if next_size < collateral {
                return Err(VaultError::SizeBelowCollateral {
                    size: next_size,
                    collateral,
                });
            }
            if next_size.value() > collateral.value() * self.params.max_leverage {
                return Err(VaultError::MaxLeverageExceeded {
                    size: next_size,
                    collateral,
                });
            }
        }

        let collateral_config = self.asset_config(collateral_asset)?;
        let reserve_delta = if closing {
            position.reserve_amount
        } else {
            Amount::new(floor_to_dp(
                position.reserve_amount.value() * size_delta.value() / position.size.value(),
                collateral_config.decimals,
            ))
        };

        let collateral_max_price = self.max_price(oracle, collateral_asset)?;
        let amount_out =
            self.usd_to_amount(collateral_asset, usd_out_after_fee, collateral_max_price)?;
        let fee_tokens = self.usd_to_amount(collateral_asset, fee, collateral_max_price)?;
        let total_out = amount_out.add(fee_tokens);

        let pool = self.pool(collateral_asset)?;
        if total_out > pool.pool_amount {
            return Err(VaultError::PoolExhausted {
                asset: collateral_asset,
                requested: total_out,
                available: pool.pool_amount,
            });
        }
        let next_pool = pool.pool_amount.sub(total_out);
        let next_reserved = pool.reserved_amount.sub(reserve_delta);
        if next_reserved > next_pool {
            return Err(VaultError::ReserveExceedsPool {
                asset: collateral_asset,
                attempted: next_reserved,
                available: next_pool,
            });
        }

        // commit
        let collateral_before = position.collateral;
        let pool = self.pool_mut(collateral_asset);
        pool.pool_amount = next_pool;
        pool.fee_reserves = pool.fee_reserves.add(fee_tokens);
        pool.reserved_amount = next_reserved;
        if side == Side::Long {
            pool.guaranteed_usd = pool
                .guaranteed_usd
                .add(collateral_before.sub(collateral))
                .sub(size_delta);
        } else {
            let index_pool = self.pool_mut(index_asset);
            index_pool.global_short_size = if size_delta > index_pool.global_short_size {
                Usd::zero()
            } else {
                index_pool.global_short_size.sub(size_delta)
            };
            if index_pool.global_short_size.is_zero() {
                index_pool.global_short_average_price = None;
            }
        }

        if closing {
            self.positions.remove(&key);
        } else {
            let stored = self.positions.get_mut(&key).expect("position present");
            stored.size = next_size;
            stored.collateral = collateral;
            stored.entry_funding_rate = cumulative_rate;
            stored.reserve_amount = stored.reserve_amount.sub(reserve_delta);
            stored.realized_pnl += realized;
        }

        if !amount_out.is_zero() {
            self.transfer_out(bank, collateral_asset, receiver, amount_out)?;
        }

        self.emit(EventPayload::PositionDecreased(PositionDecreasedEvent {
            owner,
            collateral_asset,
            index_asset,
            side,
            size_delta,
            collateral_delta,
            price,
            fee,
            realized_pnl: realized,
            usd_out: usd_out_after_fee,
            closed: closing,
        }));

        Ok(DecreaseResult {
            price,
            usd_out: usd_out_after_fee,
            amount_out,
            fee,
            realized_pnl: realized,
            closed: closing,
        })
    }

    fn validate_position_assets(
        &self,
        collateral_asset: AssetId,
        index_asset: AssetId,
        side: Side,
    ) -> Result<(), VaultError> {
        let collateral_config = self.asset_config(collateral_asset)?;
        match side {
            Side::Long => {
                if collateral_asset != index_asset {
                    return Err(VaultError::CollateralIndexMismatch {
                        collateral: collateral_asset,
                        index: index_asset,
                    });
                }
                if collateral_config.is_stable {
                    return Err(VaultError::StableCollateralForLong(collateral_asset));
                }
            }
            Side::Short => {
                if !collateral_config.is_stable {
                    return Err(VaultError::CollateralNotStable(collateral_asset));
                }
                let index_config = self.asset_config(index_asset)?;
                if index_config.is_stable || !index_config.is_shortable {
                    return Err(VaultError::AssetNotShortable(index_asset));
                }
            }
        }
        Ok(())
    }
}
