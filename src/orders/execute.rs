// 9.2 orders/execute.rs: anyone may execute a pending order once its price
// condition validates against current oracle state. the comparisons are
// deliberately asymmetric per order kind and side so an executor can never
// ride a favorable price blip:
//   increase long  -> maximum price crosses the trigger
//   increase short -> minimum price crosses the trigger
//   decrease long  -> minimum price crosses the trigger
//   decrease short -> maximum price crosses the trigger
// a failed trigger leaves the order and its escrow exactly as they were.

use super::{OrderEngine, OrderError, OrderKind};
use crate::bank::Bank;
use crate::events::{EventPayload, OrderExecutedEvent};
use crate::oracle::PriceOracle;
use crate::types::{AccountId, Holder, Price, AssetId};
use crate::vault::{Vault, VaultError};

impl OrderEngine {
    fn validate_position_order_price(
        &self,
        oracle: &dyn PriceOracle,
        trigger_above_threshold: bool,
        trigger_price: Price,
        index_asset: AssetId,
        maximize: bool,
    ) -> Result<Price, OrderError> {
        let current = oracle
            .price(index_asset, maximize)
            .map_err(VaultError::from)?;
        let valid = if trigger_above_threshold {
            current >= trigger_price
        } else {
            current <= trigger_price
        };
        if !valid {
            return Err(OrderError::InvalidPriceForExecution);
        }
        Ok(current)
    }

    pub fn execute_increase_order(
        &mut self,
        vault: &mut Vault,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        owner: AccountId,
        index: u64,
        fee_receiver: AccountId,
    ) -> Result<(), OrderError> {
        let order = self
            .increase_orders
            .get(owner, index)
            .cloned()
            .ok_or(OrderError::NonExistentOrder { owner, index })?;

        // a long entry must wait for the maximum price, a short entry for
        // the minimum: the side least favorable to the trader
        self.validate_position_order_price(
            oracle,
            order.trigger_above_threshold,
            order.trigger_price,
            order.index_asset,
            order.side.is_long(),
        )?;

        let needs_swap = order.purchase_asset != order.collateral_asset;
        if needs_swap {
            // dry-run so a failing swap cannot strand the escrow mid-flight
            vault.preview_swap_path(
                oracle,
                &[order.purchase_asset, order.collateral_asset],
                order.purchase_amount,
            )?;
        }

        bank.transfer(
            order.purchase_asset,
            Holder::Orders,
            Holder::Vault,
            order.purchase_amount,
        )?;

        let collateral_escrow = if needs_swap {
            match vault.swap(
                bank,
                oracle,
                order.purchase_asset,
                order.collateral_asset,
                Holder::Vault,
            ) {
                Ok(result) => result.amount_out,
                Err(err) => {
                    bank.transfer(
                        order.purchase_asset,
                        Holder::Vault,
                        Holder::Orders,
                        order.purchase_amount,
                    )?;
                    return Err(err.into());
                }
            }
        } else {
            order.purchase_amount
        };

        if let Err(err) = vault.increase_position(
            bank,
            oracle,
            owner,
            order.collateral_asset,
            order.index_asset,
            order.size_delta,
            order.side,
        ) {
            // pull the escrow back; if it was swapped it now lives in the
            // collateral asset, so the stored order is updated to match
            bank.transfer(
                order.collateral_asset,
                Holder::Vault,
                Holder::Orders,
                collateral_escrow,
            )?;
            if needs_swap {
                if let Some(stored) = self.increase_orders.get_mut(owner, index) {
                    stored.purchase_asset = order.collateral_asset;
                    stored.purchase_amount = collateral_escrow;
                }
            }
            return Err(err.into());
        }

        self.increase_orders.take(owner, index);
        bank.transfer(
            self.native_asset,
            Holder::Orders,
            Holder::User(fee_receiver),
            order.execution_fee,
        )?;

        self.log.emit(
            vault.time(),
            EventPayload::OrderExecuted(OrderExecutedEvent {
                owner,
                kind: OrderKind::Increase,
                index,
                fee_receiver,
                execution_fee: order.execution_fee,
            }),
        );
        Ok(())
    }

    pub fn execute_decrease_order(
        &mut self,
        vault: &mut Vault,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        owner: AccountId,
        index: u64,
        fee_receiver: AccountId,
    ) -> Result<(), OrderError> {
        let order = self
            .decrease_orders
            .get(owner, index)
            .cloned()
            .ok_or(OrderError::NonExistentOrder { owner, index })?;

        // exits validate against the worst price for the trader: minimum
        // for longs, maximum for shorts
        self.validate_position_order_price(
            oracle,
            order.trigger_above_threshold,
            order.trigger_price,
            order.index_asset,
            !order.side.is_long(),
        )?;

        vault.decrease_position(
            bank,
            oracle,
            owner,
            order.collateral_asset,
            order.index_asset,
            order.collateral_delta,
            order.size_delta,
            order.side,
            Holder::User(owner),
        )?;

        self.decrease_orders.take(owner, index);
        bank.transfer(
            self.native_asset,
            Holder::Orders,
            Holder::User(fee_receiver),
            order.execution_fee,
        )?;

        self.log.emit(
            vault.time(),
            EventPayload::OrderExecuted(OrderExecutedEvent {
                owner,
                kind: OrderKind::Decrease,
                index,
                fee_receiver,
                execution_fee: order.execution_fee,
            }),
        );
        Ok(())
    }

    pub fn execute_swap_order(
        &mut self,
        vault: &mut Vault,
        bank: &mut Bank,
        oracle: &dyn PriceOracle,
        owner: AccountId,
        index: u64,
        fee_receiver: AccountId,
    ) -> Result<(), OrderError> {
        let order = self
            .swap_orders
            .get(owner, index)
            .cloned()
            .ok_or(OrderError::NonExistentOrder { owner, index })?;

        // with the threshold flag the ratio condition decides *when*; the
        // min_out bound below always decides *how much slippage*
        if order.trigger_above_threshold {
            let first = order.path[0];
            let last = *order.path.last().unwrap();
            let price_in = oracle.price(first, false).map_err(VaultError::from)?;
            let price_out = oracle.price(last, true).map_err(VaultError::from)?;
            let current_ratio = price_out.value() / price_in.value();
            if current_ratio < order.trigger_ratio {
                return Err(OrderError::InvalidPriceForExecution);
            }
        }

        // dry-run the whole path first: an insufficient output must leave
        // the order and the pools untouched
        let expected_out = vault.preview_swap_path(oracle, &order.path, order.amount_in)?;
        if expected_out < order.min_out {
            return Err(OrderError::InsufficientAmountOut {
                amount: expected_out,
                min_out: order.min_out,
            });
        }

        bank.transfer(order.path[0], Holder::Orders, Holder::Vault, order.amount_in)?;

        let mut current = order.amount_in;
        let last_hop = order.path.len() - 2;
        for (hop, pair) in order.path.windows(2).enumerate() {
            let receiver = if hop == last_hop {
                Holder::Orders
            } else {
                Holder::Vault
            };
            let result = vault.swap(bank, oracle, pair[0], pair[1], receiver)?;
            current = result.amount_out;
        }

        let out_asset = *order.path.last().unwrap();
        bank.transfer(out_asset, Holder::Orders, Holder::User(owner), current)?;

        self.swap_orders.take(owner, index);
        bank.transfer(
            self.native_asset,
            Holder::Orders,
            Holder::User(fee_receiver),
            order.execution_fee,
        )?;

        self.log.emit(
            vault.time(),
            EventPayload::OrderExecuted(OrderExecutedEvent {
                owner,
                kind: OrderKind::Swap,
                index,
                fee_receiver,
                execution_fee: order.execution_fee,
            }),
        );
        Ok(())
    }
}
