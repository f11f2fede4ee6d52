// 9.1 orders/lifecycle.rs: create, update, cancel. creation pulls the
// escrow immediately and validates the escrow equation up front; cancel
// returns every escrowed unit to the owner and clears the slot.

use super::{DecreaseOrder, IncreaseOrder, OrderEngine, OrderError, OrderKind, SwapOrder};
use crate::bank::Bank;
use crate::events::{EventPayload, OrderEvent};
use crate::types::{AccountId, Amount, AssetId, Holder, Price, Side, Timestamp, Usd};
use rust_decimal::Decimal;

impl OrderEngine {
    // the escrow equation: native-asset escrow rides along with the
    // execution fee in one value transfer, everything else is pulled
    // separately and the sent value must be exactly the fee.
    fn validate_escrow(
        &self,
        escrow_asset: Option<AssetId>,
        amount_in: Amount,
        execution_fee: Amount,
        value_sent: Amount,
    ) -> Result<(), OrderError> {
        if execution_fee < self.params.min_execution_fee {
            return Err(OrderError::InsufficientExecutionFee {
                provided: execution_fee,
                minimum: self.params.min_execution_fee,
            });
        }

        match escrow_asset {
            Some(asset) if asset == self.native_asset => {
                let expected = amount_in.add(execution_fee);
                if value_sent != expected {
                    return Err(OrderError::IncorrectValueTransferred {
                        provided: value_sent,
                        expected,
                    });
                }
            }
            _ => {
                if value_sent != execution_fee {
                    return Err(OrderError::IncorrectExecutionFee {
                        provided: value_sent,
                        expected: execution_fee,
                    });
                }
            }
        }
        Ok(())
    }

    fn pull_escrow(
        &self,
        bank: &mut Bank,
        owner: AccountId,
        escrow_asset: Option<AssetId>,
        amount_in: Amount,
        value_sent: Amount,
    ) -> Result<(), OrderError> {
        bank.transfer(
            self.native_asset,
            Holder::User(owner),
            Holder::Orders,
            value_sent,
        )?;
        if let Some(asset) = escrow_asset {
            if asset != self.native_asset && !amount_in.is_zero() {
                bank.transfer(asset, Holder::User(owner), Holder::Orders, amount_in)?;
            }
        }
        Ok(())
    }

    fn refund_escrow(
        &self,
        bank: &mut Bank,
        owner: AccountId,
        escrow_asset: Option<AssetId>,
        amount_in: Amount,
        execution_fee: Amount,
    ) -> Result<(), OrderError> {
        match escrow_asset {
            Some(asset) if asset == self.native_asset => {
                bank.transfer(
                    self.native_asset,
                    Holder::Orders,
                    Holder::User(owner),
                    amount_in.add(execution_fee),
                )?;
            }
            Some(asset) => {
                if !amount_in.is_zero() {
                    bank.transfer(asset, Holder::Orders, Holder::User(owner), amount_in)?;
                }
                bank.transfer(
                    self.native_asset,
                    Holder::Orders,
                    Holder::User(owner),
                    execution_fee,
                )?;
            }
            None => {
                bank.transfer(
                    self.native_asset,
                    Holder::Orders,
                    Holder::User(owner),
                    execution_fee,
                )?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_increase_order(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        purchase_asset: AssetId,
        purchase_amount: Amount,
        collateral_asset: AssetId,
        index_asset: AssetId,
        size_delta: Usd,
        side: Side,
        trigger_price: Price,
        trigger_above_threshold: bool,
        execution_fee: Amount,
        value_sent: Amount,
        now: Timestamp,
    ) -> Result<u64, OrderError> {
        if purchase_amount.is_zero() {
            return Err(OrderError::ZeroAmountIn);
        }
        self.validate_escrow(
            Some(purchase_asset),
            purchase_amount,
            execution_fee,
            value_sent,
        )?;
        self.pull_escrow(bank, owner, Some(purchase_asset), purchase_amount, value_sent)?;

        let order = IncreaseOrder {
            owner,
            purchase_asset,
            purchase_amount,
            collateral_asset,
            index_asset,
            size_delta,
            side,
            trigger_price,
            trigger_above_threshold,
            execution_fee,
            created_at: now,
        };
        let index = self.increase_orders.append(owner, order);

        self.log.emit(
            now,
            EventPayload::OrderCreated(OrderEvent {
                owner,
                kind: OrderKind::Increase,
                index,
            }),
        );
        Ok(index)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_decrease_order(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        collateral_asset: AssetId,
        index_asset: AssetId,
        collateral_delta: Usd,
        size_delta: Usd,
        side: Side,
        trigger_price: Price,
        trigger_above_threshold: bool,
        execution_fee: Amount,
        value_sent: Amount,
        now: Timestamp,
    ) -> Result<u64, OrderError> {
        self.validate_escrow(None, Amount::zero(), execution_fee, value_sent)?;
        self.pull_escrow(bank, owner, None, Amount::zero(), value_sent)?;

        let order = DecreaseOrder {
            owner,
            collateral_asset,
            index_asset,
            collateral_delta,
            size_delta,
            side,
            trigger_price,
            trigger_above_threshold,
            execution_fee,
            created_at: now,
        };
        let index = self.decrease_orders.append(owner, order);

        self.log.emit(
            now,
            EventPayload::OrderCreated(OrderEvent {
                owner,
                kind: OrderKind::Decrease,
                index,
            }),
        );
        Ok(index)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_swap_order(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        path: Vec<AssetId>,
        amount_in: Amount,
        min_out: Amount,
        trigger_ratio: Decimal,
        trigger_above_threshold: bool,
        execution_fee: Amount,
        value_sent: Amount,
        now: Timestamp,
    ) -> Result<u64, OrderError> {
        if path.len() != 2 && path.len() != 3 {
            return Err(OrderError::InvalidPathLength(path.len()));
        }
        if path.first() == path.last() {
            return Err(OrderError::InvalidPathEnds);
        }
        if amount_in.is_zero() {
            return Err(OrderError::ZeroAmountIn);
        }

        let escrow_asset = path[0];
        self.validate_escrow(Some(escrow_asset), amount_in, execution_fee, value_sent)?;
        self.pull_escrow(bank, owner, Some(escrow_asset), amount_in, value_sent)?;

        let order = SwapOrder {
            owner,
            path,
            amount_in,
            min_out,
            trigger_ratio,
            trigger_above_threshold,
            execution_fee,
            created_at: now,
        };
        let index = self.swap_orders.append(owner, order);

        self.log.emit(
            now,
            EventPayload::OrderCreated(OrderEvent {
                owner,
                kind: OrderKind::Swap,
                index,
            }),
        );
        Ok(index)
    }

    // updates overwrite trigger/size fields in place; the escrow is untouched
    pub fn update_increase_order(
        &mut self,
        owner: AccountId,
        index: u64,
        size_delta: Usd,
        trigger_price: Price,
        trigger_above_threshold: bool,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        let order = self
            .increase_orders
            .get_mut(owner, index)
            .ok_or(OrderError::NonExistentOrder { owner, index })?;
        order.size_delta = size_delta;
        order.trigger_price = trigger_price;
        order.trigger_above_threshold = trigger_above_threshold;

        self.log.emit(
            now,
            EventPayload::OrderUpdated(OrderEvent {
                owner,
                kind: OrderKind::Increase,
                index,
            }),
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_decrease_order(
        &mut self,
        owner: AccountId,
        index: u64,
        collateral_delta: Usd,
        size_delta: Usd,
        trigger_price: Price,
        trigger_above_threshold: bool,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        let order = self
            .decrease_orders
            .get_mut(owner, index)
            .ok_or(OrderError::NonExistentOrder { owner, index })?;
        order.collateral_delta = collateral_delta;
        order.size_delta = size_delta;
        order.trigger_price = trigger_price;
        order.trigger_above_threshold = trigger_above_threshold;

        self.log.emit(
            now,
            EventPayload::OrderUpdated(OrderEvent {
                owner,
                kind: OrderKind::Decrease,
                index,
            }),
        );
        Ok(())
    }

    pub fn update_swap_order(
        &mut self,
        owner: AccountId,
        index: u64,
        min_out: Amount,
        trigger_ratio: Decimal,
        trigger_above_threshold: bool,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        let order = self
            .swap_orders
            .get_mut(owner, index)
            .ok_or(OrderError::NonExistentOrder { owner, index })?;
        order.min_out = min_out;
        order.trigger_ratio = trigger_ratio;
        order.trigger_above_threshold = trigger_above_threshold;

        self.log.emit(
            now,
            EventPayload::OrderUpdated(OrderEvent {
                owner,
                kind: OrderKind::Swap,
                index,
            }),
        );
        Ok(())
    }

    pub fn cancel_increase_order(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        index: u64,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        let order = self
            .increase_orders
            .take(owner, index)
            .ok_or(OrderError::NonExistentOrder { owner, index })?;

        self.refund_escrow(
            bank,
            owner,
            Some(order.purchase_asset),
            order.purchase_amount,
            order.execution_fee,
        )?;

        self.log.emit(
            now,
            EventPayload::OrderCancelled(OrderEvent {
                owner,
                kind: OrderKind::Increase,
                index,
            }),
        );
        Ok(())
    }

    pub fn cancel_decrease_order(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        index: u64,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        let order = self
            .decrease_orders
            .take(owner, index)
            .ok_or(OrderError::NonExistentOrder { owner, index })?;

        self.refund_escrow(bank, owner, None, Amount::zero(), order.execution_fee)?;

        self.log.emit(
            now,
            EventPayload::OrderCancelled(OrderEvent {
                owner,
                kind: OrderKind::Decrease,
                index,
            }),
        );
        Ok(())
    }

    pub fn cancel_swap_order(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        index: u64,
        now: Timestamp,
    ) -> Result<(), OrderError> {
        let order = self
            .swap_orders
            .take(owner, index)
            .ok_or(OrderError::NonExistentOrder { owner, index })?;

        self.refund_escrow(
            bank,
            owner,
            Some(order.path[0]),
            order.amount_in,
            order.execution_fee,
        )?;

        self.log.emit(
            now,
            EventPayload::OrderCancelled(OrderEvent {
                owner,
                kind: OrderKind::Swap,
                index,
            }),
        );
        Ok(())
    }

    // all-or-nothing batch cancel: every index is checked before any order
    // is touched, so one bad index fails the whole call with no refunds made
    pub fn cancel_multiple(
        &mut self,
        bank: &mut Bank,
        owner: AccountId,
        swap_indexes: &[u64],
        increase_indexes: &[u64],
        decrease_indexes: &[u64],
        now: Timestamp,
    ) -> Result<(), OrderError> {
        for &index in swap_indexes {
            if self.swap_orders.get(owner, index).is_none() {
                return Err(OrderError::NonExistentOrder { owner, index });
            }
        }
        for &index in increase_indexes {
            if self.increase_orders.get(owner, index).is_none() {
                return Err(OrderError::NonExistentOrder { owner, index });
            }
        }
        for &index in decrease_indexes {
            if self.decrease_orders.get(owner, index).is_none() {
                return Err(OrderError::NonExistentOrder { owner, index });
            }
        }

        for &index in swap_indexes {
            self.cancel_swap_order(bank, owner, index, now)?;
        }
        for &index in increase_indexes {
            self.cancel_increase_order(bank, owner, index, now)?;
        }
        for &index in decrease_indexes {
            self.cancel_decrease_order(bank, owner, index, now)?;
        }
        Ok(())
    }
}
