// 11.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum
// lists all event types for both the vault and the order engine.

use crate::orders::OrderKind;
use crate::types::{AccountId, Amount, AssetId, Bps, Holder, Price, Side, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // pool events
    LiquiditySupplied(LiquiditySuppliedEvent),
    LiquidityWithdrawn(LiquidityWithdrawnEvent),
    Swap(SwapEvent),
    FeesWithdrawn(FeesWithdrawnEvent),

    // position events
    PositionIncreased(PositionIncreasedEvent),
    PositionDecreased(PositionDecreasedEvent),
    PositionLiquidated(PositionLiquidatedEvent),

    // funding events
    FundingUpdated(FundingUpdatedEvent),

    // order engine events
    OrderCreated(OrderEvent),
    OrderUpdated(OrderEvent),
    OrderCancelled(OrderEvent),
    OrderExecuted(OrderExecutedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquiditySuppliedEvent {
    pub asset: AssetId,
    pub recipient: AccountId,
    pub amount_in: Amount,
    pub minted_usd: Usd,
    pub fee_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityWithdrawnEvent {
    pub asset: AssetId,
    pub recipient: AccountId,
    pub burned_usd: Usd,
    pub amount_out: Amount,
    pub fee_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub receiver: Holder,
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub fee_bps: Bps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesWithdrawnEvent {
    pub asset: AssetId,
    pub amount: Amount,
    pub recipient: Holder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionIncreasedEvent {
    pub owner: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub side: Side,
    pub size_delta: Usd,
    pub collateral_delta: Usd,
    pub price: Price,
    pub fee: Usd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionDecreasedEvent {
    pub owner: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub side: Side,
    pub size_delta: Usd,
    pub collateral_delta: Usd,
    pub price: Price,
    pub fee: Usd,
    pub realized_pnl: Decimal,
    pub usd_out: Usd,
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLiquidatedEvent {
    pub owner: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub side: Side,
    pub size: Usd,
    pub collateral: Usd,
    pub mark_price: Price,
    pub liquidator: Holder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingUpdatedEvent {
    pub asset: AssetId,
    pub rate_added: Decimal,
    pub cumulative_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub owner: AccountId,
    pub kind: OrderKind,
    pub index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderExecutedEvent {
    pub owner: AccountId,
    pub kind: OrderKind,
    pub index: u64,
    pub fee_receiver: AccountId,
    pub execution_fee: Amount,
}

// Bounded append-only log shared by the vault and the order engine.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    max_events: usize,
    verbose: bool,
}

impl EventLog {
    pub fn new(max_events: usize, verbose: bool) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            max_events,
            verbose,
        }
    }

    pub fn emit(&mut self, timestamp: Timestamp, payload: EventPayload) {
        let event = Event::new(EventId(self.next_id), timestamp, payload);
        self.next_id += 1;

        if self.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.max_events {
            let drain = self.events.len() - self.max_events;
            self.events.drain(0..drain);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn log_assigns_sequential_ids() {
        let mut log = EventLog::new(100, false);
        log.emit(
            Timestamp::from_secs(1),
            EventPayload::FundingUpdated(FundingUpdatedEvent {
                asset: AssetId(1),
                rate_added: dec!(0.0006),
                cumulative_rate: dec!(0.0006),
            }),
        );
        log.emit(
            Timestamp::from_secs(2),
            EventPayload::FundingUpdated(FundingUpdatedEvent {
                asset: AssetId(1),
                rate_added: dec!(0.0006),
                cumulative_rate: dec!(0.0012),
            }),
        );

        assert_eq!(log.events().len(), 2);
        assert_eq!(log.events()[0].id, EventId(1));
        assert_eq!(log.events()[1].id, EventId(2));
    }

    #[test]
    fn log_trims_to_capacity() {
        let mut log = EventLog::new(2, false);
        for i in 1..=5 {
            log.emit(
                Timestamp::from_secs(i),
                EventPayload::FeesWithdrawn(FeesWithdrawnEvent {
                    asset: AssetId(1),
                    amount: Amount::new(dec!(1)),
                    recipient: Holder::User(AccountId(1)),
                }),
            );
        }
        assert_eq!(log.events().len(), 2);
        assert_eq!(log.events()[0].id, EventId(4));
    }

    #[test]
    fn recent_returns_tail() {
        let mut log = EventLog::new(100, false);
        for i in 1..=4 {
            log.emit(
                Timestamp::from_secs(i),
                EventPayload::FeesWithdrawn(FeesWithdrawnEvent {
                    asset: AssetId(1),
                    amount: Amount::new(dec!(1)),
                    recipient: Holder::Vault,
                }),
            );
        }
        assert_eq!(log.recent(2).len(), 2);
        assert_eq!(log.recent(2)[0].id, EventId(3));
        assert_eq!(log.recent(10).len(), 4);
    }
}
