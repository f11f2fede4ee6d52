// 4.0: leveraged position ledger. size and collateral are USD notionals;
// reserve_amount is the collateral-asset backing held out of the pool.
// 4.2+ has the pure math: average-price blending and mark-to-market deltas.

use crate::types::{AccountId, Amount, AssetId, Bps, Price, Side, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// key = (owner, collateral asset, index asset, side). one position per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub owner: AccountId,
    pub collateral_asset: AssetId,
    pub index_asset: AssetId,
    pub side: Side,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    // USD notional. always >= collateral while open
    pub size: Usd,
    pub collateral: Usd,
    // entry price, blended on every increase, untouched on decrease
    pub average_price: Price,
    // cumulative funding snapshot at the last increase/decrease
    pub entry_funding_rate: Decimal,
    // native units of the collateral asset reserved in the pool
    pub reserve_amount: Amount,
    // signed: profits positive, losses negative
    pub realized_pnl: Decimal,
    pub last_increased_time: Timestamp,
}

impl Position {
    pub fn open(
        size: Usd,
        collateral: Usd,
        average_price: Price,
        entry_funding_rate: Decimal,
        reserve_amount: Amount,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            size,
            collateral,
            average_price,
            entry_funding_rate,
            reserve_amount,
            realized_pnl: Decimal::ZERO,
            last_increased_time: timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_zero()
    }

    pub fn leverage(&self) -> Decimal {
        if self.collateral.is_zero() {
            return Decimal::ZERO;
        }
        self.size.value() / self.collateral.value()
    }
}

// Mark-to-market result for some slice of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub has_profit: bool,
    pub usd: Usd,
}

// 4.2: unrealized delta at a mark price, with the minimum-profit rule.
// favorable deltas at or below min_profit_bps of size count as zero until
// min_profit_time has elapsed since the last increase, which keeps oracle
// noise from being harvested.
#[allow(clippy::too_many_arguments)]
pub fn position_delta(
    size: Usd,
    average_price: Price,
    mark_price: Price,
    side: Side,
    last_increased_time: Timestamp,
    min_profit_bps: Bps,
    min_profit_time_secs: i64,
    now: Timestamp,
) -> Delta {
    let avg = average_price.value();
    let mark = mark_price.value();
    let price_delta = (avg - mark).abs();
    let usd = Usd::new(size.value() * price_delta / avg);

    let has_profit = match side {
        Side::Long => mark > avg,
        Side::Short => avg > mark,
    };

    let min_bps = if now.as_secs() > last_increased_time.as_secs() + min_profit_time_secs {
        Bps::zero()
    } else {
        min_profit_bps
    };

    if has_profit && usd <= min_bps.of_usd(size) {
        return Delta {
            has_profit,
            usd: Usd::zero(),
        };
    }

    Delta { has_profit, usd }
}

// 4.3: blended entry price after an increase. chosen so the position's
// unrealized delta is identical before and after the blend:
// next_avg = next_price * next_size / (next_size +/- existing delta)
#[allow(clippy::too_many_arguments)]
pub fn next_average_price(
    size: Usd,
    average_price: Price,
    next_price: Price,
    size_delta: Usd,
    side: Side,
    last_increased_time: Timestamp,
    min_profit_bps: Bps,
    min_profit_time_secs: i64,
    now: Timestamp,
) -> Price {
    if size.is_zero() {
        return next_price;
    }

    let delta = position_delta(
        size,
        average_price,
        next_price,
        side,
        last_increased_time,
        min_profit_bps,
        min_profit_time_secs,
        now,
    );

    let next_size = size.add(size_delta).value();
    let divisor = match (side, delta.has_profit) {
        (Side::Long, true) | (Side::Short, false) => next_size + delta.usd.value(),
        (Side::Long, false) | (Side::Short, true) => next_size - delta.usd.value(),
    };
    Price::new_unchecked(next_price.value() * next_size / divisor)
}

// 4.4: the aggregate short entry price blends the same way, sized by the
// whole book instead of one position. lets the pool mark its short
// exposure without iterating positions.
pub fn next_global_short_average_price(
    global_size: Usd,
    global_average: Price,
    next_price: Price,
    size_delta: Usd,
) -> Price {
    if global_size.is_zero() {
        return next_price;
    }

    let avg = global_average.value();
    let price_delta = (avg - next_price.value()).abs();
    let delta = global_size.value() * price_delta / avg;
    let has_profit = avg > next_price.value();

    let next_size = global_size.add(size_delta).value();
    let divisor = if has_profit {
        next_size - delta
    } else {
        next_size + delta
    };
    Price::new_unchecked(next_price.value() * next_size / divisor)
}
