// 5.0: funding. open positions pay the pool in proportion to how much of it
// they reserve. accrual happens in whole intervals against a per-asset
// cumulative rate; positions snapshot the rate at entry and pay the delta.

use crate::types::{Amount, Timestamp};
use rust_decimal::Decimal;

// 5.1: whole intervals elapsed since the last accrual
pub fn intervals_elapsed(last: Timestamp, now: Timestamp, interval_secs: i64) -> i64 {
    debug_assert!(interval_secs > 0);
    let elapsed = now.as_secs() - last.as_secs();
    if elapsed <= 0 {
        return 0;
    }
    elapsed / interval_secs
}

// 5.2: rate added for one accrual: factor * utilization * intervals.
// an empty pool accrues nothing.
pub fn next_funding_rate(
    reserved: Amount,
    pool_amount: Amount,
    factor: Decimal,
    intervals: i64,
) -> Decimal {
    if pool_amount.is_zero() || intervals <= 0 {
        return Decimal::ZERO;
    }
    factor * reserved.value() * Decimal::from(intervals) / pool_amount.value()
}

// Result of one accrual pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingAccrual {
    pub rate_added: Decimal,
    pub last_funding_time: Timestamp,
}

// 5.3: accrue if at least one full interval has passed. the new
// last_funding_time is aligned down so partial intervals are never lost.
pub fn accrue(
    last_funding_time: Option<Timestamp>,
    now: Timestamp,
    interval_secs: i64,
    reserved: Amount,
    pool_amount: Amount,
    factor: Decimal,
) -> Option<FundingAccrual> {
    let last = match last_funding_time {
        // first touch just starts the clock
        None => {
            return Some(FundingAccrual {
                rate_added: Decimal::ZERO,
                last_funding_time: now.align_to_interval(interval_secs),
            })
        }
        Some(t) => t,
    };

    let intervals = intervals_elapsed(last, now, interval_secs);
    if intervals == 0 {
        return None;
    }

    Some(FundingAccrual {
        rate_added: next_funding_rate(reserved, pool_amount, factor, intervals),
        last_funding_time: now.align_to_interval(interval_secs),
    })
}
