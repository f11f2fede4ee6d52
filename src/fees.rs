// 3.0: fee math. the dynamic curve prices pool balance: trades that pull an
// asset's accounting-unit amount toward its target weight get a rebate,
// trades that push it away pay base + tax scaled by the overshoot.
// all functions are pure and computed from pre-operation state.

use crate::config::VaultParams;
use crate::types::{Bps, Usd};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

// 3.1: target accounting-unit amount for one asset:
// total unit supply * weight / total weights
pub fn target_unit_amount(total_unit_supply: Usd, weight: u64, total_weights: u64) -> Usd {
    if total_weights == 0 {
        return Usd::zero();
    }
    Usd::new(
        total_unit_supply.value() * Decimal::from(weight) / Decimal::from(total_weights),
    )
}

// 3.2: the curve. `usd_delta` is the accounting-unit amount the operation
// would add (increment=true) or remove (increment=false) for this asset.
// symmetric for buy/sell and for both swap legs.
pub fn dynamic_fee_bps(
    current_unit_amount: Usd,
    target: Usd,
    usd_delta: Usd,
    increment: bool,
    base: Bps,
    tax: Bps,
    dynamic: bool,
) -> Bps {
    if !dynamic || target.is_zero() {
        return base;
    }

    let current = current_unit_amount.value();
    let next = if increment {
        current + usd_delta.value()
    } else {
        (current - usd_delta.value()).max(Decimal::ZERO)
    };

    let initial_diff = (current - target.value()).abs();
    let next_diff = (next - target.value()).abs();

    // moving toward target: rebate scales with how far off balance we started
    if next_diff < initial_diff {
        let rebate = Decimal::from(tax.value()) * initial_diff / target.value();
        let rebate_bps = rebate.trunc().to_u32().unwrap_or(u32::MAX);
        return Bps::new(base.value().saturating_sub(rebate_bps));
    }

    // moving away: tax scales with the average overshoot, capped at target
    let mut average_diff = (initial_diff + next_diff) / Decimal::TWO;
    if average_diff > target.value() {
        average_diff = target.value();
    }
    let tax_term = Decimal::from(tax.value()) * average_diff / target.value();
    Bps::new(base.value() + tax_term.trunc().to_u32().unwrap_or(0))
}

// 3.3: base/tax rate pair for a swap. the stable rates apply only when both
// legs are stable assets.
pub fn swap_fee_rates(in_stable: bool, out_stable: bool, params: &VaultParams) -> (Bps, Bps) {
    if in_stable && out_stable {
        (params.stable_swap_fee_bps, params.stable_tax_bps)
    } else {
        (params.swap_fee_bps, params.tax_bps)
    }
}

// 3.4: position (margin) fee on a size delta
pub fn margin_fee_usd(size_delta: Usd, margin_fee_bps: Bps) -> Usd {
    margin_fee_bps.of_usd(size_delta)
}

// 3.5: funding owed since the position's entry snapshot.
// cumulative rates are monotone, so the delta is never negative.
pub fn funding_fee_usd(size: Usd, cumulative_rate: Decimal, entry_rate: Decimal) -> Usd {
    let rate_delta = cumulative_rate - entry_rate;
    debug_assert!(rate_delta >= Decimal::ZERO, "cumulative funding regressed");
    Usd::new(size.value() * rate_delta)
}
