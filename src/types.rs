// 1.0: all the primitives live here. nothing in the vault works without these types.
// IDs, USD values, native amounts, prices, bps, timestamps. each is a newtype so the
// compiler catches unit mixups (a native amount is never a USD value).

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

// 1.1: a bank account. the vault and the order engine hold escrow under
// their own holders; everything else is a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holder {
    Vault,
    Orders,
    User(AccountId),
}

// Long = profit when the index price goes up. Short = profit when it goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn is_long(&self) -> bool {
        matches!(self, Side::Long)
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }
}

// 1.2: quantization. every USD -> native conversion floors to the asset's
// decimals; this is the single place the rounding direction is defined.
pub fn floor_to_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

// 1.3: normalized USD value. pool liabilities, position sizes, fees and the
// accounting unit are all denominated in this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usd(Decimal);

impl Usd {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn add(&self, other: Usd) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Usd) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    pub fn min(&self, other: Usd) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Usd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Usd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, u| acc.add(u))
    }
}

// 1.4: native units of one asset, in whole-token terms. granularity is the
// asset's configured decimals; producers must quantize via floor_to_dp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: Amount) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Amount) -> Self {
        Self(self.0 - other.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// 1.5: price in USD per whole native unit. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.6: basis points. 100 bps = 1%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bps(u32);

impl Bps {
    pub fn new(bps: u32) -> Self {
        Self(bps)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }

    // fee amount on a USD value, e.g. 30 bps on $10,000 -> $30
    pub fn of_usd(&self, value: Usd) -> Usd {
        Usd::new(value.value() * self.as_fraction())
    }

    pub fn of_amount(&self, amount: Amount) -> Amount {
        Amount::new(amount.value() * self.as_fraction())
    }
}

// 1.7: second-resolution timestamp. funding intervals are whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + secs)
    }

    // snap down to the start of the interval containing this instant
    pub fn align_to_interval(&self, interval_secs: i64) -> Self {
        debug_assert!(interval_secs > 0);
        Self(self.0 / interval_secs * interval_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn floor_quantization() {
        assert_eq!(floor_to_dp(dec!(1.23456789), 4), dec!(1.2345));
        assert_eq!(floor_to_dp(dec!(1.99999999), 0), dec!(1));
        assert_eq!(floor_to_dp(dec!(0.00009), 4), dec!(0.0000));
    }

    #[test]
    fn bps_conversion() {
        let thirty = Bps::new(30);
        assert_eq!(thirty.as_fraction(), dec!(0.003));
        assert_eq!(thirty.of_usd(Usd::new(dec!(10000))).value(), dec!(30));

        let hundred = Bps::new(100);
        assert_eq!(hundred.as_fraction(), dec!(0.01)); // 1%
    }

    #[test]
    fn usd_arithmetic() {
        let a = Usd::new(dec!(100));
        let b = Usd::new(dec!(40));
        assert_eq!(a.sub(b).value(), dec!(60));
        assert_eq!(a.add(b).value(), dec!(140));
        assert!(b < a);
        assert!(Usd::new(dec!(-1)).is_negative());
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Long.opposite(), Side::Short);
        assert_eq!(Side::Short.opposite(), Side::Long);
        assert!(Side::Long.is_long());
    }

    #[test]
    fn interval_alignment() {
        let t = Timestamp::from_secs(10_250);
        assert_eq!(t.align_to_interval(3600).as_secs(), 7_200);
        assert_eq!(t.align_to_interval(100).as_secs(), 10_200);
    }
}
