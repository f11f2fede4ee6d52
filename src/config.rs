// 7.0 config.rs: all settings in one place. fee bps, funding factors, leverage
// bounds, feature flags. 7.1 OrderParams covers the order engine's knobs.

use crate::types::{Amount, Bps, Usd};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// Vault-wide parameters. Per-asset settings live on AssetConfig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultParams {
    // flat swap/mint/burn base rates
    pub swap_fee_bps: Bps,
    pub stable_swap_fee_bps: Bps,
    pub mint_burn_fee_bps: Bps,
    // dynamic-fee tax: extra bps scaling with distance from target weight
    pub tax_bps: Bps,
    pub stable_tax_bps: Bps,
    // position (margin) fee charged on every size delta
    pub margin_fee_bps: Bps,
    // fixed USD fee paid to the liquidator on seizure
    pub liquidation_fee_usd: Usd,
    // favorable price deltas below an asset's min_profit_bps are suppressed
    // until this many seconds have passed since the last increase
    pub min_profit_time_secs: i64,
    // funding accrues in whole intervals of this length
    pub funding_interval_secs: i64,
    // per-interval funding at 100% utilization; stables use the lower factor
    pub funding_rate_factor: Decimal,
    pub stable_funding_rate_factor: Decimal,
    // max position size as a multiple of collateral
    pub max_leverage: Decimal,
    pub swap_enabled: bool,
    pub leverage_enabled: bool,
    // when off, the base rates apply flat and the tax/rebate curve is skipped
    pub dynamic_fees: bool,
    // when off, only registered liquidators may seize positions
    pub anyone_can_liquidate: bool,
    // event log retention
    pub max_events: usize,
    pub verbose: bool,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            swap_fee_bps: Bps::new(30),        // 0.3%
            stable_swap_fee_bps: Bps::new(4),  // 0.04%
            mint_burn_fee_bps: Bps::new(30),   // 0.3%
            tax_bps: Bps::new(50),             // up to +0.5%
            stable_tax_bps: Bps::new(20),
            margin_fee_bps: Bps::new(10),      // 0.1%
            liquidation_fee_usd: Usd::new(dec!(5)),
            min_profit_time_secs: 3600,
            funding_interval_secs: 3600,
            funding_rate_factor: dec!(0.0006),
            stable_funding_rate_factor: dec!(0.0004),
            max_leverage: dec!(50),
            swap_enabled: true,
            leverage_enabled: true,
            dynamic_fees: true,
            anyone_can_liquidate: false,
            max_events: 100_000,
            verbose: false,
        }
    }
}

impl VaultParams {
    // lower leverage, pricier liquidations, flat fees. for cautious deployments
    pub fn conservative() -> Self {
        let mut params = Self::default();
        params.max_leverage = dec!(10);
        params.liquidation_fee_usd = Usd::new(dec!(20));
        params.dynamic_fees = false;
        params.anyone_can_liquidate = false;
        params
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_leverage <= Decimal::ONE {
            return Err(ConfigError::InvalidLeverage {
                reason: "max leverage must exceed 1x".to_string(),
            });
        }
        if self.funding_interval_secs <= 0 {
            return Err(ConfigError::InvalidFunding {
                reason: "funding interval must be positive".to_string(),
            });
        }
        if self.funding_rate_factor < Decimal::ZERO
            || self.stable_funding_rate_factor < Decimal::ZERO
        {
            return Err(ConfigError::InvalidFunding {
                reason: "funding factors must be non-negative".to_string(),
            });
        }
        if self.swap_fee_bps.value() > 500 || self.mint_burn_fee_bps.value() > 500 {
            return Err(ConfigError::InvalidFees {
                reason: "base fee too high (>5%)".to_string(),
            });
        }
        if self.margin_fee_bps.value() > 500 {
            return Err(ConfigError::InvalidFees {
                reason: "margin fee too high (>5%)".to_string(),
            });
        }
        if self.liquidation_fee_usd.is_negative() {
            return Err(ConfigError::InvalidFees {
                reason: "liquidation fee must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/** 7.1: order engine knobs. the execution fee floor keeps griefing-sized
orders out of the store */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderParams {
    // minimum execution fee, in native-asset units
    pub min_execution_fee: Amount,
    pub max_events: usize,
    pub verbose: bool,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            min_execution_fee: Amount::new(dec!(0.0003)),
            max_events: 100_000,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLeverage { reason: String },
    InvalidFunding { reason: String },
    InvalidFees { reason: String },
}
