// 8.0.2: result types and errors for vault operations.

use crate::bank::BankError;
use crate::oracle::OracleError;
use crate::types::{AccountId, Amount, AssetId, Bps, Price, Usd};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct SupplyResult {
    pub amount_in: Amount,
    pub minted_usd: Usd,
    pub fee_bps: Bps,
    pub fee_amount: Amount,
}

#[derive(Debug, Clone)]
pub struct WithdrawResult {
    pub burned_usd: Usd,
    pub amount_out: Amount,
    pub fee_bps: Bps,
    pub fee_amount: Amount,
}

#[derive(Debug, Clone)]
pub struct SwapResult {
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub fee_bps: Bps,
    pub fee_amount: Amount,
}

#[derive(Debug, Clone)]
pub struct IncreaseResult {
    pub price: Price,
    pub collateral_delta: Usd,
    pub fee: Usd,
    pub size: Usd,
}

#[derive(Debug, Clone)]
pub struct DecreaseResult {
    pub price: Price,
    pub usd_out: Usd,
    pub amount_out: Amount,
    pub fee: Usd,
    pub realized_pnl: Decimal,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct LiquidationResult {
    pub size: Usd,
    pub collateral: Usd,
    pub mark_price: Price,
    pub fee_to_liquidator: Amount,
    // set when the position was over max leverage but solvent, and was
    // force-decreased at market instead of seized
    pub deleveraged: bool,
}

// Position health classification. Insolvent positions are seized;
// over-leveraged but solvent ones are force-decreased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationState {
    Healthy,
    Insolvent,
    OverLeveraged,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    // configuration errors: rejected before any state mutation
    #[error("asset {0:?} is not whitelisted")]
    AssetNotWhitelisted(AssetId),

    #[error("swaps are disabled")]
    SwapsDisabled,

    #[error("leverage is disabled")]
    LeverageDisabled,

    #[error("swap assets must differ, got {0:?} twice")]
    IdenticalAssets(AssetId),

    #[error("long collateral {collateral:?} must equal index asset {index:?}")]
    CollateralIndexMismatch { collateral: AssetId, index: AssetId },

    #[error("long collateral {0:?} must not be a stable asset")]
    StableCollateralForLong(AssetId),

    #[error("short collateral {0:?} must be a stable asset")]
    CollateralNotStable(AssetId),

    #[error("index asset {0:?} is not shortable")]
    AssetNotShortable(AssetId),

    #[error("account {0:?} is not an authorized liquidator")]
    UnauthorizedLiquidator(AccountId),

    // zero-resolution errors
    #[error("no value was transferred in")]
    ZeroAmountIn,

    #[error("deposit resolves to zero accounting units")]
    ZeroMintAmount,

    #[error("redemption resolves to zero output")]
    ZeroRedemptionAmount,

    #[error("swap resolves to zero output")]
    ZeroSwapOutput,

    // solvency guards: the invariant boundary
    #[error("accounting-unit cap exceeded for {asset:?}: {attempted} > {cap}")]
    UnitCapExceeded {
        asset: AssetId,
        attempted: Usd,
        cap: Usd,
    },

    #[error("reserve would exceed pool for {asset:?}: {attempted} > {available}")]
    ReserveExceedsPool {
        asset: AssetId,
        attempted: Amount,
        available: Amount,
    },

    #[error("pool for {asset:?} would fall below buffer: {attempted} < {buffer}")]
    PoolBelowBuffer {
        asset: AssetId,
        attempted: Amount,
        buffer: Amount,
    },

    #[error("pool for {asset:?} exhausted: requested {requested}, available {available}")]
    PoolExhausted {
        asset: AssetId,
        requested: Amount,
        available: Amount,
    },

    #[error("collateral {collateral} cannot cover fees {fee}")]
    InsufficientCollateralForFees { collateral: Usd, fee: Usd },

    #[error("losses {loss} exceed collateral {collateral}")]
    LossesExceedCollateral { loss: Usd, collateral: Usd },

    #[error("position size must be positive")]
    EmptyPosition,

    #[error("position collateral must be positive while size is open")]
    EmptyCollateral,

    #[error("position size {size} must not be below collateral {collateral}")]
    SizeBelowCollateral { size: Usd, collateral: Usd },

    #[error("max leverage exceeded: size {size} over collateral {collateral}")]
    MaxLeverageExceeded { size: Usd, collateral: Usd },

    #[error("max global short size exceeded for {asset:?}: {attempted} > {cap}")]
    MaxGlobalShortExceeded {
        asset: AssetId,
        attempted: Usd,
        cap: Usd,
    },

    // not-found errors
    #[error("position does not exist")]
    PositionNotFound,

    #[error("size delta {delta} exceeds position size {size}")]
    SizeDeltaExceedsPosition { delta: Usd, size: Usd },

    #[error("collateral delta {delta} exceeds position collateral {collateral}")]
    CollateralDeltaExceedsPosition { delta: Usd, collateral: Usd },

    #[error("position cannot be liquidated")]
    PositionHealthy,

    #[error("vault operation re-entered")]
    Reentered,

    #[error(transparent)]
    Bank(#[from] BankError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}
