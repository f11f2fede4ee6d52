// vault-core: shared-liquidity leveraged trading engine.
// solvency-first architecture: the pool balance identity and reserve bounds
// take priority. all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, Holder, Side, Usd, Amount, Price, Bps
//   2.x  asset.rs: whitelisted asset config + per-asset pool ledger
//   3.x  fees.rs: dynamic target-weight fee curve, margin and funding fees
//   4.x  position.rs: position struct, entry-price blending, mark deltas
//   5.x  funding.rs: utilization funding, whole-interval accrual
//   7.x  config.rs: vault and order-engine parameters, presets
//   8.x  vault/: the vault service: liquidity, swap, positions, liquidations
//   9.x  orders/: conditional orders: slot store, lifecycle, execution
//   11.x events.rs: state transition events for audit
//
// external seams (consumed, not owned):
//   oracle.rs: min/max price per asset
//   bank.rs: atomic value transfer + accounting-unit mint/burn

// core ledger modules
pub mod asset;
pub mod fees;
pub mod funding;
pub mod position;
pub mod types;

// services
pub mod orders;
pub mod vault;

// seams and plumbing
pub mod bank;
pub mod config;
pub mod events;
pub mod oracle;

// re exports for convenience
pub use asset::*;
pub use bank::{Bank, BankError};
pub use config::{ConfigError, OrderParams, VaultParams};
pub use events::*;
pub use fees::*;
pub use funding::{accrue, intervals_elapsed, next_funding_rate, FundingAccrual};
pub use oracle::{OracleBook, OracleError, PriceOracle};
pub use orders::{
    DecreaseOrder, IncreaseOrder, OrderEngine, OrderError, OrderKind, SwapOrder,
};
pub use position::*;
pub use types::*;
pub use vault::{
    DecreaseResult, IncreaseResult, LiquidationResult, LiquidationState, SupplyResult,
    SwapResult, Vault, VaultError, WithdrawResult,
};
