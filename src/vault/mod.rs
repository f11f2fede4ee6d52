// 8.0: the vault service. owns pool accounting, the position ledger, fee
// collection and funding accrual. deterministic, single-threaded, no
// external I/O beyond the bank and oracle seams.

mod core;
mod funding;
mod liquidations;
mod liquidity;
mod positions;
mod pricing;
mod results;
mod swap;

pub use core::Vault;
pub use results::{
    DecreaseResult, IncreaseResult, LiquidationResult, LiquidationState, SupplyResult, SwapResult,
    VaultError, WithdrawResult,
};
