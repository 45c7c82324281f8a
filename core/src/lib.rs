//! Tile Economy Core Library
//!
//! Shared vocabulary for the tile-game economy engines:
//! - Error taxonomy used across every crate
//! - The multi-asset `Ledger` collaborator (balances, mint/burn/transfer,
//!   operator approvals) with an in-memory reference implementation
//! - The `Authorizer` capability-check collaborator with a role table

pub mod authorizer;
pub mod error;
pub mod ledger;

// Re-export main types
pub use authorizer::{Authorizer, Capability, RoleTable};
pub use error::{EconomyError, Result};
pub use ledger::{InMemoryLedger, Ledger, LedgerBatch, LedgerOp, TokenId};

/// Economy-wide constants
pub mod constants {
    use super::TokenId;

    /// Token id of the spendable reward currency (all collectible ids start at 1)
    pub const CURRENCY_TOKEN_ID: TokenId = 0;

    /// Basis-point denominator for probability tables and decay rates
    pub const BPS_DENOMINATOR: u64 = 10_000;
}
