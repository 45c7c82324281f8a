//! Reward Accrual Ledger
//!
//! Holders of scene reward tokens accrue claimable points over time. There
//! is no ticking clock: each holder has a lazily evaluated checkpoint that
//! is folded forward whenever their reward-token count changes, and claims
//! are computed purely from the checkpoint and the current timestamp.

pub mod checkpoint;
pub mod ledger;

pub use checkpoint::ClaimCheckpoint;
pub use ledger::AccrualLedger;

/// Accrual constants
pub mod constants {
    /// Points accrued per held reward token per whole elapsed day
    pub const POINTS_PER_TOKEN_PER_DAY: u64 = 1;
}
