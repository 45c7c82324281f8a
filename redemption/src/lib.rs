//! Puzzle Redemption Engine
//!
//! Verifies puzzle completion, burns the tile set, mints the scene's
//! reward token and pays out of the scene's decaying pool: either as an
//! instant currency credit or by feeding the holder's time-based accrual,
//! chosen explicitly at engine construction.

pub mod engine;

pub use engine::{PayoutPolicy, RedemptionEngine};
