//! Economy error types

use crate::ledger::TokenId;
use thiserror::Error;

/// Errors shared by every engine in the economy.
///
/// Each kind carries a stable message that external callers pattern-match on,
/// so the literals here must not change between releases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    #[error("invalid parameters: {0}")]
    Validation(String),

    #[error("missing capability: {0}")]
    Capability(String),

    #[error("insufficient balance: token {token_id} requires {required}, have {available}")]
    InsufficientBalance {
        token_id: TokenId,
        required: u64,
        available: u64,
    },

    #[error("not enough packs left")]
    SupplyExhausted,

    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

pub type Result<T> = std::result::Result<T, EconomyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_exhausted_message_is_stable() {
        assert_eq!(
            EconomyError::SupplyExhausted.to_string(),
            "not enough packs left"
        );
    }

    #[test]
    fn test_insufficient_balance_names_token() {
        let err = EconomyError::InsufficientBalance {
            token_id: 7,
            required: 1,
            available: 0,
        };
        assert!(err.to_string().contains("token 7"));
    }
}
