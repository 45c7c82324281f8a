//! Multi-asset ledger collaborator
//!
//! The economy engines never do their own balance bookkeeping; they talk to
//! a `Ledger` and stage multi-step mutations as a `LedgerBatch` so a failed
//! precondition can never leave a partial burn or mint behind.

use crate::error::{EconomyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type TokenId = u64;

/// A single ledger mutation.
///
/// `MintBatch` exists so that all tiles from one opened pack unit land in
/// the ledger as one event, mirroring an ERC-1155 TransferBatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    Mint {
        to: String,
        token_id: TokenId,
        amount: u64,
    },
    MintBatch {
        to: String,
        token_ids: Vec<TokenId>,
    },
    Burn {
        from: String,
        token_id: TokenId,
        amount: u64,
    },
    Transfer {
        from: String,
        to: String,
        token_id: TokenId,
        amount: u64,
    },
}

/// An ordered set of ledger mutations that commit or abort as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBatch {
    ops: Vec<LedgerOp>,
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self, to: &str, token_id: TokenId, amount: u64) {
        self.ops.push(LedgerOp::Mint {
            to: to.to_string(),
            token_id,
            amount,
        });
    }

    pub fn mint_batch(&mut self, to: &str, token_ids: Vec<TokenId>) {
        self.ops.push(LedgerOp::MintBatch {
            to: to.to_string(),
            token_ids,
        });
    }

    pub fn burn(&mut self, from: &str, token_id: TokenId, amount: u64) {
        self.ops.push(LedgerOp::Burn {
            from: from.to_string(),
            token_id,
            amount,
        });
    }

    pub fn transfer(&mut self, from: &str, to: &str, token_id: TokenId, amount: u64) {
        self.ops.push(LedgerOp::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            token_id,
            amount,
        });
    }

    pub fn ops(&self) -> &[LedgerOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// External balance ledger the engines compose their operations from.
///
/// Every call is atomic on its own; `apply` makes a whole batch atomic.
pub trait Ledger {
    fn balance_of(&self, holder: &str, token_id: TokenId) -> u64;
    fn total_supply(&self, token_id: TokenId) -> u64;
    fn is_approved_for_all(&self, owner: &str, operator: &str) -> bool;

    fn mint(&mut self, to: &str, token_id: TokenId, amount: u64) -> Result<()>;
    fn burn(&mut self, from: &str, token_id: TokenId, amount: u64) -> Result<()>;

    /// Transfer enforcing the caller is the owner or an approved operator.
    fn safe_transfer(
        &mut self,
        caller: &str,
        from: &str,
        to: &str,
        token_id: TokenId,
        amount: u64,
    ) -> Result<()>;

    /// Apply every op in the batch, or none of them.
    fn apply(&mut self, batch: LedgerBatch) -> Result<()>;
}

/// In-memory reference ledger.
///
/// Keeps an event log of committed ops so tests (and callers interested in
/// pack contents) can observe batched mints the way ERC-1155 clients watch
/// TransferBatch events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: HashMap<String, HashMap<TokenId, u64>>,
    total_supply: HashMap<TokenId, u64>,
    approvals: HashMap<String, HashSet<String>>,
    events: Vec<LedgerOp>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_approval_for_all(&mut self, owner: &str, operator: &str, approved: bool) {
        let entry = self.approvals.entry(owner.to_string()).or_default();
        if approved {
            entry.insert(operator.to_string());
        } else {
            entry.remove(operator);
        }
    }

    /// Committed ops, oldest first.
    pub fn events(&self) -> &[LedgerOp] {
        &self.events
    }

    fn credit(&mut self, to: &str, token_id: TokenId, amount: u64) -> Result<()> {
        let balance = self
            .balances
            .entry(to.to_string())
            .or_default()
            .entry(token_id)
            .or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let supply = self.total_supply.entry(token_id).or_insert(0);
        *supply = supply
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        Ok(())
    }

    fn debit(&mut self, from: &str, token_id: TokenId, amount: u64) -> Result<()> {
        let available = self.balance_of(from, token_id);
        if available < amount {
            return Err(EconomyError::InsufficientBalance {
                token_id,
                required: amount,
                available,
            });
        }
        if let Some(balance) = self
            .balances
            .get_mut(from)
            .and_then(|tokens| tokens.get_mut(&token_id))
        {
            *balance -= amount;
        }
        Ok(())
    }

    fn apply_op(&mut self, op: &LedgerOp) -> Result<()> {
        match op {
            LedgerOp::Mint {
                to,
                token_id,
                amount,
            } => self.credit(to, *token_id, *amount),
            LedgerOp::MintBatch { to, token_ids } => {
                for token_id in token_ids {
                    self.credit(to, *token_id, 1)?;
                }
                Ok(())
            }
            LedgerOp::Burn {
                from,
                token_id,
                amount,
            } => {
                self.debit(from, *token_id, *amount)?;
                let supply = self.total_supply.entry(*token_id).or_insert(0);
                *supply = supply.saturating_sub(*amount);
                Ok(())
            }
            LedgerOp::Transfer {
                from,
                to,
                token_id,
                amount,
            } => {
                self.debit(from, *token_id, *amount)?;
                let balance = self
                    .balances
                    .entry(to.to_string())
                    .or_default()
                    .entry(*token_id)
                    .or_insert(0);
                *balance = balance
                    .checked_add(*amount)
                    .ok_or(EconomyError::ArithmeticOverflow)?;
                Ok(())
            }
        }
    }
}

impl Ledger for InMemoryLedger {
    fn balance_of(&self, holder: &str, token_id: TokenId) -> u64 {
        self.balances
            .get(holder)
            .and_then(|tokens| tokens.get(&token_id))
            .copied()
            .unwrap_or(0)
    }

    fn total_supply(&self, token_id: TokenId) -> u64 {
        self.total_supply.get(&token_id).copied().unwrap_or(0)
    }

    fn is_approved_for_all(&self, owner: &str, operator: &str) -> bool {
        self.approvals
            .get(owner)
            .map(|ops| ops.contains(operator))
            .unwrap_or(false)
    }

    fn mint(&mut self, to: &str, token_id: TokenId, amount: u64) -> Result<()> {
        let mut batch = LedgerBatch::new();
        batch.mint(to, token_id, amount);
        self.apply(batch)
    }

    fn burn(&mut self, from: &str, token_id: TokenId, amount: u64) -> Result<()> {
        let mut batch = LedgerBatch::new();
        batch.burn(from, token_id, amount);
        self.apply(batch)
    }

    fn safe_transfer(
        &mut self,
        caller: &str,
        from: &str,
        to: &str,
        token_id: TokenId,
        amount: u64,
    ) -> Result<()> {
        if caller != from && !self.is_approved_for_all(from, caller) {
            return Err(EconomyError::Capability(
                "caller is not owner nor approved".to_string(),
            ));
        }
        let mut batch = LedgerBatch::new();
        batch.transfer(from, to, token_id, amount);
        self.apply(batch)
    }

    fn apply(&mut self, batch: LedgerBatch) -> Result<()> {
        // Run the whole batch against a scratch copy; commit only on success.
        let mut staged = self.clone();
        for op in batch.ops() {
            staged.apply_op(op)?;
        }
        staged.events.extend(batch.ops().iter().cloned());
        *self = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", 1, 10).unwrap();
        assert_eq!(ledger.balance_of("alice", 1), 10);
        assert_eq!(ledger.total_supply(1), 10);
    }

    #[test]
    fn test_burn_checks_balance() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", 1, 2).unwrap();
        let result = ledger.burn("alice", 1, 3);
        assert_eq!(
            result,
            Err(EconomyError::InsufficientBalance {
                token_id: 1,
                required: 3,
                available: 2,
            })
        );
        // Failed burn left the balance alone
        assert_eq!(ledger.balance_of("alice", 1), 2);
    }

    #[test]
    fn test_transfer_preserves_supply() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", 4, 42).unwrap();
        ledger.safe_transfer("alice", "alice", "bob", 4, 1).unwrap();
        assert_eq!(ledger.balance_of("alice", 4), 41);
        assert_eq!(ledger.balance_of("bob", 4), 1);
        assert_eq!(ledger.total_supply(4), 42);
    }

    #[test]
    fn test_transfer_requires_approval() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", 1, 5).unwrap();

        let result = ledger.safe_transfer("mallory", "alice", "mallory", 1, 1);
        assert!(matches!(result, Err(EconomyError::Capability(_))));

        ledger.set_approval_for_all("alice", "carol", true);
        ledger.safe_transfer("carol", "alice", "carol", 1, 1).unwrap();
        assert_eq!(ledger.balance_of("carol", 1), 1);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut ledger = InMemoryLedger::new();
        ledger.mint("alice", 1, 1).unwrap();

        let mut batch = LedgerBatch::new();
        batch.burn("alice", 1, 1);
        batch.burn("alice", 2, 1); // alice holds none of token 2
        batch.mint("alice", 3, 1);

        assert!(ledger.apply(batch).is_err());
        // First burn in the failed batch was rolled back
        assert_eq!(ledger.balance_of("alice", 1), 1);
        assert_eq!(ledger.balance_of("alice", 3), 0);
    }

    #[test]
    fn test_mint_batch_logs_one_event() {
        let mut ledger = InMemoryLedger::new();
        let mut batch = LedgerBatch::new();
        batch.mint_batch("alice", vec![1, 2, 2, 5]);
        ledger.apply(batch).unwrap();

        assert_eq!(ledger.balance_of("alice", 2), 2);
        let batches = ledger
            .events()
            .iter()
            .filter(|op| matches!(op, LedgerOp::MintBatch { .. }))
            .count();
        assert_eq!(batches, 1);
    }
}
