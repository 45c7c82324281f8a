//! Accrual ledger: checkpoint folds, claims, checkpointed transfers

use crate::checkpoint::ClaimCheckpoint;
use crate::constants::POINTS_PER_TOKEN_PER_DAY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tile_core::constants::CURRENCY_TOKEN_ID;
use tile_core::{EconomyError, Ledger, Result, TokenId};
use tracing::{debug, info};

/// Per-holder accrual state for scene reward tokens.
///
/// Checkpoints are created lazily on first reward-token receipt and never
/// deleted; a claim only zeroes the accrued points. Every reward-token
/// balance change must be reported here so points are folded at the count
/// that was actually held.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccrualLedger {
    checkpoints: HashMap<String, ClaimCheckpoint>,
}

impl AccrualLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reward-token count as of the holder's last checkpoint.
    pub fn held_count(&self, holder: &str) -> u64 {
        self.checkpoints
            .get(holder)
            .map(|cp| cp.held_reward_tokens)
            .unwrap_or(0)
    }

    pub fn checkpoint(&self, holder: &str) -> Option<&ClaimCheckpoint> {
        self.checkpoints.get(holder)
    }

    /// Fold owed points at the OLD count, then record the new count.
    ///
    /// Runs on reward-token mint and on both sides of a transfer, each side
    /// independently.
    pub fn on_reward_balance_change(
        &mut self,
        holder: &str,
        new_count: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match self.checkpoints.get_mut(holder) {
            Some(checkpoint) => {
                checkpoint.fold(now, POINTS_PER_TOKEN_PER_DAY)?;
                checkpoint.held_reward_tokens = new_count;
            }
            None => {
                self.checkpoints
                    .insert(holder.to_string(), ClaimCheckpoint::new(new_count, now));
            }
        }
        debug!(holder, new_count, "reward checkpoint folded");
        Ok(())
    }

    /// Claimable points at `now`. Pure read; never blocks, never mutates.
    pub fn get_claim_info(&self, holder: &str, now: DateTime<Utc>) -> Result<u64> {
        match self.checkpoints.get(holder) {
            Some(checkpoint) => checkpoint.projected(now, POINTS_PER_TOKEN_PER_DAY),
            None => Ok(0),
        }
    }

    /// Mint all claimable points to the holder as reward currency and
    /// restart the clock. A second claim at the same instant yields 0.
    pub fn claim_reward<L: Ledger>(
        &mut self,
        ledger: &mut L,
        holder: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let Some(checkpoint) = self.checkpoints.get(holder) else {
            return Ok(0);
        };
        let total = checkpoint.projected(now, POINTS_PER_TOKEN_PER_DAY)?;
        if total > 0 {
            ledger.mint(holder, CURRENCY_TOKEN_ID, total)?;
        }
        if let Some(checkpoint) = self.checkpoints.get_mut(holder) {
            checkpoint.accrued_points = 0;
            checkpoint.last_timestamp = now;
        }
        info!(holder, points = total, "reward claimed");
        Ok(total)
    }

    /// Transfer reward tokens with both sides checkpointed.
    ///
    /// The sender folds at the pre-transfer count, then continues accruing
    /// at `count - amount`; the receiver at `count + amount`. Checkpoint
    /// math is validated before the ledger moves anything, so a failure on
    /// either side aborts the whole transfer.
    pub fn transfer_reward<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: &str,
        from: &str,
        to: &str,
        reward_token_id: TokenId,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let sender_count = self.held_count(from);
        if amount > sender_count {
            return Err(EconomyError::InsufficientBalance {
                token_id: reward_token_id,
                required: amount,
                available: sender_count,
            });
        }
        let new_sender_count = sender_count - amount;
        let new_receiver_count = self
            .held_count(to)
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        // Validate both folds up front
        if let Some(checkpoint) = self.checkpoints.get(from) {
            checkpoint.projected(now, POINTS_PER_TOKEN_PER_DAY)?;
        }
        if let Some(checkpoint) = self.checkpoints.get(to) {
            checkpoint.projected(now, POINTS_PER_TOKEN_PER_DAY)?;
        }

        ledger.safe_transfer(caller, from, to, reward_token_id, amount)?;

        self.on_reward_balance_change(from, new_sender_count, now)?;
        self.on_reward_balance_change(to, new_receiver_count, now)?;
        Ok(())
    }
}
