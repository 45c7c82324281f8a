//! Redemption engine

use accrual::AccrualLedger;
use catalog::{SceneId, SceneRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tile_core::constants::{BPS_DENOMINATOR, CURRENCY_TOKEN_ID};
use tile_core::{EconomyError, Ledger, LedgerBatch, Result};
use tracing::info;

/// How a redemption payout reaches the holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutPolicy {
    /// Credit the pool payout to the holder's currency balance immediately
    Instant,
    /// Ignore the direct credit; holding the reward token raises the
    /// holder's point-accrual rate instead
    Accrual,
}

#[derive(Debug, Clone)]
pub struct RedemptionEngine {
    policy: PayoutPolicy,
}

impl RedemptionEngine {
    pub fn new(policy: PayoutPolicy) -> Self {
        RedemptionEngine { policy }
    }

    pub fn policy(&self) -> PayoutPolicy {
        self.policy
    }

    /// Redeem one completed puzzle.
    ///
    /// Requires the holder to own at least one of every tile in the puzzle.
    /// Burns one of each, mints one reward token, drains
    /// `floor(pool * decay_bps / 10000)` from the scene pool and checkpoints
    /// the holder's accrual. All of it commits or none of it does.
    pub fn redeem_puzzle<L: Ledger>(
        &self,
        registry: &mut SceneRegistry,
        accrual: &mut AccrualLedger,
        ledger: &mut L,
        scene_id: SceneId,
        puzzle_index: u32,
        holder: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let scene = registry.scene(scene_id)?;
        let reward_token_id = scene.reward_token_id;
        let payout = scene
            .reward_pool_remaining
            .checked_mul(scene.reward_decay_rate_bps)
            .ok_or(EconomyError::ArithmeticOverflow)?
            / BPS_DENOMINATOR;
        let tile_token_ids = registry.puzzle(scene_id, puzzle_index)?.tile_token_ids.clone();

        for token_id in &tile_token_ids {
            let available = ledger.balance_of(holder, *token_id);
            if available < 1 {
                return Err(EconomyError::InsufficientBalance {
                    token_id: *token_id,
                    required: 1,
                    available,
                });
            }
        }

        // Validate the checkpoint fold before any state moves
        let new_count = accrual
            .held_count(holder)
            .checked_add(1)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        accrual.get_claim_info(holder, now)?;

        let mut batch = LedgerBatch::new();
        for token_id in &tile_token_ids {
            batch.burn(holder, *token_id, 1);
        }
        batch.mint(holder, reward_token_id, 1);
        if self.policy == PayoutPolicy::Instant && payout > 0 {
            batch.mint(holder, CURRENCY_TOKEN_ID, payout);
        }
        ledger.apply(batch)?;

        // Infallible after the checks above
        registry.apply_redemption(scene_id, puzzle_index, payout)?;
        accrual.on_reward_balance_change(holder, new_count, now)?;

        info!(scene_id, puzzle_index, holder, payout, "puzzle redeemed");
        Ok(payout)
    }
}
