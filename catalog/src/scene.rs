//! Scene, puzzle and tile-class structures

use crate::{ClassId, SceneId};
use serde::{Deserialize, Serialize};
use tile_core::{EconomyError, Result, TokenId};

/// A rarity class owning a contiguous run of a scene's tile tokens.
///
/// `editions_per_tile` is the per-tile edition cap the pack opener draws
/// against; a class is live while any of its tiles has stock left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileClass {
    pub id: ClassId,
    pub token_ids: Vec<TokenId>,
    pub editions_per_tile: u64,
}

/// A themed set of puzzles sharing one decaying reward pool.
///
/// Tile token ids are contiguous from `tile_token_start`; the reward token
/// takes the id immediately after the tile range. `reward_pool_remaining`
/// only ever decreases. `classes` is empty until the scene is partitioned;
/// an unpartitioned scene draws uniformly over its whole tile range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub puzzle_count: u32,
    pub tiles_per_puzzle: u32,
    pub tile_token_start: TokenId,
    pub reward_token_id: TokenId,
    pub reward_pool_remaining: u64,
    pub reward_decay_rate_bps: u64,
    pub classes: Vec<TileClass>,
}

impl Scene {
    pub fn tile_token_count(&self) -> u64 {
        self.puzzle_count as u64 * self.tiles_per_puzzle as u64
    }

    /// Last tile token id, inclusive.
    pub fn tile_token_end(&self) -> TokenId {
        self.tile_token_start + self.tile_token_count() - 1
    }

    pub fn contains_tile(&self, token_id: TokenId) -> bool {
        token_id >= self.tile_token_start && token_id <= self.tile_token_end()
    }

    /// Tile token ids of one puzzle, derived from the contiguous layout.
    pub fn puzzle_tile_tokens(&self, puzzle_index: u32) -> Result<Vec<TokenId>> {
        if puzzle_index >= self.puzzle_count {
            return Err(EconomyError::Validation(format!(
                "scene {} has no puzzle {}",
                self.id, puzzle_index
            )));
        }
        let first = self.tile_token_start + puzzle_index as u64 * self.tiles_per_puzzle as u64;
        Ok((first..first + self.tiles_per_puzzle as u64).collect())
    }

    pub fn class(&self, class_id: ClassId) -> Option<&TileClass> {
        self.classes.iter().find(|class| class.id == class_id)
    }

    /// Class owning a tile token, if the scene is partitioned.
    pub fn class_of_token(&self, token_id: TokenId) -> Option<ClassId> {
        self.classes
            .iter()
            .find(|class| class.token_ids.contains(&token_id))
            .map(|class| class.id)
    }

    pub fn is_partitioned(&self) -> bool {
        !self.classes.is_empty()
    }
}

/// A fixed subset of a scene's tiles redeemable once fully collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    pub scene_id: SceneId,
    pub puzzle_index: u32,
    pub tile_token_ids: Vec<TokenId>,
    pub solve_count: u64,
}
