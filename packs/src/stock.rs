//! Live per-tile draw stock for partitioned scenes

use catalog::{ClassId, Scene};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tile_core::TokenId;

/// Remaining editions per tile, grouped by rarity class.
///
/// Built once from a scene's partition; the opener decrements it as tiles
/// are drawn. A class is live while any of its tiles has stock left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneStock {
    class_tokens: HashMap<ClassId, Vec<TokenId>>,
    tile_remaining: HashMap<TokenId, u64>,
}

impl SceneStock {
    pub fn from_scene(scene: &Scene) -> Self {
        let mut class_tokens = HashMap::new();
        let mut tile_remaining = HashMap::new();
        for class in &scene.classes {
            class_tokens.insert(class.id, class.token_ids.clone());
            for token_id in &class.token_ids {
                tile_remaining.insert(*token_id, class.editions_per_tile);
            }
        }
        SceneStock {
            class_tokens,
            tile_remaining,
        }
    }

    pub fn remaining(&self, token_id: TokenId) -> u64 {
        self.tile_remaining.get(&token_id).copied().unwrap_or(0)
    }

    /// Total stock left across a class.
    pub fn class_live_stock(&self, class_id: ClassId) -> u64 {
        self.class_tokens
            .get(&class_id)
            .map(|tokens| tokens.iter().map(|id| self.remaining(*id)).sum())
            .unwrap_or(0)
    }

    /// Tile ids in a class that still have stock, in id order.
    pub fn live_tokens(&self, class_id: ClassId) -> Vec<TokenId> {
        self.class_tokens
            .get(&class_id)
            .map(|tokens| {
                tokens
                    .iter()
                    .copied()
                    .filter(|id| self.remaining(*id) > 0)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Consume one edition of a tile. Returns false if already exhausted.
    pub fn take(&mut self, token_id: TokenId) -> bool {
        match self.tile_remaining.get_mut(&token_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::TileClass;

    fn scene() -> Scene {
        Scene {
            id: 1,
            puzzle_count: 2,
            tiles_per_puzzle: 2,
            tile_token_start: 1,
            reward_token_id: 5,
            reward_pool_remaining: 0,
            reward_decay_rate_bps: 0,
            classes: vec![
                TileClass {
                    id: 1,
                    token_ids: vec![1, 2, 3],
                    editions_per_tile: 2,
                },
                TileClass {
                    id: 2,
                    token_ids: vec![4],
                    editions_per_tile: 1,
                },
            ],
        }
    }

    #[test]
    fn test_stock_follows_partition() {
        let stock = SceneStock::from_scene(&scene());
        assert_eq!(stock.class_live_stock(1), 6);
        assert_eq!(stock.class_live_stock(2), 1);
        assert_eq!(stock.live_tokens(1), vec![1, 2, 3]);
    }

    #[test]
    fn test_take_exhausts_tiles_and_classes() {
        let mut stock = SceneStock::from_scene(&scene());
        assert!(stock.take(4));
        assert!(!stock.take(4));
        assert_eq!(stock.class_live_stock(2), 0);
        assert!(stock.live_tokens(2).is_empty());
    }
}
