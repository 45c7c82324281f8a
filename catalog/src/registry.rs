//! Scene registry: catalog storage, id allocation and counter mutators

use crate::boxes::BoxDef;
use crate::scene::{Puzzle, Scene, TileClass};
use crate::{BoxId, ClassId, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tile_core::{Authorizer, Capability, EconomyError, Result, TokenId};
use tracing::info;

/// Catalog of scenes, puzzles and boxes.
///
/// Token ids are allocated contiguously starting at 1 (id 0 is the reward
/// currency). Definitions are immutable after creation except for the
/// counters mutated through `apply_redemption`, `note_box_minted` and
/// `take_box_supply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneRegistry {
    scenes: HashMap<SceneId, Scene>,
    puzzles: HashMap<(SceneId, u32), Puzzle>,
    boxes: HashMap<BoxId, BoxDef>,
    next_scene_id: SceneId,
    next_box_id: BoxId,
    next_token_id: TokenId,
}

impl SceneRegistry {
    pub fn new() -> Self {
        SceneRegistry {
            scenes: HashMap::new(),
            puzzles: HashMap::new(),
            boxes: HashMap::new(),
            next_scene_id: 1,
            next_box_id: 1,
            next_token_id: 1,
        }
    }

    fn require(auth: &dyn Authorizer, capability: Capability, caller: &str) -> Result<()> {
        if !auth.check(capability, caller) {
            return Err(EconomyError::Capability(format!(
                "{} lacks {:?}",
                caller, capability
            )));
        }
        Ok(())
    }

    /// Create a scene and derive its puzzles.
    ///
    /// Allocates `puzzle_count * tiles_per_puzzle` contiguous tile ids and
    /// one reward-token id directly after them.
    pub fn create_scene(
        &mut self,
        auth: &dyn Authorizer,
        caller: &str,
        puzzle_count: u32,
        tiles_per_puzzle: u32,
        reward_pool_total: u64,
        decay_rate_bps: u64,
    ) -> Result<SceneId> {
        Self::require(auth, Capability::Creator, caller)?;
        if puzzle_count == 0 || tiles_per_puzzle == 0 {
            return Err(EconomyError::Validation(
                "scene needs at least one puzzle and one tile per puzzle".to_string(),
            ));
        }
        if decay_rate_bps > tile_core::constants::BPS_DENOMINATOR {
            return Err(EconomyError::Validation(format!(
                "decay rate {} bps exceeds 10000",
                decay_rate_bps
            )));
        }

        let tile_count = puzzle_count as u64 * tiles_per_puzzle as u64;
        let tile_token_start = self.next_token_id;
        let reward_token_id = tile_token_start
            .checked_add(tile_count)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let next_free = reward_token_id
            .checked_add(1)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        let scene_id = self.next_scene_id;
        let scene = Scene {
            id: scene_id,
            puzzle_count,
            tiles_per_puzzle,
            tile_token_start,
            reward_token_id,
            reward_pool_remaining: reward_pool_total,
            reward_decay_rate_bps: decay_rate_bps,
            classes: Vec::new(),
        };
        for puzzle_index in 0..puzzle_count {
            let tile_token_ids = scene.puzzle_tile_tokens(puzzle_index)?;
            self.puzzles.insert(
                (scene_id, puzzle_index),
                Puzzle {
                    scene_id,
                    puzzle_index,
                    tile_token_ids,
                    solve_count: 0,
                },
            );
        }
        self.scenes.insert(scene_id, scene);
        self.next_scene_id += 1;
        self.next_token_id = next_free;

        info!(
            scene_id,
            puzzle_count, tiles_per_puzzle, reward_pool_total, "scene created"
        );
        Ok(scene_id)
    }

    /// Split a scene's tile range into rarity classes.
    ///
    /// Counts must cover the range exactly; each tile gets
    /// `editions_per_tile` units of draw stock. One-shot per scene.
    pub fn partition_tiles(
        &mut self,
        auth: &dyn Authorizer,
        caller: &str,
        scene_id: SceneId,
        class_ids: &[ClassId],
        class_tile_counts: &[u64],
        editions_per_tile: u64,
    ) -> Result<()> {
        Self::require(auth, Capability::Creator, caller)?;
        let scene = self
            .scenes
            .get(&scene_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown scene {}", scene_id)))?;
        if scene.is_partitioned() {
            return Err(EconomyError::Validation(format!(
                "scene {} is already partitioned",
                scene_id
            )));
        }
        if class_ids.is_empty() || class_ids.len() != class_tile_counts.len() {
            return Err(EconomyError::Validation(
                "class ids and tile counts must be parallel and non-empty".to_string(),
            ));
        }
        let unique: HashSet<&ClassId> = class_ids.iter().collect();
        if unique.len() != class_ids.len() || class_ids.contains(&0) {
            return Err(EconomyError::Validation(
                "class ids must be unique and non-zero".to_string(),
            ));
        }
        if editions_per_tile == 0 {
            return Err(EconomyError::Validation(
                "editions per tile must be positive".to_string(),
            ));
        }
        let mut total: u64 = 0;
        for count in class_tile_counts {
            total = total
                .checked_add(*count)
                .ok_or(EconomyError::ArithmeticOverflow)?;
        }
        if total != scene.tile_token_count() {
            return Err(EconomyError::Validation(format!(
                "class tile counts cover {} tiles, scene has {}",
                total,
                scene.tile_token_count()
            )));
        }

        let mut classes = Vec::with_capacity(class_ids.len());
        let mut cursor = scene.tile_token_start;
        for (class_id, count) in class_ids.iter().zip(class_tile_counts) {
            classes.push(TileClass {
                id: *class_id,
                token_ids: (cursor..cursor + count).collect(),
                editions_per_tile,
            });
            cursor += count;
        }
        // All checks passed; commit.
        if let Some(scene) = self.scenes.get_mut(&scene_id) {
            scene.classes = classes;
        }
        info!(scene_id, classes = class_ids.len(), "scene partitioned");
        Ok(())
    }

    /// Define a box over a scene.
    pub fn define_box(
        &mut self,
        auth: &dyn Authorizer,
        caller: &str,
        scene_id: SceneId,
        num_cards: u32,
        class_ids: Vec<ClassId>,
        class_probabilities_bps: Vec<u64>,
        guaranteed_class_ids: Vec<ClassId>,
        max_supply: u64,
    ) -> Result<BoxId> {
        Self::require(auth, Capability::Creator, caller)?;
        let scene = self
            .scenes
            .get(&scene_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown scene {}", scene_id)))?;
        BoxDef::validate(
            scene,
            num_cards,
            &class_ids,
            &class_probabilities_bps,
            &guaranteed_class_ids,
            max_supply,
        )?;

        let token_id = self.next_token_id;
        self.next_token_id = token_id
            .checked_add(1)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let box_id = self.next_box_id;
        self.boxes.insert(
            box_id,
            BoxDef {
                id: box_id,
                token_id,
                scene_id,
                num_cards,
                class_ids,
                class_probabilities_bps,
                guaranteed_class_ids,
                minted: 0,
                remaining_supply: max_supply,
                max_supply,
            },
        );
        self.next_box_id += 1;

        info!(box_id, scene_id, num_cards, max_supply, "box defined");
        Ok(box_id)
    }

    pub fn scene(&self, scene_id: SceneId) -> Result<&Scene> {
        self.scenes
            .get(&scene_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown scene {}", scene_id)))
    }

    pub fn puzzle(&self, scene_id: SceneId, puzzle_index: u32) -> Result<&Puzzle> {
        self.puzzles.get(&(scene_id, puzzle_index)).ok_or_else(|| {
            EconomyError::Validation(format!(
                "unknown puzzle {} in scene {}",
                puzzle_index, scene_id
            ))
        })
    }

    pub fn box_def(&self, box_id: BoxId) -> Result<&BoxDef> {
        self.boxes
            .get(&box_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown box {}", box_id)))
    }

    /// Highest token id allocated so far (0 if none).
    pub fn max_token_id(&self) -> TokenId {
        self.next_token_id - 1
    }

    /// Commit one redemption: drain `payout` from the pool, bump the solve
    /// counter. Callers check preconditions first; `payout` never exceeds
    /// the remaining pool because it is a bps fraction of it.
    pub fn apply_redemption(
        &mut self,
        scene_id: SceneId,
        puzzle_index: u32,
        payout: u64,
    ) -> Result<()> {
        let scene = self
            .scenes
            .get_mut(&scene_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown scene {}", scene_id)))?;
        scene.reward_pool_remaining = scene
            .reward_pool_remaining
            .checked_sub(payout)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let puzzle = self.puzzles.get_mut(&(scene_id, puzzle_index)).ok_or_else(|| {
            EconomyError::Validation(format!(
                "unknown puzzle {} in scene {}",
                puzzle_index, scene_id
            ))
        })?;
        puzzle.solve_count += 1;
        Ok(())
    }

    /// Record issuance of `quantity` box tokens against the cap.
    pub fn note_box_minted(&mut self, box_id: BoxId, quantity: u64) -> Result<()> {
        let box_def = self
            .boxes
            .get_mut(&box_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown box {}", box_id)))?;
        let minted = box_def
            .minted
            .checked_add(quantity)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        if minted > box_def.max_supply {
            return Err(EconomyError::SupplyExhausted);
        }
        box_def.minted = minted;
        Ok(())
    }

    /// Consume `quantity` units of openable supply.
    pub fn take_box_supply(&mut self, box_id: BoxId, quantity: u64) -> Result<()> {
        let box_def = self
            .boxes
            .get_mut(&box_id)
            .ok_or_else(|| EconomyError::Validation(format!("unknown box {}", box_id)))?;
        if box_def.remaining_supply < quantity {
            return Err(EconomyError::SupplyExhausted);
        }
        box_def.remaining_supply -= quantity;
        Ok(())
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_core::RoleTable;

    fn setup() -> (SceneRegistry, RoleTable) {
        (SceneRegistry::new(), RoleTable::with_owner("owner"))
    }

    #[test]
    fn test_create_scene_allocates_contiguous_ids() {
        let (mut registry, roles) = setup();
        let scene_id = registry
            .create_scene(&roles, "owner", 5, 6, 100_000, 500)
            .unwrap();
        let scene = registry.scene(scene_id).unwrap();
        assert_eq!(scene.tile_token_start, 1);
        assert_eq!(scene.reward_token_id, 31);
        assert_eq!(registry.max_token_id(), 31);

        // Second scene continues after the first
        let scene_id = registry
            .create_scene(&roles, "owner", 2, 2, 0, 0)
            .unwrap();
        let scene = registry.scene(scene_id).unwrap();
        assert_eq!(scene.tile_token_start, 32);
        assert_eq!(scene.reward_token_id, 36);
    }

    #[test]
    fn test_create_scene_requires_creator() {
        let (mut registry, roles) = setup();
        let result = registry.create_scene(&roles, "rando", 5, 6, 100_000, 500);
        assert!(matches!(result, Err(EconomyError::Capability(_))));
    }

    #[test]
    fn test_create_scene_rejects_zero_counts() {
        let (mut registry, roles) = setup();
        assert!(registry
            .create_scene(&roles, "owner", 0, 6, 0, 0)
            .is_err());
        assert!(registry
            .create_scene(&roles, "owner", 5, 0, 0, 0)
            .is_err());
    }

    #[test]
    fn test_partition_counts_must_cover_range() {
        let (mut registry, roles) = setup();
        let scene_id = registry
            .create_scene(&roles, "owner", 5, 6, 0, 0)
            .unwrap();
        let result =
            registry.partition_tiles(&roles, "owner", scene_id, &[1, 2], &[20, 9], 10);
        assert!(matches!(result, Err(EconomyError::Validation(_))));

        registry
            .partition_tiles(&roles, "owner", scene_id, &[1, 2], &[20, 10], 10)
            .unwrap();
        let scene = registry.scene(scene_id).unwrap();
        assert_eq!(scene.class(1).unwrap().token_ids.len(), 20);
        assert_eq!(scene.class(2).unwrap().token_ids, (21..=30).collect::<Vec<_>>());

        // One-shot
        let result =
            registry.partition_tiles(&roles, "owner", scene_id, &[1, 2], &[20, 10], 10);
        assert!(result.is_err());
    }

    #[test]
    fn test_define_box_rejects_bad_probability_sum() {
        let (mut registry, roles) = setup();
        let scene_id = registry
            .create_scene(&roles, "owner", 5, 6, 0, 0)
            .unwrap();
        let before = registry.max_token_id();
        let result = registry.define_box(
            &roles,
            "owner",
            scene_id,
            4,
            vec![1, 2],
            vec![6000, 3000],
            vec![],
            100,
        );
        assert!(matches!(result, Err(EconomyError::Validation(_))));
        // Nothing was created
        assert_eq!(registry.max_token_id(), before);
        assert!(registry.box_def(1).is_err());
    }

    #[test]
    fn test_box_supply_never_exceeds_cap() {
        let (mut registry, roles) = setup();
        let scene_id = registry
            .create_scene(&roles, "owner", 5, 6, 0, 0)
            .unwrap();
        let box_id = registry
            .define_box(
                &roles,
                "owner",
                scene_id,
                4,
                vec![1],
                vec![10_000],
                vec![],
                1200,
            )
            .unwrap();

        assert_eq!(
            registry.take_box_supply(box_id, 1300),
            Err(EconomyError::SupplyExhausted)
        );
        assert_eq!(registry.box_def(box_id).unwrap().remaining_supply, 1200);

        registry.take_box_supply(box_id, 1200).unwrap();
        assert!(registry.box_def(box_id).unwrap().is_sold_out());
        assert_eq!(
            registry.take_box_supply(box_id, 1),
            Err(EconomyError::SupplyExhausted)
        );
    }

    #[test]
    fn test_apply_redemption_drains_pool_and_counts() {
        let (mut registry, roles) = setup();
        let scene_id = registry
            .create_scene(&roles, "owner", 5, 6, 100_000, 500)
            .unwrap();
        registry.apply_redemption(scene_id, 0, 5000).unwrap();
        assert_eq!(registry.scene(scene_id).unwrap().reward_pool_remaining, 95_000);
        assert_eq!(registry.puzzle(scene_id, 0).unwrap().solve_count, 1);
    }
}
