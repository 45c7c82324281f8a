//! Box (pack) definitions

use crate::scene::Scene;
use crate::{BoxId, ClassId, SceneId};
use serde::{Deserialize, Serialize};
use tile_core::constants::BPS_DENOMINATOR;
use tile_core::{EconomyError, Result, TokenId};

/// A purchasable pack that opens into `num_cards` randomly drawn tiles.
///
/// `class_ids` and `class_probabilities_bps` are parallel and the
/// probabilities sum to exactly 10000 at definition time.
/// `guaranteed_class_ids` pins a prefix of the card slots to fixed classes.
/// `remaining_supply` gates opening and never increases; `minted` tracks
/// issuance against `max_supply`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxDef {
    pub id: BoxId,
    pub token_id: TokenId,
    pub scene_id: SceneId,
    pub num_cards: u32,
    pub class_ids: Vec<ClassId>,
    pub class_probabilities_bps: Vec<u64>,
    pub guaranteed_class_ids: Vec<ClassId>,
    pub minted: u64,
    pub remaining_supply: u64,
    pub max_supply: u64,
}

impl BoxDef {
    pub fn is_sold_out(&self) -> bool {
        self.remaining_supply == 0
    }

    /// Draw weight of one class in this box's table.
    pub fn weight_of(&self, class_id: ClassId) -> Option<u64> {
        self.class_ids
            .iter()
            .position(|id| *id == class_id)
            .map(|idx| self.class_probabilities_bps[idx])
    }

    /// Validate a candidate definition against its scene.
    pub fn validate(
        scene: &Scene,
        num_cards: u32,
        class_ids: &[ClassId],
        class_probabilities_bps: &[u64],
        guaranteed_class_ids: &[ClassId],
        max_supply: u64,
    ) -> Result<()> {
        if num_cards == 0 {
            return Err(EconomyError::Validation(
                "box must hold at least one card".to_string(),
            ));
        }
        if max_supply == 0 {
            return Err(EconomyError::Validation(
                "box max supply must be positive".to_string(),
            ));
        }
        if class_ids.is_empty() || class_ids.len() != class_probabilities_bps.len() {
            return Err(EconomyError::Validation(
                "class ids and probabilities must be parallel and non-empty".to_string(),
            ));
        }
        let mut sum: u64 = 0;
        for bps in class_probabilities_bps {
            sum = sum
                .checked_add(*bps)
                .ok_or(EconomyError::ArithmeticOverflow)?;
        }
        if sum != BPS_DENOMINATOR {
            return Err(EconomyError::Validation(format!(
                "class probabilities sum to {} bps, expected {}",
                sum, BPS_DENOMINATOR
            )));
        }
        if guaranteed_class_ids.len() > num_cards as usize {
            return Err(EconomyError::Validation(
                "guaranteed slots exceed card count".to_string(),
            ));
        }
        for class_id in guaranteed_class_ids {
            if !class_ids.contains(class_id) {
                return Err(EconomyError::Validation(format!(
                    "guaranteed class {} is not in the box class list",
                    class_id
                )));
            }
        }
        if scene.is_partitioned() {
            for class_id in class_ids {
                if scene.class(*class_id).is_none() {
                    return Err(EconomyError::Validation(format!(
                        "class {} is not defined for scene {}",
                        class_id, scene.id
                    )));
                }
            }
        }
        Ok(())
    }
}
