//! Pack opener engine

use crate::draw::{self, SlotWeight};
use crate::stock::SceneStock;
use catalog::{BoxId, SceneId, SceneRegistry};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::HashMap;
use tile_core::{
    Authorizer, Capability, EconomyError, Ledger, LedgerBatch, Result, TokenId,
};
use tracing::info;

/// Burns box tokens and mints their randomly drawn tile contents.
///
/// Owns the live draw stock per scene and its own RNG. The default RNG is
/// ChaCha20 seeded from OS entropy, deliberately not derivable from any
/// state an opener could inspect beforehand; tests inject a fixed seed.
#[derive(Debug)]
pub struct PackOpener<R: Rng = ChaCha20Rng> {
    stocks: HashMap<SceneId, SceneStock>,
    rng: R,
}

impl PackOpener<ChaCha20Rng> {
    pub fn new() -> Self {
        Self::with_rng(ChaCha20Rng::from_os_rng())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl Default for PackOpener<ChaCha20Rng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> PackOpener<R> {
    pub fn with_rng(rng: R) -> Self {
        PackOpener {
            stocks: HashMap::new(),
            rng,
        }
    }

    /// Stock left for one tile (0 for unpartitioned or untouched scenes
    /// whose stock has not been materialized yet).
    pub fn tile_stock(&self, scene_id: SceneId, token_id: TokenId) -> u64 {
        self.stocks
            .get(&scene_id)
            .map(|stock| stock.remaining(token_id))
            .unwrap_or(0)
    }

    /// Mint box tokens against the box's issuance cap.
    pub fn mint_boxes<L: Ledger>(
        &mut self,
        auth: &dyn Authorizer,
        caller: &str,
        registry: &mut SceneRegistry,
        ledger: &mut L,
        box_id: BoxId,
        to: &str,
        quantity: u64,
    ) -> Result<()> {
        if !auth.check(Capability::Minter, caller) {
            return Err(EconomyError::Capability(format!(
                "{} lacks {:?}",
                caller,
                Capability::Minter
            )));
        }
        if quantity == 0 {
            return Err(EconomyError::Validation(
                "mint quantity must be positive".to_string(),
            ));
        }
        let box_def = registry.box_def(box_id)?;
        let minted = box_def
            .minted
            .checked_add(quantity)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        if minted > box_def.max_supply {
            return Err(EconomyError::SupplyExhausted);
        }
        let token_id = box_def.token_id;

        ledger.mint(to, token_id, quantity)?;
        registry.note_box_minted(box_id, quantity)?;
        info!(box_id, to, quantity, "boxes minted");
        Ok(())
    }

    /// Open boxes the recipient holds.
    ///
    /// Returns the drawn tile ids per opened unit; the same contents land
    /// in the ledger as one batched mint per unit.
    pub fn open<L: Ledger>(
        &mut self,
        registry: &mut SceneRegistry,
        ledger: &mut L,
        box_id: BoxId,
        quantity: u64,
        recipient: &str,
    ) -> Result<Vec<Vec<TokenId>>> {
        self.open_internal(registry, ledger, box_id, quantity, recipient)
    }

    /// Open boxes on someone's behalf; the caller must be the recipient or
    /// an operator the recipient has approved on the ledger.
    pub fn open_for<L: Ledger>(
        &mut self,
        registry: &mut SceneRegistry,
        ledger: &mut L,
        box_id: BoxId,
        quantity: u64,
        recipient: &str,
        caller: &str,
    ) -> Result<Vec<Vec<TokenId>>> {
        if caller != recipient && !ledger.is_approved_for_all(recipient, caller) {
            return Err(EconomyError::Capability(
                "caller is not owner nor approved".to_string(),
            ));
        }
        self.open_internal(registry, ledger, box_id, quantity, recipient)
    }

    fn open_internal<L: Ledger>(
        &mut self,
        registry: &mut SceneRegistry,
        ledger: &mut L,
        box_id: BoxId,
        quantity: u64,
        recipient: &str,
    ) -> Result<Vec<Vec<TokenId>>> {
        if quantity == 0 {
            return Err(EconomyError::Validation(
                "open quantity must be positive".to_string(),
            ));
        }
        let box_def = registry.box_def(box_id)?.clone();
        if box_def.remaining_supply < quantity {
            return Err(EconomyError::SupplyExhausted);
        }
        let available = ledger.balance_of(recipient, box_def.token_id);
        if available < quantity {
            return Err(EconomyError::InsufficientBalance {
                token_id: box_def.token_id,
                required: quantity,
                available,
            });
        }
        let scene = registry.scene(box_def.scene_id)?.clone();

        // Draws run against a staged copy of the stock; nothing is stored
        // until the ledger batch commits.
        let mut staged = if scene.is_partitioned() {
            Some(
                self.stocks
                    .entry(scene.id)
                    .or_insert_with(|| SceneStock::from_scene(&scene))
                    .clone(),
            )
        } else {
            None
        };

        let mut batch = LedgerBatch::new();
        batch.burn(recipient, box_def.token_id, quantity);
        let mut contents = Vec::with_capacity(quantity as usize);
        for _ in 0..quantity {
            let mut unit = Vec::with_capacity(box_def.num_cards as usize);
            for slot in 0..box_def.num_cards as usize {
                let token_id = match staged.as_mut() {
                    Some(stock) => {
                        let class_id = if slot < box_def.guaranteed_class_ids.len() {
                            let class_id = box_def.guaranteed_class_ids[slot];
                            if stock.class_live_stock(class_id) == 0 {
                                return Err(EconomyError::SupplyExhausted);
                            }
                            class_id
                        } else {
                            let entries: Vec<_> = box_def
                                .class_ids
                                .iter()
                                .zip(&box_def.class_probabilities_bps)
                                .map(|(class_id, bps)| {
                                    let weight = if stock.class_live_stock(*class_id) > 0 {
                                        SlotWeight::Available(*bps)
                                    } else {
                                        SlotWeight::Exhausted
                                    };
                                    (*class_id, weight)
                                })
                                .collect();
                            draw::draw_class(&mut self.rng, &entries)?
                        };
                        let token_id =
                            draw::pick_tile(&mut self.rng, &stock.live_tokens(class_id))?;
                        stock.take(token_id);
                        token_id
                    }
                    // No class partition: uniform over the scene's full range
                    None => {
                        scene.tile_token_start
                            + self.rng.random_range(0..scene.tile_token_count())
                    }
                };
                unit.push(token_id);
            }
            batch.mint_batch(recipient, unit.clone());
            contents.push(unit);
        }

        ledger.apply(batch)?;
        if let Some(stock) = staged {
            self.stocks.insert(scene.id, stock);
        }
        // Cannot fail: checked against remaining_supply above
        registry.take_box_supply(box_id, quantity)?;

        info!(box_id, recipient, quantity, "boxes opened");
        Ok(contents)
    }
}
