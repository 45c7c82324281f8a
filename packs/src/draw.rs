//! Stock-aware weighted draws

use catalog::ClassId;
use rand::Rng;
use tile_core::{EconomyError, Result, TokenId};

/// Draw weight of one class at the moment of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWeight {
    /// No live stock; excluded from the distribution entirely
    Exhausted,
    /// Live, with its declared probability in basis points
    Available(u64),
}

/// Weighted pick over the live classes, renormalized implicitly by rolling
/// against the sum of available weights only.
pub fn draw_class<R: Rng>(rng: &mut R, entries: &[(ClassId, SlotWeight)]) -> Result<ClassId> {
    let mut total: u64 = 0;
    for (_, weight) in entries {
        if let SlotWeight::Available(bps) = weight {
            total = total
                .checked_add(*bps)
                .ok_or(EconomyError::ArithmeticOverflow)?;
        }
    }
    if total == 0 {
        return Err(EconomyError::SupplyExhausted);
    }

    let roll = rng.random_range(0..total);
    let mut cumulative = 0;
    for (class_id, weight) in entries {
        if let SlotWeight::Available(bps) = weight {
            cumulative += bps;
            if roll < cumulative {
                return Ok(*class_id);
            }
        }
    }
    // roll < total and the cumulative walk covers total
    unreachable!("roll {} outside cumulative weight {}", roll, total)
}

/// Uniform pick of one tile id.
pub fn pick_tile<R: Rng>(rng: &mut R, live: &[TokenId]) -> Result<TokenId> {
    if live.is_empty() {
        return Err(EconomyError::SupplyExhausted);
    }
    Ok(live[rng.random_range(0..live.len())])
}
