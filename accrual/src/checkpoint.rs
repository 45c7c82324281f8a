//! Per-holder claim checkpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tile_core::{EconomyError, Result};

/// Lazy accumulator of claimable points for one holder.
///
/// Not a live balance: the claimable total at any instant is
/// `accrued_points` plus `held_reward_tokens * rate * whole elapsed days`
/// since `last_timestamp`. Fractional days contribute nothing until a full
/// day has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCheckpoint {
    pub last_timestamp: DateTime<Utc>,
    pub accrued_points: u64,
    pub held_reward_tokens: u64,
}

impl ClaimCheckpoint {
    pub fn new(held_reward_tokens: u64, now: DateTime<Utc>) -> Self {
        ClaimCheckpoint {
            last_timestamp: now,
            accrued_points: 0,
            held_reward_tokens,
        }
    }

    /// Claimable total at `now`. Pure; never mutates the checkpoint.
    pub fn projected(&self, now: DateTime<Utc>, points_per_token_per_day: u64) -> Result<u64> {
        let whole_days = (now - self.last_timestamp).num_days().max(0) as u64;
        let owed = self
            .held_reward_tokens
            .checked_mul(points_per_token_per_day)
            .and_then(|rate| rate.checked_mul(whole_days))
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.accrued_points
            .checked_add(owed)
            .ok_or(EconomyError::ArithmeticOverflow)
    }

    /// Fold everything owed at the current count into `accrued_points` and
    /// restart the clock at `now`. Computes before mutating, so a failed
    /// fold leaves the checkpoint untouched.
    pub fn fold(&mut self, now: DateTime<Utc>, points_per_token_per_day: u64) -> Result<()> {
        let total = self.projected(now, points_per_token_per_day)?;
        self.accrued_points = total;
        self.last_timestamp = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_whole_days_only() {
        let checkpoint = ClaimCheckpoint::new(3, t0());
        let almost_a_day = t0() + Duration::hours(23) + Duration::minutes(59);
        assert_eq!(checkpoint.projected(almost_a_day, 1).unwrap(), 0);
        assert_eq!(checkpoint.projected(t0() + Duration::days(1), 1).unwrap(), 3);
        assert_eq!(
            checkpoint
                .projected(t0() + Duration::days(2) + Duration::hours(12), 1)
                .unwrap(),
            6
        );
    }

    #[test]
    fn test_projected_is_pure() {
        let checkpoint = ClaimCheckpoint::new(1, t0());
        let later = t0() + Duration::days(10);
        checkpoint.projected(later, 1).unwrap();
        assert_eq!(checkpoint.accrued_points, 0);
        assert_eq!(checkpoint.last_timestamp, t0());
    }

    #[test]
    fn test_clock_skew_never_goes_negative() {
        let checkpoint = ClaimCheckpoint::new(5, t0());
        let earlier = t0() - Duration::days(3);
        assert_eq!(checkpoint.projected(earlier, 1).unwrap(), 0);
    }

    #[test]
    fn test_fold_carries_and_restarts() {
        let mut checkpoint = ClaimCheckpoint::new(2, t0());
        let later = t0() + Duration::days(5);
        checkpoint.fold(later, 1).unwrap();
        assert_eq!(checkpoint.accrued_points, 10);
        assert_eq!(checkpoint.last_timestamp, later);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let checkpoint = ClaimCheckpoint::new(u64::MAX, t0());
        let later = t0() + Duration::days(2);
        assert_eq!(
            checkpoint.projected(later, 1),
            Err(EconomyError::ArithmeticOverflow)
        );
    }
}
