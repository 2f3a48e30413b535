//! Uniform winner selection without replacement.
//!
//! The candidate list is append-only while winners are removed from the eligible
//! set, so it accumulates stale ids. Selection is rejection sampling over the
//! list: a stale id, or a later duplicate of an id, is rejected and redrawn. Each
//! eligible id therefore has exactly one accepting slot and is equally likely.

use rand::{seq::SliceRandom, Rng};

use crate::domain::UserId;

/// Random draws attempted before falling back to a full scan.
const MAX_RANDOM_ATTEMPTS: usize = 64;

/// No eligible id is left in the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("participant pool exhausted")]
pub struct PoolExhausted;

/// Pick one eligible id uniformly at random.
pub fn pick<R, F>(rng: &mut R, candidates: &[UserId], is_eligible: F) -> Result<UserId, PoolExhausted>
where
    R: Rng + ?Sized,
    F: Fn(UserId) -> bool,
{
    if candidates.is_empty() {
        return Err(PoolExhausted);
    }

    let accepts = |idx: usize| {
        let id = candidates[idx];
        is_eligible(id) && candidates.iter().position(|c| *c == id) == Some(idx)
    };

    for _ in 0..MAX_RANDOM_ATTEMPTS {
        let idx = rng.gen_range(0..candidates.len());
        if accepts(idx) {
            return Ok(candidates[idx]);
        }
    }

    // Mostly-stale list: choose among the accepting slots directly.
    let slots: Vec<usize> = (0..candidates.len()).filter(|&i| accepts(i)).collect();
    slots
        .choose(rng)
        .map(|&idx| candidates[idx])
        .ok_or(PoolExhausted)
}
