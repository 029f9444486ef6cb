//! Reward-boost tier selection.

use crate::domain::RewardBoost;

/// Pick the qualifying boost with the greatest `boost_bps`.
///
/// A boost qualifies when `min_usd_value <= valuation`. Ties keep the
/// first-seen boost, so the result depends on input order; callers that need
/// reproducibility sort by index first (see [`sort_by_index`]).
///
/// # Returns
/// `None` when nothing qualifies, which downstream means "no boost".
pub fn select(boosts: &[RewardBoost], valuation: u64) -> Option<&RewardBoost> {
    let mut best: Option<&RewardBoost> = None;
    for boost in boosts.iter().filter(|b| b.min_usd_value <= valuation) {
        match best {
            Some(current) if boost.boost_bps <= current.boost_bps => {}
            _ => best = Some(boost),
        }
    }
    best
}

/// Pin iteration order to the boost index.
pub fn sort_by_index(boosts: &mut [RewardBoost]) {
    boosts.sort_by_key(|b| b.index);
}
