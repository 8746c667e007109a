//! Weighted amount selection (roulette over cumulative weights).

use std::collections::BTreeMap;

use crate::rng::RandomSource;

pub type Amount = u64;
/// Relative weight per amount. Amounts missing from the map weigh 0.
pub type WeightMap = BTreeMap<Amount, f64>;

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 { weight } else { 0.0 }
}

/// Divide by the largest weight so the total stays finite (at most `len`)
/// even when the individual weights are near `f64::MAX`.
fn rescale(mut weights: Vec<f64>) -> Vec<f64> {
    let max = weights.iter().copied().fold(0.0, f64::max);
    if max > 0.0 {
        weights.iter_mut().for_each(|w| *w /= max);
    }
    weights
}

/// Lookup closure for a weight map, suitable for [`pick_index`].
pub fn weight_lookup(weights: &WeightMap) -> impl Fn(Amount) -> f64 + '_ {
    move |amount| weights.get(&amount).copied().unwrap_or(0.0)
}

/// Weights actually used for `amounts`, in order. When every weight is zero the
/// draw falls back to uniform, so this returns all ones.
pub fn effective_weights(amounts: &[Amount], weights: &WeightMap) -> Vec<f64> {
    let raw: Vec<f64> = amounts.iter().map(|&a| sanitize(weight_lookup(weights)(a))).collect();
    if raw.iter().sum::<f64>() > 0.0 {
        raw
    } else {
        vec![1.0; amounts.len()]
    }
}

/// Normalized selection probability per amount (sums to 1 for a non-empty list).
pub fn probabilities(amounts: &[Amount], weights: &WeightMap) -> Vec<f64> {
    let eff = rescale(effective_weights(amounts, weights));
    let total: f64 = eff.iter().sum();
    if total <= 0.0 {
        return eff;
    }
    eff.into_iter().map(|w| w / total).collect()
}

/// Draw an index into `amounts` proportionally to `weight_of`.
///
/// Negative or non-finite weights count as 0. If the total weight is 0 the draw
/// is uniform. Weights are rescaled by the largest one first, so huge finite
/// weights cannot overflow the total. If rounding leaves no match, the last
/// index with a positive weight is returned (never a zero-weight amount).
/// `None` only for an empty amount list.
pub fn try_pick_index<F, R>(amounts: &[Amount], weight_of: F, rng: &mut R) -> Option<usize>
where
    F: Fn(Amount) -> f64,
    R: RandomSource + ?Sized,
{
    if amounts.is_empty() {
        return None;
    }
    let weights = rescale(amounts.iter().map(|&a| sanitize(weight_of(a))).collect());
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Some(rng.index(amounts.len()));
    }
    let mut r = rng.next_f64() * total;
    for (i, &w) in weights.iter().enumerate() {
        // zero-weight entries are never selected, even when r lands exactly on 0
        if w <= 0.0 {
            continue;
        }
        r -= w;
        if r <= 0.0 {
            return Some(i);
        }
    }
    // Rounding left a sliver of r: fall back to the last weighted index.
    weights.iter().rposition(|&w| w > 0.0).or(Some(weights.len() - 1))
}

/// Like [`try_pick_index`] but for callers holding a validated, non-empty list.
/// An empty list yields 0 rather than panicking.
pub fn pick_index<F, R>(amounts: &[Amount], weight_of: F, rng: &mut R) -> usize
where
    F: Fn(Amount) -> f64,
    R: RandomSource + ?Sized,
{
    try_pick_index(amounts, weight_of, rng).unwrap_or(0)
}
