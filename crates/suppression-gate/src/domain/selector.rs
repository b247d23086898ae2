//! # Ad Selector
//!
//! Suppression-aware weighted random selection over the [`AdCatalog`].
//!
//! ## Algorithm
//!
//! 1. Drop banners whose advertiser is excluded.
//! 2. No candidates: `None`. This is a normal outcome, not a failure.
//! 3. One candidate: return it without drawing.
//! 4. Otherwise draw `r` in `[0, total_weight)` and return the first
//!    candidate whose cumulative weight exceeds `r`.
//!
//! A weight-0 banner is eligible but can never satisfy step 4 while another
//! candidate has positive weight. When every candidate has weight 0 the draw
//! falls back to a uniform choice.

use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

use super::catalog::AdCatalog;
use super::entities::Banner;

/// Weighted selector over a shared catalog.
#[derive(Debug, Clone)]
pub struct AdSelector {
    catalog: Arc<AdCatalog>,
}

impl AdSelector {
    pub fn new(catalog: Arc<AdCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &AdCatalog {
        &self.catalog
    }

    /// Serve a banner for `placement_id`, skipping excluded advertisers.
    pub fn serve(&self, placement_id: &str, excluded: &HashSet<String>) -> Option<Banner> {
        self.serve_with_rng(
            placement_id,
            |advertiser| excluded.contains(advertiser),
            &mut rand::thread_rng(),
        )
    }

    /// Serve with an explicit exclusion predicate and RNG.
    pub fn serve_with_rng<F, R>(&self, placement_id: &str, is_excluded: F, rng: &mut R) -> Option<Banner>
    where
        F: Fn(&str) -> bool,
        R: Rng + ?Sized,
    {
        let candidates: Vec<&Banner> = self
            .catalog
            .all_banners()
            .iter()
            .filter(|banner| !is_excluded(&banner.advertiser_id))
            .collect();

        let selected = select_weighted(&candidates, rng);
        tracing::debug!(
            placement_id,
            eligible = candidates.len(),
            banner_id = selected.map(|b| b.id.as_str()),
            "Ad selection"
        );
        selected.cloned()
    }
}

/// Weighted random choice among `candidates`.
pub fn select_weighted<'a, R>(candidates: &[&'a Banner], rng: &mut R) -> Option<&'a Banner>
where
    R: Rng + ?Sized,
{
    match candidates {
        [] => return None,
        [only] => return Some(*only),
        _ => {}
    }

    let total: u64 = candidates.iter().map(|b| u64::from(b.weight)).sum();
    if total == 0 {
        return Some(candidates[rng.gen_range(0..candidates.len())]);
    }

    let r = rng.gen_range(0..total);
    let mut cumulative = 0u64;
    for banner in candidates {
        cumulative += u64::from(banner.weight);
        if r < cumulative {
            return Some(*banner);
        }
    }

    // r < total guarantees the loop returns
    candidates.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::banner;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn selector(banners: Vec<Banner>) -> AdSelector {
        AdSelector::new(Arc::new(AdCatalog::new(banners).unwrap()))
    }

    fn draw_counts(selector: &AdSelector, draws: usize, excluded: &HashSet<String>) -> HashMap<String, usize> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = HashMap::new();
        for _ in 0..draws {
            if let Some(b) = selector.serve_with_rng("p1", |a| excluded.contains(a), &mut rng) {
                *counts.entry(b.id).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn test_empty_catalog_serves_none() {
        let selector = selector(vec![]);
        assert!(selector.serve("p1", &HashSet::new()).is_none());
    }

    #[test]
    fn test_all_advertisers_excluded_serves_none() {
        let selector = selector(vec![banner("a", "adv1", 1), banner("b", "adv2", 3)]);
        let excluded: HashSet<String> = ["adv1", "adv2"].iter().map(|s| s.to_string()).collect();
        assert!(selector.serve("p1", &excluded).is_none());
    }

    #[test]
    fn test_single_candidate_returned_even_with_zero_weight() {
        let selector = selector(vec![banner("a", "adv1", 0), banner("b", "adv2", 5)]);
        let excluded: HashSet<String> = ["adv2".to_string()].into_iter().collect();
        assert_eq!(selector.serve("p1", &excluded).unwrap().id, "a");
    }

    #[test]
    fn test_weights_bias_selection() {
        let selector = selector(vec![banner("a", "adv1", 1), banner("b", "adv2", 3)]);
        let counts = draw_counts(&selector, 10_000, &HashSet::new());

        let a = counts["a"] as f64;
        let b = counts["b"] as f64;
        let ratio = b / a;
        assert!((2.6..3.4).contains(&ratio), "ratio {} outside tolerance", ratio);
    }

    #[test]
    fn test_zero_weight_never_selected_beside_positive() {
        let selector = selector(vec![
            banner("zero", "adv1", 0),
            banner("one", "adv2", 1),
            banner("two", "adv3", 2),
        ]);
        let counts = draw_counts(&selector, 2_000, &HashSet::new());
        assert!(!counts.contains_key("zero"));
        assert_eq!(counts.values().sum::<usize>(), 2_000);
    }

    #[test]
    fn test_all_zero_weights_fall_back_to_uniform() {
        let selector = selector(vec![
            banner("a", "adv1", 0),
            banner("b", "adv2", 0),
            banner("c", "adv3", 0),
        ]);
        let counts = draw_counts(&selector, 3_000, &HashSet::new());
        for id in ["a", "b", "c"] {
            let n = counts.get(id).copied().unwrap_or(0);
            assert!((800..1200).contains(&n), "{} drawn {} times", id, n);
        }
    }

    #[test]
    fn test_select_weighted_walks_cumulative_weights() {
        let a = banner("a", "adv1", 1);
        let b = banner("b", "adv2", 3);
        let candidates = [&a, &b];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(select_weighted(&candidates, &mut rng).is_some());
        }
        assert!(select_weighted(&[], &mut rng).is_none());
    }
}
