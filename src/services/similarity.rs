use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use crate::{
    db::{RatingStore, SimilarityCache},
    error::AppResult,
    models::{RatedItem, Rater, RaterId, RaterPair, Similarity, UndefinedReason},
};

/// Pairs the scores two raters gave to the same items
///
/// Pairs come out ordered by item id, so the sample (and every sum over it)
/// is identical whichever rater is passed first, up to swapped coordinates.
/// A history listing an item more than once counts its last score, on both
/// sides alike.
pub fn shared_sample(a: &[RatedItem], b: &[RatedItem]) -> Vec<(f64, f64)> {
    let a_scores: HashMap<_, _> = a.iter().map(|r| (r.item, r.score)).collect();
    let b_scores: BTreeMap<_, _> = b.iter().map(|r| (r.item, r.score)).collect();

    b_scores
        .into_iter()
        .filter_map(|(item, b_score)| a_scores.get(&item).map(|&a_score| (a_score, b_score)))
        .collect()
}

/// Pearson product-moment correlation over paired scores
///
/// An empty sample is `NoOverlap`. A sample where either side has no variance
/// (a single pair, or constant scores) is `DegenerateVariance`.
pub fn pearson(sample: &[(f64, f64)]) -> Similarity {
    if sample.is_empty() {
        return Similarity::Undefined(UndefinedReason::NoOverlap);
    }

    let (first_a, first_b) = sample[0];
    if sample.iter().all(|&(a, _)| a == first_a) || sample.iter().all(|&(_, b)| b == first_b) {
        return Similarity::Undefined(UndefinedReason::DegenerateVariance);
    }

    let n = sample.len() as f64;
    let (sum_a, sum_b, sq_a, sq_b, products) = sample.iter().fold(
        (0.0, 0.0, 0.0, 0.0, 0.0),
        |(sa, sb, qa, qb, p), &(a, b)| (sa + a, sb + b, qa + a * a, qb + b * b, p + a * b),
    );

    let numerator = products - (sum_a * sum_b) / n;
    let variance_a = sq_a - (sum_a * sum_a) / n;
    let variance_b = sq_b - (sum_b * sum_b) / n;

    // A near-constant side can still round to zero or below
    if variance_a <= 0.0 || variance_b <= 0.0 {
        return Similarity::Undefined(UndefinedReason::DegenerateVariance);
    }

    let denominator = (variance_a * variance_b).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return Similarity::Undefined(UndefinedReason::DegenerateVariance);
    }

    Similarity::Correlation((numerator / denominator).clamp(-1.0, 1.0))
}

/// Similarity between two rating histories
pub fn similarity_between(a: &[RatedItem], b: &[RatedItem]) -> Similarity {
    pearson(&shared_sample(a, b))
}

/// Computes how similarly two raters score the same items
///
/// Reads ratings through the injected store. With a cache attached, results
/// are remembered per unordered rater pair.
pub struct SimilarityEngine {
    store: Arc<dyn RatingStore>,
    cache: Option<Arc<dyn SimilarityCache>>,
}

impl SimilarityEngine {
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self { store, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<dyn SimilarityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Loads a rater's current rating history
    pub async fn rater(&self, id: RaterId) -> AppResult<Rater> {
        let ratings = self.store.ratings_by_rater(id).await?;
        Ok(Rater::new(id, ratings))
    }

    /// Similarity between two raters
    pub async fn similarity(&self, a: RaterId, b: RaterId) -> AppResult<Similarity> {
        self.through_cache(RaterPair::new(a, b), async {
            let rater_a = self.rater(a).await?;
            let rater_b = self.rater(b).await?;
            Ok(similarity_between(&rater_a.ratings, &rater_b.ratings))
        })
        .await
    }

    /// Similarity between an already loaded rater and another rater
    ///
    /// Saves reloading the target's history when comparing it against many
    /// candidates.
    pub async fn similarity_to(&self, target: &Rater, other: RaterId) -> AppResult<Similarity> {
        self.through_cache(RaterPair::new(target.id, other), async {
            let other = self.rater(other).await?;
            Ok(similarity_between(&target.ratings, &other.ratings))
        })
        .await
    }

    async fn through_cache<F>(&self, pair: RaterPair, compute: F) -> AppResult<Similarity>
    where
        F: Future<Output = AppResult<Similarity>>,
    {
        match &self.cache {
            Some(cache) => crate::cached!(cache, pair, compute),
            None => compute.await,
        }
    }
}
