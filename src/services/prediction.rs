use std::sync::Arc;

use tracing::instrument;

use crate::{
    db::RatingStore,
    error::AppResult,
    models::{ItemId, Neighbor, Prediction, Rater, RaterId, Similarity},
};

use super::similarity::SimilarityEngine;

/// Tuning for rating prediction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictorOptions {
    /// Keep only the top-K positive neighbors; `None` keeps all of them
    pub max_neighbors: Option<usize>,
}

/// A rater of the target item, compared against the target user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rater: RaterId,
    pub score: f64,
    pub similarity: Similarity,
}

/// Ranks candidates and folds them into a similarity-weighted average
///
/// Only strictly positive similarities take part. Neighbors are ordered by
/// similarity, highest first, ties broken by rater id. The average itself
/// does not depend on that order unless `max_neighbors` truncates it.
pub fn aggregate(candidates: &[Candidate], max_neighbors: Option<usize>) -> Prediction {
    let mut neighbors: Vec<Neighbor> = candidates
        .iter()
        .filter_map(|c| {
            c.similarity.positive().map(|weight| Neighbor {
                rater: c.rater,
                score: c.score,
                weight,
            })
        })
        .collect();

    if neighbors.is_empty() {
        return Prediction::Unavailable;
    }

    neighbors.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.rater.cmp(&b.rater))
    });

    if let Some(limit) = max_neighbors {
        neighbors.truncate(limit);
        if neighbors.is_empty() {
            return Prediction::Unavailable;
        }
    }

    // Normalizing each weight first keeps a lone neighbor's score exact
    let weight_sum: f64 = neighbors.iter().map(|n| n.weight).sum();
    let score: f64 = neighbors
        .iter()
        .map(|n| n.score * (n.weight / weight_sum))
        .sum();

    Prediction::Predicted { score, neighbors }
}

/// Predicts a user's score for an item from the scores of similar users
pub struct RatingPredictor {
    engine: Arc<SimilarityEngine>,
    store: Arc<dyn RatingStore>,
    options: PredictorOptions,
}

impl RatingPredictor {
    pub fn new(
        engine: Arc<SimilarityEngine>,
        store: Arc<dyn RatingStore>,
        options: PredictorOptions,
    ) -> Self {
        Self {
            engine,
            store,
            options,
        }
    }

    pub fn engine(&self) -> &Arc<SimilarityEngine> {
        &self.engine
    }

    /// Predicts `user`'s score for `item`
    ///
    /// The prediction is not clamped to the rating scale.
    pub async fn predict(&self, user: RaterId, item: ItemId) -> AppResult<Prediction> {
        let target = self.engine.rater(user).await?;
        self.predict_for(&target, item).await
    }

    /// Same as [`RatingPredictor::predict`] for an already loaded rater
    #[instrument(skip_all, fields(rater = %target.id, item = %item))]
    pub async fn predict_for(&self, target: &Rater, item: ItemId) -> AppResult<Prediction> {
        let others = self.store.other_ratings_for_item(item, target.id).await?;

        let mut candidates = Vec::with_capacity(others.len());
        for other in others {
            let similarity = self.engine.similarity_to(target, other.rater).await?;
            candidates.push(Candidate {
                rater: other.rater,
                score: other.score,
                similarity,
            });
        }

        let prediction = aggregate(&candidates, self.options.max_neighbors);

        match &prediction {
            Prediction::Predicted { score, neighbors } => tracing::debug!(
                candidates = candidates.len(),
                neighbors = neighbors.len(),
                score = *score,
                "Prediction computed"
            ),
            Prediction::Unavailable => tracing::debug!(
                candidates = candidates.len(),
                "No positively correlated neighbors"
            ),
        }

        Ok(prediction)
    }
}
