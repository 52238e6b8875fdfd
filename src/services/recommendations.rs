use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{
    db::{MemorySimilarityCache, RatingStore, SimilarityCache},
    error::{AppError, AppResult},
    models::{ItemId, Prediction, Rater, RaterId, Recommendation},
    telemetry::{make_span_with_run_id, RunId},
};

use super::prediction::{PredictorOptions, RatingPredictor};
use super::similarity::SimilarityEngine;

const DEFAULT_CONCURRENCY: usize = 8;

/// One (user, item) prediction produced by a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub user: RaterId,
    pub item: ItemId,
    pub prediction: Prediction,
}

/// Runs many predictions concurrently over one similarity cache
///
/// Each run gets a fresh in-memory cache unless a shared cache is attached,
/// so a similarity is computed at most once per rater pair per run.
pub struct BatchRecommender {
    store: Arc<dyn RatingStore>,
    options: PredictorOptions,
    concurrency: usize,
    shared_cache: Option<Arc<dyn SimilarityCache>>,
}

impl BatchRecommender {
    pub fn new(store: Arc<dyn RatingStore>, options: PredictorOptions) -> Self {
        Self {
            store,
            options,
            concurrency: DEFAULT_CONCURRENCY,
            shared_cache: None,
        }
    }

    /// Caps how many predictions run at once (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Uses a cache that outlives individual runs instead of a per-run one
    pub fn with_shared_cache(mut self, cache: Arc<dyn SimilarityCache>) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    fn predictor_for_run(&self) -> Arc<RatingPredictor> {
        let cache: Arc<dyn SimilarityCache> = match &self.shared_cache {
            Some(cache) => cache.clone(),
            None => Arc::new(MemorySimilarityCache::new()),
        };
        let engine = Arc::new(SimilarityEngine::new(self.store.clone()).with_cache(cache));
        Arc::new(RatingPredictor::new(
            engine,
            self.store.clone(),
            self.options.clone(),
        ))
    }

    /// Predicts every requested (user, item) pair
    ///
    /// Records come back in request order. A failed request is logged and
    /// left out; the call fails only when every request failed.
    pub async fn predict_batch(
        &self,
        requests: Vec<(RaterId, ItemId)>,
    ) -> AppResult<Vec<PredictionRecord>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let run_id = RunId::new();
        let span = make_span_with_run_id(&run_id);
        self.run_batch(requests).instrument(span).await
    }

    async fn run_batch(
        &self,
        requests: Vec<(RaterId, ItemId)>,
    ) -> AppResult<Vec<PredictionRecord>> {
        tracing::info!(requests = requests.len(), "Starting prediction batch");

        let predictor = self.predictor_for_run();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(requests.len());

        for (user, item) in requests {
            let predictor = predictor.clone();
            let semaphore = semaphore.clone();
            let task = tokio::spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| AppError::Internal(e.to_string()))?;
                    let prediction = predictor.predict(user, item).await?;
                    Ok::<_, AppError>(PredictionRecord {
                        user,
                        item,
                        prediction,
                    })
                }
                .in_current_span(),
            );
            tasks.push(task);
        }

        let records = join_predictions(tasks).await?;

        tracing::info!(
            total = records.len(),
            available = records.iter().filter(|r| r.prediction.is_available()).count(),
            "Prediction batch completed"
        );

        Ok(records)
    }

    /// Top `limit` unrated items for `user`, by predicted score
    ///
    /// Candidate items are those rated by anyone who shares at least one item
    /// with the user; no one else can produce a positive similarity. Items
    /// without a prediction are dropped. Ties go to the lower item id.
    pub async fn recommend_for_user(
        &self,
        user: RaterId,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        if limit == 0 {
            return Err(AppError::InvalidInput(
                "Recommendation limit must be positive".to_string(),
            ));
        }

        let run_id = RunId::new();
        let span = make_span_with_run_id(&run_id);
        self.run_recommendations(user, limit).instrument(span).await
    }

    async fn run_recommendations(
        &self,
        user: RaterId,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let predictor = self.predictor_for_run();
        let target = Arc::new(predictor.engine().rater(user).await?);
        let items = self.candidate_items(&target).await?;

        tracing::info!(
            rater = %user,
            rated = target.ratings.len(),
            candidates = items.len(),
            "Computing recommendations"
        );

        if items.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(items.len());

        for item in items {
            let predictor = predictor.clone();
            let semaphore = semaphore.clone();
            let target = target.clone();
            let task = tokio::spawn(
                async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| AppError::Internal(e.to_string()))?;
                    let prediction = predictor.predict_for(&target, item).await?;
                    Ok::<_, AppError>(PredictionRecord {
                        user: target.id,
                        item,
                        prediction,
                    })
                }
                .in_current_span(),
            );
            tasks.push(task);
        }

        let mut recommendations: Vec<Recommendation> = join_predictions(tasks)
            .await?
            .into_iter()
            .filter_map(|record| match record.prediction {
                Prediction::Predicted { score, neighbors } => Some(Recommendation {
                    item: record.item,
                    predicted_score: score,
                    neighbor_count: neighbors.len(),
                }),
                Prediction::Unavailable => None,
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.predicted_score
                .total_cmp(&a.predicted_score)
                .then_with(|| a.item.cmp(&b.item))
        });
        recommendations.truncate(limit);

        tracing::info!(
            rater = %user,
            recommended = recommendations.len(),
            "Recommendations computed"
        );

        Ok(recommendations)
    }

    /// Items rated by the target's peers that the target has not rated
    async fn candidate_items(&self, target: &Rater) -> AppResult<BTreeSet<ItemId>> {
        let mut peers = BTreeSet::new();
        for rated_item in &target.ratings {
            let others = self
                .store
                .other_ratings_for_item(rated_item.item, target.id)
                .await?;
            peers.extend(others.into_iter().map(|r| r.rater));
        }

        let mut items = BTreeSet::new();
        for peer in peers {
            let peer_ratings = self.store.ratings_by_rater(peer).await?;
            items.extend(
                peer_ratings
                    .into_iter()
                    .map(|r| r.item)
                    .filter(|item| !target.has_rated(*item)),
            );
        }

        Ok(items)
    }
}

/// Awaits prediction tasks in order, tolerating partial failure
async fn join_predictions(
    tasks: Vec<JoinHandle<AppResult<PredictionRecord>>>,
) -> AppResult<Vec<PredictionRecord>> {
    let mut results = Vec::new();
    let mut errors = Vec::new();

    for task in tasks {
        match task.await {
            Ok(Ok(record)) => results.push(record),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Prediction failed");
                errors.push(e);
            }
            Err(e) => {
                tracing::error!(error = %e, "Task join error");
                errors.push(AppError::Internal(e.to_string()));
            }
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            success_count = results.len(),
            error_count = errors.len(),
            "Partial prediction batch failure"
        );
    }

    if results.is_empty() {
        if let Some(first) = errors.into_iter().next() {
            return Err(first);
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::cache::UnreachableSimilarityCache;
    use crate::db::InMemoryRatingStore;

    // Rater 2 agrees with rater 1, rater 3 disagrees, rater 4 shares nothing
    fn catalog() -> InMemoryRatingStore {
        InMemoryRatingStore::new()
            .with_rating(1, 1, 5.0)
            .with_rating(1, 2, 1.0)
            .with_rating(1, 3, 4.0)
            .with_rating(2, 1, 4.0)
            .with_rating(2, 2, 2.0)
            .with_rating(2, 3, 5.0)
            .with_rating(2, 4, 5.0)
            .with_rating(2, 5, 2.0)
            .with_rating(2, 8, 5.0)
            .with_rating(3, 1, 1.0)
            .with_rating(3, 2, 5.0)
            .with_rating(3, 4, 1.0)
            .with_rating(3, 6, 4.0)
            .with_rating(4, 7, 5.0)
    }

    fn recommender() -> BatchRecommender {
        BatchRecommender::new(Arc::new(catalog()), PredictorOptions::default())
    }

    #[tokio::test]
    async fn test_predict_batch_keeps_request_order() {
        let records = recommender()
            .predict_batch(vec![
                (RaterId(1), ItemId(4)),
                (RaterId(1), ItemId(6)),
                (RaterId(1), ItemId(1)),
            ])
            .await
            .unwrap();

        let items: Vec<_> = records.iter().map(|r| r.item).collect();
        assert_eq!(items, vec![ItemId(4), ItemId(6), ItemId(1)]);
        assert_eq!(records[0].prediction.score(), Some(5.0));
        assert_eq!(records[1].prediction, Prediction::Unavailable);
        assert_eq!(records[2].prediction.score(), Some(4.0));
    }

    #[tokio::test]
    async fn test_predict_batch_empty() {
        let records = recommender().predict_batch(Vec::new()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_recommend_ranks_unrated_items() {
        let recommendations = recommender()
            .recommend_for_user(RaterId(1), 10)
            .await
            .unwrap();

        let ranked: Vec<_> = recommendations
            .iter()
            .map(|r| (r.item, r.predicted_score))
            .collect();
        assert_eq!(
            ranked,
            vec![(ItemId(4), 5.0), (ItemId(8), 5.0), (ItemId(5), 2.0)]
        );
        assert!(recommendations.iter().all(|r| r.neighbor_count == 1));
    }

    #[tokio::test]
    async fn test_recommend_respects_limit() {
        let recommendations = recommender()
            .with_concurrency(1)
            .recommend_for_user(RaterId(1), 1)
            .await
            .unwrap();

        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].item, ItemId(4));
    }

    #[tokio::test]
    async fn test_recommend_zero_limit_is_invalid() {
        let result = recommender().recommend_for_user(RaterId(1), 0).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_recommend_for_unknown_user_is_empty() {
        let recommendations = recommender()
            .recommend_for_user(RaterId(404), 5)
            .await
            .unwrap();
        assert!(recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_shared_cache_does_not_fail_recommendations() {
        let recommendations = recommender()
            .with_shared_cache(Arc::new(UnreachableSimilarityCache))
            .recommend_for_user(RaterId(1), 5)
            .await
            .unwrap();

        let items: Vec<_> = recommendations.iter().map(|r| r.item).collect();
        assert_eq!(items, vec![ItemId(4), ItemId(8), ItemId(5)]);
    }

    #[tokio::test]
    async fn test_shared_cache_is_reused_across_runs() {
        let cache = Arc::new(MemorySimilarityCache::new());
        let recommender = recommender().with_shared_cache(cache.clone());

        recommender
            .recommend_for_user(RaterId(1), 3)
            .await
            .unwrap();
        let after_first = cache.len().await;
        assert!(after_first > 0);

        recommender
            .predict_batch(vec![(RaterId(1), ItemId(4))])
            .await
            .unwrap();
        assert_eq!(cache.len().await, after_first);
    }
}
