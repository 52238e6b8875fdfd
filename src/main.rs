use std::sync::Arc;

use movie_ratings::{
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, PgRatingStore, RatingStore, RedisSimilarityCache,
    },
    models::RaterId,
    services::BatchRecommender,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.max_connections).await?;
    let store: Arc<dyn RatingStore> = Arc::new(PgRatingStore::new(pool));

    let mut recommender = BatchRecommender::new(store, config.predictor_options())
        .with_concurrency(config.batch_concurrency);

    let mut cache_writer = None;
    if let Some(redis_url) = &config.redis_url {
        let client = create_redis_client(redis_url)?;
        let (cache, handle) = Cache::new(client).await;
        recommender = recommender.with_shared_cache(Arc::new(RedisSimilarityCache::new(
            cache,
            config.similarity_cache_ttl,
        )));
        cache_writer = Some(handle);
    }

    if config.batch_user_ids.is_empty() {
        tracing::warn!("BATCH_USER_IDS is empty, nothing to do");
    }

    for user_id in &config.batch_user_ids {
        let user = RaterId(*user_id);
        match recommender
            .recommend_for_user(user, config.recommendation_limit)
            .await
        {
            Ok(recommendations) if recommendations.is_empty() => {
                tracing::info!(rater = %user, "No recommendations available");
            }
            Ok(recommendations) => {
                for (rank, recommendation) in recommendations.iter().enumerate() {
                    tracing::info!(
                        rater = %user,
                        rank = rank + 1,
                        item = %recommendation.item,
                        predicted_score = recommendation.predicted_score,
                        neighbors = recommendation.neighbor_count,
                        "Recommendation"
                    );
                }
            }
            Err(e) => {
                tracing::error!(rater = %user, error = %e, "Failed to compute recommendations");
            }
        }
    }

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}
