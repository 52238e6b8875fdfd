/// A macro to simplify similarity caching.
///
/// This macro checks if a similarity is present in the cache.
/// If found, it returns the cached value.
/// If not found, it awaits the provided future to compute the value,
/// remembers it in the cache, and then returns the computed value.
/// A failed lookup is logged and treated as a miss.
///
/// # Arguments
/// * `$cache`: Anything implementing `SimilarityCache`.
/// * `$pair`: The `RaterPair` to key the entry by.
/// * `$compute`: A future yielding `AppResult<Similarity>`, awaited on a miss.
///
/// # Example
/// ```rust,ignore
/// let similarity = cached!(cache, RaterPair::new(a, b), async move {
///     compute_similarity(a, b).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $pair:expr, $compute:expr) => {{
        let pair = $pair;
        let hit = match $cache.lookup(pair).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    pair = %pair,
                    "Similarity cache lookup failed, computing instead"
                );
                None
            }
        };

        match hit {
            Some(cached) => Ok(cached),
            None => {
                let value = $compute.await?;
                $cache.remember(pair, value).await;
                Ok(value)
            }
        }
    }};
}
