use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{RaterPair, Similarity},
};

/// Storage for computed similarities, keyed by unordered rater pair
///
/// Similarity is symmetric, so one entry serves both argument orders.
#[async_trait::async_trait]
pub trait SimilarityCache: Send + Sync {
    /// Returns the remembered similarity for the pair, if any
    ///
    /// Errors are reported to the caller, which treats them as a miss.
    async fn lookup(&self, pair: RaterPair) -> AppResult<Option<Similarity>>;

    /// Remembers a similarity; failures are logged, not returned
    async fn remember(&self, pair: RaterPair, similarity: Similarity);
}

/// Similarity cache that lives for a single batch run
#[derive(Debug, Default)]
pub struct MemorySimilarityCache {
    entries: RwLock<HashMap<RaterPair, Similarity>>,
}

impl MemorySimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl SimilarityCache for MemorySimilarityCache {
    async fn lookup(&self, pair: RaterPair) -> AppResult<Option<Similarity>> {
        Ok(self.entries.read().await.get(&pair).copied())
    }

    async fn remember(&self, pair: RaterPair, similarity: Similarity) {
        self.entries.write().await.insert(pair, similarity);
    }
}

/// Cache whose backend is never reachable
#[cfg(test)]
pub(crate) struct UnreachableSimilarityCache;

#[cfg(test)]
#[async_trait::async_trait]
impl SimilarityCache for UnreachableSimilarityCache {
    async fn lookup(&self, _pair: RaterPair) -> AppResult<Option<Similarity>> {
        Err(crate::error::AppError::Internal(
            "similarity cache unreachable".to_string(),
        ))
    }

    async fn remember(&self, _pair: RaterPair, _similarity: Similarity) {}
}
