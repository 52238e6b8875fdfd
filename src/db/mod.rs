//! Read-only access to rating data
//!
//! The engine never writes. Every implementation is expected to answer each
//! call from one consistent snapshot; what happens across calls while the
//! underlying data changes is the implementation's concern.

use crate::{
    error::AppResult,
    models::{ItemId, ItemRating, RatedItem, RaterId},
};

pub mod cache;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use cache::{MemorySimilarityCache, SimilarityCache};
pub use memory::InMemoryRatingStore;
pub use postgres::{create_pool, PgRatingStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, RedisSimilarityCache};

/// Trait for rating stores
///
/// Unknown raters and items are not errors: they yield empty sequences, which
/// the engine resolves to "no overlap" or "no prediction".
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    /// Every item the rater has scored
    async fn ratings_by_rater(&self, rater: RaterId) -> AppResult<Vec<RatedItem>>;

    /// Every score the item has received
    async fn ratings_by_item(&self, item: ItemId) -> AppResult<Vec<ItemRating>>;

    /// Scores the item received from anyone but `excluding`
    ///
    /// Candidate raters for a prediction come from here, so the target user's
    /// own rating never feeds back into their prediction. Stores that can
    /// filter at the source should override this.
    async fn other_ratings_for_item(
        &self,
        item: ItemId,
        excluding: RaterId,
    ) -> AppResult<Vec<ItemRating>> {
        let mut ratings = self.ratings_by_item(item).await?;
        ratings.retain(|r| r.rater != excluding);
        Ok(ratings)
    }
}
