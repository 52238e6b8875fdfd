use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{ItemId, ItemRating, RatedItem, RaterId},
};

use super::RatingStore;

/// Rating store held entirely in memory
///
/// Holds at most one score per (rater, item); rating again replaces the old
/// score. Ratings come back in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRatingStore {
    by_rater: HashMap<RaterId, Vec<RatedItem>>,
    by_item: HashMap<ItemId, Vec<ItemRating>>,
}

impl InMemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a score, replacing any earlier score for the same pair
    pub fn rate(&mut self, rater: RaterId, item: ItemId, score: f64) {
        let rater_ratings = self.by_rater.entry(rater).or_default();
        if let Some(existing) = rater_ratings.iter_mut().find(|r| r.item == item) {
            existing.score = score;
        } else {
            rater_ratings.push(RatedItem::new(item, score));
        }

        let item_ratings = self.by_item.entry(item).or_default();
        if let Some(existing) = item_ratings.iter_mut().find(|r| r.rater == rater) {
            existing.score = score;
        } else {
            item_ratings.push(ItemRating::new(rater, score));
        }
    }

    /// Builder-style variant of [`InMemoryRatingStore::rate`]
    pub fn with_rating(mut self, rater: i32, item: i32, score: f64) -> Self {
        self.rate(RaterId(rater), ItemId(item), score);
        self
    }
}

#[async_trait::async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn ratings_by_rater(&self, rater: RaterId) -> AppResult<Vec<RatedItem>> {
        Ok(self.by_rater.get(&rater).cloned().unwrap_or_default())
    }

    async fn ratings_by_item(&self, item: ItemId) -> AppResult<Vec<ItemRating>> {
        Ok(self.by_item.get(&item).cloned().unwrap_or_default())
    }
}
