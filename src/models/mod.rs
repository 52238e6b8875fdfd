use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod prediction;
pub mod similarity;

pub use prediction::{Neighbor, Prediction, Recommendation};
pub use similarity::{Similarity, UndefinedReason};

/// Identifier of a user who rates movies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RaterId(pub i32);

/// Identifier of a rated movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub i32);

impl Display for RaterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One score a rater gave, seen from the rater's side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatedItem {
    pub item: ItemId,
    pub score: f64,
}

impl RatedItem {
    pub fn new(item: ItemId, score: f64) -> Self {
        Self { item, score }
    }
}

/// One score an item received, seen from the item's side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemRating {
    pub rater: RaterId,
    pub score: f64,
}

impl ItemRating {
    pub fn new(rater: RaterId, score: f64) -> Self {
        Self { rater, score }
    }
}

/// A rater together with a read-only snapshot of their rating history
#[derive(Debug, Clone, PartialEq)]
pub struct Rater {
    pub id: RaterId,
    pub ratings: Vec<RatedItem>,
}

impl Rater {
    pub fn new(id: RaterId, ratings: Vec<RatedItem>) -> Self {
        Self { id, ratings }
    }

    /// Whether this rater has scored the given item
    pub fn has_rated(&self, item: ItemId) -> bool {
        self.ratings.iter().any(|r| r.item == item)
    }
}

/// Unordered pair of raters, used to key symmetric similarity results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RaterPair {
    low: RaterId,
    high: RaterId,
}

impl RaterPair {
    pub fn new(a: RaterId, b: RaterId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> RaterId {
        self.low
    }

    pub fn high(&self) -> RaterId {
        self.high
    }
}

impl Display for RaterPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}
