use serde::{Deserialize, Serialize};

use super::{ItemId, RaterId};

/// A rater whose positive similarity contributed to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub rater: RaterId,
    /// The neighbor's own score for the predicted item
    pub score: f64,
    /// Positive similarity to the target user, used as the weight
    pub weight: f64,
}

/// Result of predicting one user's score for one item
///
/// `Unavailable` means no rater of the item correlates positively with the
/// user. It must not be shown as a numeric zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Prediction {
    Predicted {
        score: f64,
        /// Contributing neighbors, highest similarity first
        neighbors: Vec<Neighbor>,
    },
    Unavailable,
}

impl Prediction {
    pub fn score(&self) -> Option<f64> {
        match self {
            Prediction::Predicted { score, .. } => Some(*score),
            Prediction::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Prediction::Predicted { .. })
    }
}

/// An unrated item suggested to a user, ranked by predicted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item: ItemId,
    pub predicted_score: f64,
    pub neighbor_count: usize,
}
