pub mod prediction;
pub mod recommendations;
pub mod similarity;

pub use prediction::{PredictorOptions, RatingPredictor};
pub use recommendations::{BatchRecommender, PredictionRecord};
pub use similarity::SimilarityEngine;
