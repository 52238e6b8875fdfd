//! Collaborative filtering over user movie ratings.
//!
//! [`services::SimilarityEngine`] correlates two raters' scores and
//! [`services::RatingPredictor`] turns the scores of positively correlated
//! raters into a predicted score. Both read ratings through
//! [`db::RatingStore`].

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;
