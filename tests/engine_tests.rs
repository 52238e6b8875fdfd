use std::sync::Arc;

use movie_ratings::db::{InMemoryRatingStore, RatingStore};
use movie_ratings::models::{ItemId, Prediction, RaterId, Similarity, UndefinedReason};
use movie_ratings::services::{
    prediction::{aggregate, Candidate},
    PredictorOptions, RatingPredictor, SimilarityEngine,
};

fn engine_and_predictor(store: InMemoryRatingStore) -> (Arc<SimilarityEngine>, RatingPredictor) {
    let store: Arc<dyn RatingStore> = Arc::new(store);
    let engine = Arc::new(SimilarityEngine::new(store.clone()));
    let predictor = RatingPredictor::new(engine.clone(), store, PredictorOptions::default());
    (engine, predictor)
}

#[tokio::test]
async fn test_co_varying_raters_are_perfectly_similar() {
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 3.0)
        .with_rating(2, 1, 4.0)
        .with_rating(2, 2, 2.0);
    let (engine, _) = engine_and_predictor(store);

    let similarity = engine.similarity(RaterId(1), RaterId(2)).await.unwrap();
    assert_eq!(similarity, Similarity::Correlation(1.0));
    assert_eq!(similarity.value(), 1.0);
}

#[tokio::test]
async fn test_similarity_is_symmetric_across_catalog() {
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 2.0)
        .with_rating(1, 3, 4.0)
        .with_rating(1, 4, 3.0)
        .with_rating(2, 4, 1.0)
        .with_rating(2, 3, 4.0)
        .with_rating(2, 1, 4.0)
        .with_rating(3, 2, 5.0)
        .with_rating(3, 1, 2.0)
        .with_rating(3, 5, 3.0)
        .with_rating(4, 9, 1.0);
    let (engine, _) = engine_and_predictor(store);

    for a in 1..=4 {
        for b in 1..=4 {
            let forward = engine.similarity(RaterId(a), RaterId(b)).await.unwrap();
            let backward = engine.similarity(RaterId(b), RaterId(a)).await.unwrap();
            assert_eq!(forward, backward, "similarity({a}, {b})");
            assert!((-1.0..=1.0).contains(&forward.value()));
        }
    }
}

#[test]
fn test_weighted_average_of_two_neighbors() {
    let candidates = [
        Candidate {
            rater: RaterId(10),
            score: 4.0,
            similarity: Similarity::Correlation(0.8),
        },
        Candidate {
            rater: RaterId(20),
            score: 2.0,
            similarity: Similarity::Correlation(0.5),
        },
    ];

    let score = aggregate(&candidates, None).score().unwrap();
    assert!((score - (4.0 * 0.8 + 2.0 * 0.5) / 1.3).abs() < 1e-12);
    assert!((score - 3.23).abs() < 0.005);
}

#[tokio::test]
async fn test_prediction_weights_neighbors_by_store_similarity() {
    // Raters 2 and 3 both lean with rater 1, rater 3 more closely
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 1.0)
        .with_rating(1, 3, 4.0)
        .with_rating(2, 1, 4.0)
        .with_rating(2, 2, 2.0)
        .with_rating(2, 3, 5.0)
        .with_rating(2, 10, 4.0)
        .with_rating(3, 1, 5.0)
        .with_rating(3, 2, 2.0)
        .with_rating(3, 3, 3.0)
        .with_rating(3, 10, 2.0);
    let (engine, predictor) = engine_and_predictor(store);

    let to_2 = engine.similarity(RaterId(1), RaterId(2)).await.unwrap().value();
    let to_3 = engine.similarity(RaterId(1), RaterId(3)).await.unwrap().value();
    assert!(to_2 > 0.0 && to_3 > to_2);

    match predictor.predict(RaterId(1), ItemId(10)).await.unwrap() {
        Prediction::Predicted { score, neighbors } => {
            let expected = (4.0 * to_2 + 2.0 * to_3) / (to_2 + to_3);
            assert!((score - expected).abs() < 1e-12);
            assert!(score > 2.0 && score < 3.0);

            let raters: Vec<_> = neighbors.iter().map(|n| n.rater).collect();
            assert_eq!(raters, vec![RaterId(3), RaterId(2)]);
            assert_eq!(neighbors[0].weight, to_3);
        }
        Prediction::Unavailable => panic!("expected a prediction"),
    }
}

#[tokio::test]
async fn test_negatively_correlated_only_rater_gives_no_prediction() {
    // Rater 2 scores the shared movies opposite to rater 1
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 2.0)
        .with_rating(1, 3, 4.0)
        .with_rating(2, 1, 2.0)
        .with_rating(2, 2, 5.0)
        .with_rating(2, 3, 3.0)
        .with_rating(2, 7, 5.0);
    let (engine, predictor) = engine_and_predictor(store);

    let similarity = engine.similarity(RaterId(1), RaterId(2)).await.unwrap();
    assert!(similarity.value() < 0.0);

    let prediction = predictor.predict(RaterId(1), ItemId(7)).await.unwrap();
    assert_eq!(prediction, Prediction::Unavailable);
    assert_eq!(prediction.score(), None);
}

#[tokio::test]
async fn test_disjoint_raters_fall_through_to_no_prediction() {
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 3.0)
        .with_rating(2, 3, 4.0)
        .with_rating(2, 4, 2.0)
        .with_rating(2, 5, 4.0);
    let (engine, predictor) = engine_and_predictor(store);

    let similarity = engine.similarity(RaterId(1), RaterId(2)).await.unwrap();
    assert_eq!(similarity, Similarity::Undefined(UndefinedReason::NoOverlap));
    assert_eq!(similarity.value(), 0.0);

    let prediction = predictor.predict(RaterId(1), ItemId(5)).await.unwrap();
    assert_eq!(prediction, Prediction::Unavailable);
}

#[tokio::test]
async fn test_single_shared_movie_is_degenerate() {
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 3.0)
        .with_rating(2, 1, 1.0)
        .with_rating(2, 9, 4.0);
    let (engine, _) = engine_and_predictor(store);

    let similarity = engine.similarity(RaterId(1), RaterId(2)).await.unwrap();
    assert_eq!(
        similarity,
        Similarity::Undefined(UndefinedReason::DegenerateVariance)
    );
    assert_eq!(similarity.value(), 0.0);
}

#[tokio::test]
async fn test_self_similarity_with_distinct_scores() {
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 3.0)
        .with_rating(1, 3, 1.0);
    let (engine, _) = engine_and_predictor(store);

    let similarity = engine.similarity(RaterId(1), RaterId(1)).await.unwrap();
    assert_eq!(similarity.value(), 1.0);
}

#[tokio::test]
async fn test_movie_without_raters_gives_no_prediction() {
    let store = InMemoryRatingStore::new().with_rating(1, 1, 5.0);
    let (_, predictor) = engine_and_predictor(store);

    let prediction = predictor.predict(RaterId(1), ItemId(2)).await.unwrap();
    assert_eq!(prediction, Prediction::Unavailable);
}

#[tokio::test]
async fn test_own_rating_does_not_feed_own_prediction() {
    // Rater 1 already rated movie 3; only rater 2's score may count
    let store = InMemoryRatingStore::new()
        .with_rating(1, 1, 5.0)
        .with_rating(1, 2, 1.0)
        .with_rating(1, 3, 1.0)
        .with_rating(2, 1, 4.0)
        .with_rating(2, 2, 2.0)
        .with_rating(2, 3, 5.0);
    let (_, predictor) = engine_and_predictor(store);

    let prediction = predictor.predict(RaterId(1), ItemId(3)).await.unwrap();
    match prediction {
        Prediction::Predicted { score, neighbors } => {
            assert_eq!(score, 5.0);
            assert_eq!(neighbors.len(), 1);
            assert_eq!(neighbors[0].rater, RaterId(2));
        }
        Prediction::Unavailable => panic!("expected a prediction"),
    }
}
