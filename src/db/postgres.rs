use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::AppResult,
    models::{ItemId, ItemRating, RatedItem, RaterId},
};

use super::RatingStore;

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct RaterRatingRow {
    movie_id: i32,
    score: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRatingRow {
    user_id: i32,
    score: i32,
}

impl From<RaterRatingRow> for RatedItem {
    fn from(row: RaterRatingRow) -> Self {
        RatedItem::new(ItemId(row.movie_id), f64::from(row.score))
    }
}

impl From<ItemRatingRow> for ItemRating {
    fn from(row: ItemRatingRow) -> Self {
        ItemRating::new(RaterId(row.user_id), f64::from(row.score))
    }
}

/// Read-only rating store over the `ratings` table
///
/// Schema creation and writes belong to the surrounding application.
#[derive(Clone)]
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RatingStore for PgRatingStore {
    async fn ratings_by_rater(&self, rater: RaterId) -> AppResult<Vec<RatedItem>> {
        let rows = sqlx::query_as::<_, RaterRatingRow>(
            r#"
            SELECT movie_id, score
            FROM ratings
            WHERE user_id = $1
            ORDER BY rating_id
            "#,
        )
        .bind(rater.0)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(rater = %rater, count = rows.len(), "Loaded ratings by rater");

        Ok(rows.into_iter().map(RatedItem::from).collect())
    }

    async fn ratings_by_item(&self, item: ItemId) -> AppResult<Vec<ItemRating>> {
        let rows = sqlx::query_as::<_, ItemRatingRow>(
            r#"
            SELECT user_id, score
            FROM ratings
            WHERE movie_id = $1
            ORDER BY rating_id
            "#,
        )
        .bind(item.0)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(item = %item, count = rows.len(), "Loaded ratings by item");

        Ok(rows.into_iter().map(ItemRating::from).collect())
    }

    async fn other_ratings_for_item(
        &self,
        item: ItemId,
        excluding: RaterId,
    ) -> AppResult<Vec<ItemRating>> {
        let rows = sqlx::query_as::<_, ItemRatingRow>(
            r#"
            SELECT user_id, score
            FROM ratings
            WHERE movie_id = $1 AND user_id <> $2
            ORDER BY rating_id
            "#,
        )
        .bind(item.0)
        .bind(excluding.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemRating::from).collect())
    }
}
