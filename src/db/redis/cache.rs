use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::db::cache::SimilarityCache;
use crate::error::AppError;
use crate::error::AppResult;
use crate::models::{RaterPair, Similarity};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Similarity(RaterPair),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Similarity(pair) => write!(f, "sim:{}", pair),
        }
    }
}

/// Creates a Redis client for caching
///
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving data from Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task and waits for it to flush
    /// queued writes to Redis.
    pub async fn shutdown(self) {
        if let Err(e) = self.shutdown_tx.send(()).await {
            tracing::warn!(error = %e, "Cache writer already stopped");
        } else {
            tracing::info!("Cache writer shutdown signal sent");
        }

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task did not finish cleanly");
        }
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    ///
    /// Writes are queued to a background task so computing similarities never
    /// waits on Redis round trips for stores.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx, task };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown signal, flushes all queued messages before exiting.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut failed_writes = 0usize;

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        failed_writes += 1;
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!(failed = failed_writes, "Cache writer shutting down, flushing remaining writes");

                    // Senders may still be alive, so drain only what is queued
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key is absent.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value in the cache asynchronously without blocking
    ///
    /// The value is serialized here and handed to the background writer; this
    /// method returns before Redis acknowledges the write.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: format!("{}", key),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

/// Similarity as stored in Redis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CachedSimilarity {
    pub similarity: Similarity,
    pub computed_at: DateTime<Utc>,
}

/// Similarity cache shared across batch runs, backed by Redis
///
/// Entries expire after `ttl` seconds; until then a cached similarity may lag
/// behind newer ratings.
#[derive(Clone)]
pub struct RedisSimilarityCache {
    cache: Cache,
    ttl: u64,
}

impl RedisSimilarityCache {
    pub fn new(cache: Cache, ttl: u64) -> Self {
        Self { cache, ttl }
    }
}

#[async_trait::async_trait]
impl SimilarityCache for RedisSimilarityCache {
    async fn lookup(&self, pair: RaterPair) -> AppResult<Option<Similarity>> {
        let cached: Option<CachedSimilarity> = self
            .cache
            .get_from_cache(&CacheKey::Similarity(pair))
            .await?;

        Ok(cached.map(|c| c.similarity))
    }

    async fn remember(&self, pair: RaterPair, similarity: Similarity) {
        let entry = CachedSimilarity {
            similarity,
            computed_at: Utc::now(),
        };
        self.cache
            .set_in_background(&CacheKey::Similarity(pair), &entry, self.ttl);
    }
}
