//! Redis-backed availability cache, shared between server instances
//!
//! Generations live under their own prefix so the SCAN patterns that drop
//! slot entries never reset them.

use async_trait::async_trait;
use chrono::NaiveDate;
use redis::{AsyncCommands, Client, Script};
use uuid::Uuid;

use super::cache::AvailabilityCache;
use crate::{
    error::{AppError, AppResult},
    models::slot::SlotAvailability,
};

const KEY_PREFIX: &str = "availability";
const GENERATION_PREFIX: &str = "availability-generation";
/// Far longer than any computation, so an expired counter cannot fool a reader
const GENERATION_TTL_SECONDS: u64 = 86_400;

/// Write the entry only while the summed generations still equal `ARGV[1]`.
///
/// - `KEYS[1]`: slot list key
/// - `KEYS[2..4]`: global, barber and (barber, date) generation keys
/// - `ARGV[2]`: JSON slot list, `ARGV[3]`: TTL in seconds
const PUT_IF_CURRENT: &str = r#"
local generation = 0
for i = 2, #KEYS do
    generation = generation + tonumber(redis.call('GET', KEYS[i]) or '0')
end
if generation ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    ttl_seconds: u64,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    /// Get a Redis connection
    pub async fn get_connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Transient(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(barber_id: Uuid, date: NaiveDate) -> String {
        format!("{}:{}:{}", KEY_PREFIX, barber_id, date)
    }

    /// Global, barber and (barber, date) generation keys, in that order
    fn generation_keys(barber_id: Uuid, date: NaiveDate) -> [String; 3] {
        [
            GENERATION_PREFIX.to_string(),
            format!("{}:{}", GENERATION_PREFIX, barber_id),
            format!("{}:{}:{}", GENERATION_PREFIX, barber_id, date),
        ]
    }

    async fn bump_generation(&self, key: &str) -> AppResult<()> {
        let mut conn = self.get_connection().await?;
        redis::pipe()
            .atomic()
            .incr(key, 1)
            .ignore()
            .cmd("EXPIRE")
            .arg(key)
            .arg(GENERATION_TTL_SECONDS)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bump availability generation: {}", e)))
    }

    /// Delete every key matching `pattern`, walking the keyspace with SCAN
    async fn delete_matching(&self, pattern: &str) -> AppResult<u64> {
        let mut conn = self.get_connection().await?;
        let mut cursor: u64 = 0;
        let mut deleted = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to scan Redis keys: {}", e)))?;

            if !keys.is_empty() {
                deleted += conn
                    .del::<_, u64>(&keys)
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to delete Redis keys: {}", e)))?;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(deleted)
    }
}

#[async_trait]
impl AvailabilityCache for RedisService {
    async fn get(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<Option<Vec<SlotAvailability>>> {
        let mut conn = self.get_connection().await?;
        let stored: Option<String> = conn
            .get(Self::key(barber_id, date))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read availability from Redis: {}", e)))?;

        match stored {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| AppError::Internal(format!("Corrupt availability entry in Redis: {}", e))),
            None => Ok(None),
        }
    }

    async fn generation(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<u64> {
        let keys = Self::generation_keys(barber_id, date);
        let mut conn = self.get_connection().await?;
        let counters: Vec<Option<u64>> = redis::cmd("MGET")
            .arg(&keys[..])
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read availability generation: {}", e)))?;
        Ok(counters.into_iter().flatten().sum())
    }

    async fn put(&self, barber_id: Uuid, date: NaiveDate, seen: u64, slots: &[SlotAvailability]) -> AppResult<bool> {
        if self.ttl_seconds == 0 {
            return Ok(false);
        }
        let json = serde_json::to_string(slots)
            .map_err(|e| AppError::Internal(format!("Failed to serialize availability: {}", e)))?;

        let mut conn = self.get_connection().await?;
        let [global, barber, slot] = Self::generation_keys(barber_id, date);
        let written: i32 = Script::new(PUT_IF_CURRENT)
            .key(Self::key(barber_id, date))
            .key(global)
            .key(barber)
            .key(slot)
            .arg(seen)
            .arg(json)
            .arg(self.ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store availability in Redis: {}", e)))?;
        Ok(written == 1)
    }

    async fn invalidate(&self, barber_id: Uuid, date: NaiveDate) -> AppResult<()> {
        let [_, _, slot] = Self::generation_keys(barber_id, date);
        self.bump_generation(&slot).await?;

        let mut conn = self.get_connection().await?;
        conn.del::<_, ()>(Self::key(barber_id, date))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to invalidate availability in Redis: {}", e)))?;
        Ok(())
    }

    async fn invalidate_barber(&self, barber_id: Uuid) -> AppResult<()> {
        self.bump_generation(&format!("{}:{}", GENERATION_PREFIX, barber_id))
            .await?;
        let deleted = self
            .delete_matching(&format!("{}:{}:*", KEY_PREFIX, barber_id))
            .await?;
        tracing::debug!(%barber_id, deleted, "Invalidated cached availability for barber");
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.bump_generation(GENERATION_PREFIX).await?;
        let deleted = self.delete_matching(&format!("{}:*", KEY_PREFIX)).await?;
        tracing::debug!(deleted, "Cleared cached availability");
        Ok(())
    }
}
