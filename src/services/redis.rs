//! Redis-backed session store, for deployments running several server instances

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::error::{AppError, AppResult};

use super::sessions::{generate_token, SessionStore};

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Connect to Redis and check the server answers
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn, ttl_seconds })
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn issue(&self, user_id: i32) -> AppResult<String> {
        let token = generate_token();
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(&token), user_id, self.ttl_seconds)
            .await?;
        Ok(token)
    }

    async fn validate(&self, token: &str) -> AppResult<i32> {
        let mut conn = self.conn.clone();
        // Redis drops the key at expiry, so expired and unknown look the same
        let user_id: Option<i32> = conn.get(Self::key(token)).await?;
        user_id.ok_or_else(|| AppError::Unauthorized("Invalid session token".to_string()))
    }

    async fn expire(&self, token: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::key(token)).await?;
        Ok(())
    }

    async fn reap_expired(&self) -> AppResult<usize> {
        Ok(0)
    }
}
