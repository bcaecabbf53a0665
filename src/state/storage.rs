//! Session storage implementation
//!
//! This module defines the [`SessionStore`] contract consumed by the session
//! middleware and the backends shipped with the bridge: in-memory, Redis and
//! SQLite. Values are JSON; keys are opaque strings.
//!
//! No backend serializes concurrent updates for the same key. Deployments
//! must make sure one conversation is processed by one task at a time (the
//! teloxide dispatcher does this per chat) or accept last-write-wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::{RedisConfig, SessionBackend, SessionConfig};
use crate::utils::errors::Result;
use crate::utils::logging::log_store_operation;

/// Key/value persistence for session objects
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: &Value) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Build the store selected in configuration
pub async fn connect_store(config: &SessionConfig) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.backend {
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Arc::new(MemoryStore::new())
        }
        SessionBackend::Redis => {
            info!(url = %config.redis.url, "Using Redis session store");
            let store = RedisSessionStore::new(config.redis.clone()).await?;
            store.test_connection().await?;
            Arc::new(store)
        }
        SessionBackend::Sqlite => {
            info!(path = %config.sqlite_path, "Using SQLite session store");
            Arc::new(SqliteSessionStore::connect(&config.sqlite_path).await?)
        }
    };
    Ok(store)
}

/// Process-local store, lost on restart
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Redis-based session store
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Redis connection manager
    connection_manager: redis::aio::ConnectionManager,
    /// Redis configuration
    config: RedisConfig,
}

impl RedisSessionStore {
    /// Create a new Redis session store
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            config,
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    /// Test Redis connection
    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let full_key = self.full_key(key);
        let started = Instant::now();
        let mut conn = self.connection_manager.clone();

        let serialized: Option<String> = match conn.get::<_, Option<String>>(&full_key).await {
            Ok(data) => data,
            Err(e) => {
                error!(key = %full_key, error = %e, "Failed to get session from Redis");
                log_store_operation("get", &full_key, started.elapsed().as_millis() as u64, false);
                return Err(e.into());
            }
        };
        log_store_operation("get", &full_key, started.elapsed().as_millis() as u64, true);

        match serialized {
            Some(data) => match serde_json::from_str::<Value>(&data) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(key = %full_key, error = %e, "Stored session is not valid JSON, ignoring");
                    Ok(None)
                }
            },
            None => {
                debug!(key = %full_key, "No session found in Redis");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let full_key = self.full_key(key);
        let serialized = serde_json::to_string(value)?;
        let started = Instant::now();
        let mut conn = self.connection_manager.clone();

        let result = match self.config.ttl_seconds {
            Some(ttl_seconds) => conn.set_ex::<_, _, ()>(&full_key, serialized, ttl_seconds).await,
            None => conn.set::<_, _, ()>(&full_key, serialized).await,
        };

        let success = result.is_ok();
        log_store_operation("set", &full_key, started.elapsed().as_millis() as u64, success);
        if let Err(e) = result {
            error!(key = %full_key, error = %e, "Failed to save session to Redis");
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_key = self.full_key(key);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&full_key).await?;

        if deleted > 0 {
            debug!(key = %full_key, "Deleted session");
        } else {
            debug!(key = %full_key, "No session to delete");
        }

        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// SQLite-backed session store
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (or create) the database file and make sure the table exists
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Use an existing pool
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row: Option<String> = sqlx::query_scalar("SELECT value FROM sessions WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(|raw| match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = key, error = %e, "Stored session is not valid JSON, ignoring");
                None
            }
        }))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        sqlx::query("INSERT OR REPLACE INTO sessions (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(serialized)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
