//! Credential storage for SourceChat.
//!
//! The [`TokenStore`] trait is the only view the rest of the client has of
//! persisted credentials: get, save, clear. Two implementations:
//! - [`Storage`]: libSQL-backed key-value table (durable, used by the CLI)
//! - [`MemoryTokenStore`]: in-process, used by tests and one-shot sessions
//!
//! Encryption at rest is the host platform's concern; this crate only
//! guarantees atomic single-key reads and writes.

mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use sourcechat_shared::{AuthTokens, ClientError, Result};
use tokio::sync::RwLock;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// Key-value access to the issued access/refresh tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Current access token, if signed in.
    async fn access_token(&self) -> Result<Option<String>>;

    /// Current refresh token, if signed in.
    async fn refresh_token(&self) -> Result<Option<String>>;

    /// Persist a freshly issued token pair, replacing any previous one.
    async fn save_tokens(&self, tokens: &AuthTokens) -> Result<()>;

    /// Forget both tokens.
    async fn clear(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

/// Non-durable token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<AuthTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a token pair already present.
    pub fn with_tokens(tokens: AuthTokens) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.read().await.as_ref().map(|t| t.access_token.clone()))
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.read().await.as_ref().map(|t| t.refresh_token.clone()))
    }

    async fn save_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Storage (libSQL)
// ---------------------------------------------------------------------------

/// Durable credential store wrapping a local libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` for reads only (`auth status`).
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ClientError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(ClientError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Read a single credential value.
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM credentials WHERE key = ?1", params![key])
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| ClientError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}

#[async_trait]
impl TokenStore for Storage {
    async fn access_token(&self) -> Result<Option<String>> {
        self.get_value(ACCESS_TOKEN_KEY).await
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        self.get_value(REFRESH_TOKEN_KEY).await
    }

    async fn save_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;

        for (key, value) in [
            (ACCESS_TOKEN_KEY, tokens.access_token.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
        ] {
            tx.execute(
                "INSERT INTO credentials (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now.as_str()],
            )
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        tracing::debug!("credentials saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM credentials", params![])
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        tracing::debug!("credentials cleared");
        Ok(())
    }
}
