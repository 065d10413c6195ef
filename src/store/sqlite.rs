// src/store/sqlite.rs
//! SQLite-backed listing store. The UNIQUE index on `identity_key` plus
//! `INSERT OR IGNORE` gives the atomic claim; concurrent duplicate inserts
//! resolve to zero affected rows, never to an error.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::ListingStore;
use crate::listing::Listing;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the store at `db_path` and ensure the
    /// schema exists.
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .with_context(|| format!("opening listing store at {}", db_path.display()))?;

        if newly_created {
            info!(path = %db_path.display(), "initialized new listing store");
        } else {
            info!(path = %db_path.display(), "opened existing listing store");
        }

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store, used by tests.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("opening in-memory listing store")?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        // WAL lets a reader (exists) overlap the writer (try_claim)
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                identity_key TEXT NOT NULL UNIQUE,
                id           TEXT NOT NULL,
                link         TEXT NOT NULL,
                title        TEXT NOT NULL,
                price        TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                updated_at   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("creating listings table")?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n"))
    }
}

#[async_trait::async_trait]
impl ListingStore for SqliteStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM listings WHERE identity_key = ? LIMIT 1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("listing existence check")?;
        Ok(row.is_some())
    }

    async fn try_claim(&self, listing: &Listing) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO listings
                (identity_key, id, link, title, price, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(listing.identity_key())
        .bind(&listing.id)
        .bind(&listing.link)
        .bind(&listing.title)
        .bind(&listing.price)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("claiming listing")?;
        Ok(result.rows_affected() == 1)
    }
}
