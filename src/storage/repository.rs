use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{NewVoucher, Voucher};

use super::{MIGRATION_001_INITIAL, StoreError, VoucherStore};

/// Voucher store persisted in SQLite.
pub struct SqliteVoucherStore {
    pool: SqlitePool,
}

impl SqliteVoucherStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    fn row_to_voucher(row: &sqlx::sqlite::SqliteRow) -> Result<Voucher> {
        let created_at_str: String = row.get("created_at");
        let used_at_str: Option<String> = row.get("used_at");

        Ok(Voucher {
            id: row.get("id"),
            code: row.get("code"),
            discount: row.get("discount"),
            used: row.get::<i32, _>("used") != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
            used_at: used_at_str
                .map(|s| DateTime::parse_from_rfc3339(&s))
                .transpose()
                .context("Invalid used_at timestamp")?
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl VoucherStore for SqliteVoucherStore {
    async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, discount, used, created_at, used_at
            FROM vouchers
            WHERE code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch voucher by code")?;

        row.as_ref().map(Self::row_to_voucher).transpose()
    }

    async fn create_voucher(&self, voucher: &NewVoucher) -> Result<Voucher> {
        let result = sqlx::query(
            r#"
            INSERT INTO vouchers (code, discount, used, created_at)
            VALUES (?, ?, 0, ?)
            "#,
        )
        .bind(&voucher.code)
        .bind(voucher.discount)
        .bind(voucher.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::DuplicateCode(voucher.code.clone()).into());
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to save voucher")),
        };

        let id = result.last_insert_rowid();
        tracing::debug!(id, code = %voucher.code, "voucher row inserted");

        Ok(Voucher {
            id,
            code: voucher.code.clone(),
            discount: voucher.discount,
            used: false,
            created_at: voucher.created_at,
            used_at: None,
        })
    }

    async fn use_voucher(&self, code: &str) -> Result<Option<Voucher>> {
        // The `used = 0` guard makes this a compare-and-set: only one caller
        // can see a returned row.
        let row = sqlx::query(
            r#"
            UPDATE vouchers
            SET used = 1, used_at = ?
            WHERE code = ? AND used = 0
            RETURNING id, code, discount, used, created_at, used_at
            "#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to mark voucher as used")?;

        if row.is_none() {
            tracing::debug!(code, "use_voucher matched no unused row");
        }

        row.as_ref().map(Self::row_to_voucher).transpose()
    }

    async fn list_vouchers(&self) -> Result<Vec<Voucher>> {
        let rows = sqlx::query(
            "SELECT id, code, discount, used, created_at, used_at FROM vouchers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list vouchers")?;

        rows.iter().map(Self::row_to_voucher).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store() -> Result<(SqliteVoucherStore, TempDir)> {
        let dir = TempDir::new()?;
        let path = dir.path().join("store.db");
        let store = SqliteVoucherStore::init(&format!("sqlite:{}?mode=rwc", path.display())).await?;
        Ok((store, dir))
    }

    #[tokio::test]
    async fn test_insert_and_lookup() -> Result<()> {
        let (store, _dir) = temp_store().await?;

        let created = store.create_voucher(&NewVoucher::new("ABC123", 20)).await?;
        assert!(created.id > 0);
        assert!(!created.used);

        let fetched = store.get_voucher_by_code("ABC123").await?.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.discount, 20);
        assert!(fetched.used_at.is_none());

        // Codes are case-sensitive
        assert!(store.get_voucher_by_code("abc123").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_code_is_reported() -> Result<()> {
        let (store, _dir) = temp_store().await?;
        store.create_voucher(&NewVoucher::new("DUP", 10)).await?;

        let err = store
            .create_voucher(&NewVoucher::new("DUP", 50))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::DuplicateCode("DUP".into()))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_use_voucher_only_once() -> Result<()> {
        let (store, _dir) = temp_store().await?;
        store.create_voucher(&NewVoucher::new("ONCE", 15)).await?;

        let first = store.use_voucher("ONCE").await?.unwrap();
        assert!(first.used);
        assert!(first.used_at.is_some());

        assert!(store.use_voucher("ONCE").await?.is_none());
        assert!(store.use_voucher("MISSING").await?.is_none());
        Ok(())
    }
}
