use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelvault_core::{Transition, UploadRecord, UploadStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::store::{clamp_list_limit, StoreError, StoreResult, UploadRecordStore};

const RECORD_COLUMNS: &str = r#"
    file_id, owner_id, file_name, file_type, file_size_bytes,
    source_key, result_key, status, upload_handle,
    created_at, updated_at, expires_at
"#;

/// PostgreSQL-backed upload record store
#[derive(Clone)]
pub struct PostgresUploadRecordStore {
    pool: PgPool,
}

impl PostgresUploadRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(&self, file_id: Uuid) -> StoreResult<Option<UploadStatus>> {
        let status = sqlx::query_scalar::<_, UploadStatus>(
            "SELECT status FROM upload_records WHERE file_id = $1",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }
}

fn record_from_row(row: &PgRow) -> Result<UploadRecord, sqlx::Error> {
    Ok(UploadRecord {
        file_id: row.try_get("file_id")?,
        owner_id: row.try_get("owner_id")?,
        file_name: row.try_get("file_name")?,
        file_type: row.try_get("file_type")?,
        file_size_bytes: row.try_get("file_size_bytes")?,
        source_key: row.try_get("source_key")?,
        result_key: row.try_get("result_key")?,
        status: row.try_get("status")?,
        upload_handle: row.try_get("upload_handle")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

#[async_trait]
impl UploadRecordStore for PostgresUploadRecordStore {
    #[tracing::instrument(skip(self, record), fields(
        db.system = "postgresql",
        db.operation = "INSERT",
        file_id = %record.file_id
    ))]
    async fn create(&self, record: &UploadRecord) -> StoreResult<()> {
        // Any unique violation (primary key or live source key) skips the insert.
        let result = sqlx::query(
            r#"
            INSERT INTO upload_records (
                file_id, owner_id, file_name, file_type, file_size_bytes,
                source_key, result_key, status, upload_handle,
                created_at, updated_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(record.file_id)
        .bind(&record.owner_id)
        .bind(&record.file_name)
        .bind(&record.file_type)
        .bind(record.file_size_bytes)
        .bind(&record.source_key)
        .bind(&record.result_key)
        .bind(record.status)
        .bind(&record.upload_handle)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateKey(format!(
                "file {} or source key {} already exists",
                record.file_id, record.source_key
            )));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.operation = "SELECT"))]
    async fn get_by_id(&self, file_id: Uuid) -> StoreResult<UploadRecord> {
        let sql = format!(
            "SELECT {} FROM upload_records WHERE file_id = $1",
            RECORD_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(record_from_row(&row)?),
            None => Err(StoreError::NotFound(file_id.to_string())),
        }
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.operation = "SELECT"))]
    async fn get_by_source_key(&self, source_key: &str) -> StoreResult<UploadRecord> {
        let sql = format!(
            r#"
            SELECT {}
            FROM upload_records
            WHERE source_key = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            RECORD_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(source_key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(record_from_row(&row)?),
            None => Err(StoreError::NotFound(source_key.to_string())),
        }
    }

    #[tracing::instrument(skip(self, transition), fields(
        db.system = "postgresql",
        db.operation = "UPDATE",
        from = %transition.from,
        to = %transition.to
    ))]
    async fn apply_transition(
        &self,
        file_id: Uuid,
        transition: &Transition,
    ) -> StoreResult<UploadRecord> {
        let sql = format!(
            r#"
            UPDATE upload_records
            SET status = $3,
                updated_at = NOW(),
                result_key = COALESCE($4, result_key),
                upload_handle = CASE WHEN $5 THEN NULL ELSE upload_handle END
            WHERE file_id = $1 AND status = $2
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(file_id)
            .bind(transition.from)
            .bind(transition.to)
            .bind(&transition.result_key)
            .bind(transition.clear_upload_handle)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            return Ok(record_from_row(&row)?);
        }

        match self.current_status(file_id).await? {
            Some(current) => Err(StoreError::StatusChanged { current }),
            None => Err(StoreError::NotFound(file_id.to_string())),
        }
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.operation = "SELECT"))]
    async fn list_by_owner(&self, owner_id: &str, limit: i64) -> StoreResult<Vec<UploadRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM upload_records
            WHERE owner_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(owner_id)
            .bind(clamp_list_limit(Some(limit)))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.operation = "UPDATE"))]
    async fn clear_upload_handle(&self, file_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE upload_records
            SET upload_handle = NULL, updated_at = NOW()
            WHERE file_id = $1 AND status = $2 AND upload_handle IS NOT NULL
            "#,
        )
        .bind(file_id)
        .bind(UploadStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.system = "postgresql", db.operation = "SELECT"))]
    async fn list_stale_handles(
        &self,
        issued_before: DateTime<Utc>,
        limit: i64,
    ) -> StoreResult<Vec<UploadRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM upload_records
            WHERE status = 'PENDING'
              AND upload_handle IS NOT NULL
              AND created_at < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
            RECORD_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(issued_before)
            .bind(limit.max(1))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
