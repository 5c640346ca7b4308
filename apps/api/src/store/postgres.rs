use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, VersionStore};
use crate::models::resume::{Document, ResumeRecord, StoredVersion, VersionFilter, VersionType};

/// Postgres-backed store. Versions are append-only rows in `resume_versions`.
#[derive(Clone)]
pub struct PgVersionStore {
    pool: PgPool,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn create_resume(&self, raw_text: &str) -> Result<Uuid, StoreError> {
        let (id,): (Uuid,) =
            sqlx::query_as("INSERT INTO resumes (id, raw_text) VALUES ($1, $2) RETURNING id")
                .bind(Uuid::new_v4())
                .bind(raw_text)
                .fetch_one(&self.pool)
                .await?;
        Ok(id)
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError> {
        let record: Option<ResumeRecord> =
            sqlx::query_as("SELECT id, raw_text, created_at FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }

    async fn save_version(
        &self,
        id: Uuid,
        document: &Document,
        version_type: VersionType,
    ) -> Result<(), StoreError> {
        let content =
            serde_json::to_value(document).map_err(|e| StoreError::Malformed(e.to_string()))?;

        // FK on resume_id surfaces an unknown resume as 23503 -> Integrity
        sqlx::query(
            r#"
            INSERT INTO resume_versions (id, resume_id, content, version_type)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(content)
        .bind(version_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_version(
        &self,
        id: Uuid,
        filter: VersionFilter,
    ) -> Result<Option<StoredVersion>, StoreError> {
        let version: Option<StoredVersion> = match filter {
            VersionFilter::Latest => {
                sqlx::query_as(
                    r#"
                    SELECT resume_id, content, version_type, created_at
                    FROM resume_versions
                    WHERE resume_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            VersionFilter::Only(version_type) => {
                sqlx::query_as(
                    r#"
                    SELECT resume_id, content, version_type, created_at
                    FROM resume_versions
                    WHERE resume_id = $1 AND version_type = $2
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(id)
                .bind(version_type.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(version)
    }
}
