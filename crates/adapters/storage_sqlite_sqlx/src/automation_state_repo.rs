//! `SQLite` implementation of [`AutomationStateRepository`].

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use sunshade_app::ports::AutomationStateRepository;
use sunshade_domain::error::SunshadeError;
use sunshade_domain::id::{CoverId, InstallationId};
use sunshade_domain::time::now;

use crate::error::StorageError;

struct Wrapper(CoverId, bool);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let cover_id: String = row.try_get("cover_id")?;
        let enabled: bool = row.try_get("enabled")?;
        Ok(Self(CoverId::new(cover_id), enabled))
    }
}

/// `SQLite`-backed store of automation flags, keyed by installation and cover.
pub struct SqliteAutomationStateRepository {
    pool: SqlitePool,
}

impl SqliteAutomationStateRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AutomationStateRepository for SqliteAutomationStateRepository {
    async fn load(
        &self,
        installation_id: InstallationId,
    ) -> Result<HashMap<CoverId, bool>, SunshadeError> {
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT cover_id, enabled FROM automation_states WHERE installation_id = ?",
        )
        .bind(installation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| (w.0, w.1)).collect())
    }

    async fn save(
        &self,
        installation_id: InstallationId,
        cover_id: CoverId,
        enabled: bool,
    ) -> Result<(), SunshadeError> {
        sqlx::query(
            "INSERT INTO automation_states (installation_id, cover_id, enabled, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT (installation_id, cover_id) \
             DO UPDATE SET enabled = excluded.enabled, updated_at = excluded.updated_at",
        )
        .bind(installation_id.as_uuid())
        .bind(cover_id.as_str())
        .bind(enabled)
        .bind(now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }
}
