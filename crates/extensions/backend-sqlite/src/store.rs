//! SQLite activity store implementation.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, Row, params};
use tokio_rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use weft_protocols::history::{deserialize_attributes, serialize_attributes};
use weft_protocols::store::{DEFAULT_LEASE, ensure_scheduled};
use weft_protocols::{ActivityStore, ActivityTask, Event, EventType, StoreError, WorkflowInstance};

use crate::schema::init_schema;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

const SELECT_COLUMNS: &str =
    "id, instance_id, execution_id, event_type, event_id, attributes, visible_at";

/// SQLite-backed activity store.
pub struct SqliteActivityStore {
    conn: Connection,
    lease: Duration,
}

impl SqliteActivityStore {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
        }

        info!("Opening activity store at {}", path.display());
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Self::init(conn).await
    }

    /// Set how long a polled activity stays leased.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            conn,
            lease: DEFAULT_LEASE,
        })
    }
}

/// Fixed-width UTC timestamps so stored values order correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A raw `activities` row, decoded outside the connection thread.
struct ActivityRow {
    id: String,
    instance_id: String,
    execution_id: String,
    event_type: String,
    event_id: i64,
    attributes: String,
    visible_at: Option<String>,
}

impl ActivityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            instance_id: row.get(1)?,
            execution_id: row.get(2)?,
            event_type: row.get(3)?,
            event_id: row.get(4)?,
            attributes: row.get(5)?,
            visible_at: row.get(6)?,
        })
    }

    fn into_task(self) -> Result<ActivityTask, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Serialization(format!("bad activity id {}: {}", self.id, e)))?;
        let event_type = EventType::from_str(&self.event_type)?;
        let attributes = deserialize_attributes(event_type, &self.attributes)?;
        let visible_at = self
            .visible_at
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| StoreError::Serialization(format!("bad timestamp {}: {}", raw, e)))
            })
            .transpose()?;

        let event = Event {
            id,
            event_type,
            event_id: self.event_id,
            attributes,
            visible_at,
        };
        Ok(ActivityTask::new(
            WorkflowInstance::with_execution(self.instance_id, self.execution_id),
            event,
        ))
    }
}

#[async_trait]
impl ActivityStore for SqliteActivityStore {
    async fn schedule_activity(
        &self,
        instance: &WorkflowInstance,
        event: &Event,
    ) -> Result<(), StoreError> {
        ensure_scheduled(event)?;

        let id = event.id.to_string();
        let instance_id = instance.instance_id.clone();
        let execution_id = instance.execution_id.clone();
        let event_type = event.event_type.as_str();
        let event_id = event.event_id;
        let attributes = serialize_attributes(&event.attributes)?;
        let visible_at = event.visible_at.map(timestamp);

        debug!(activity = %id, instance = %instance_id, "scheduling activity");
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO activities
                     (id, instance_id, execution_id, event_type, event_id, attributes, visible_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![id, instance_id, execution_id, event_type, event_id, attributes, visible_at],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn poll_activity(&self, now: DateTime<Utc>) -> Result<Option<ActivityTask>, StoreError> {
        let lease = chrono::Duration::from_std(self.lease)
            .map_err(|e| StoreError::InvalidEvent(e.to_string()))?;
        let now_ts = timestamp(now);
        let locked_until = timestamp(now + lease);

        let row = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let row = tx
                    .query_row(
                        &format!(
                            "SELECT {SELECT_COLUMNS} FROM activities
                             WHERE (visible_at IS NULL OR visible_at <= ?1)
                               AND (locked_until IS NULL OR locked_until <= ?1)
                             ORDER BY seq LIMIT 1"
                        ),
                        [&now_ts],
                        ActivityRow::from_row,
                    )
                    .optional()?;

                if let Some(row) = &row {
                    tx.execute(
                        "UPDATE activities SET locked_until = ?1 WHERE id = ?2",
                        params![locked_until, row.id],
                    )?;
                }

                tx.commit()?;
                Ok(row)
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        row.map(ActivityRow::into_task).transpose()
    }

    async fn complete_activity(&self, id: &Uuid) -> Result<(), StoreError> {
        let key = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM activities WHERE id = ?1", [&key])?))
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(activity = %id, "completed activity");
        Ok(())
    }

    async fn pending_activities(&self) -> Result<Vec<ActivityTask>, StoreError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM activities ORDER BY seq"))?;
                let rows = stmt
                    .query_map([], ActivityRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        rows.into_iter().map(ActivityRow::into_task).collect()
    }
}
