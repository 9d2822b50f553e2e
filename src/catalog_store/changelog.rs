//! Catalog changelog models and types.
//!
//! This module defines the types for tracking changes to catalog entities
//! (artists, albums, tracks, images) through batched changelog entries.
#![allow(dead_code)]

use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// =============================================================================
// Enumerations
// =============================================================================

/// Operation type for a changelog entry
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
}

impl ChangeOperation {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "create" => ChangeOperation::Create,
            "update" => ChangeOperation::Update,
            "delete" => ChangeOperation::Delete,
            _ => ChangeOperation::Update, // Default fallback
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ChangeOperation::Create => "create",
            ChangeOperation::Update => "update",
            ChangeOperation::Delete => "delete",
        }
    }
}

/// Entity type for a changelog entry
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChangeEntityType {
    Artist,
    Album,
    Track,
    Image,
}

impl ChangeEntityType {
    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "artist" => ChangeEntityType::Artist,
            "album" => ChangeEntityType::Album,
            "track" => ChangeEntityType::Track,
            "image" => ChangeEntityType::Image,
            _ => ChangeEntityType::Artist, // Default fallback
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ChangeEntityType::Artist => "artist",
            ChangeEntityType::Album => "album",
            ChangeEntityType::Track => "track",
            ChangeEntityType::Image => "image",
        }
    }

    /// Get the plural form for display purposes
    pub fn plural(&self) -> &'static str {
        match self {
            ChangeEntityType::Artist => "artists",
            ChangeEntityType::Album => "albums",
            ChangeEntityType::Track => "tracks",
            ChangeEntityType::Image => "images",
        }
    }
}

// =============================================================================
// Structs
// =============================================================================

/// A batch of catalog changes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogBatch {
    /// Unique identifier (UUID)
    pub id: String,
    /// Human-readable name for the batch
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Whether the batch is still open for changes
    pub is_open: bool,
    /// Unix timestamp when the batch was created
    pub created_at: i64,
    /// Unix timestamp when the batch was closed (None if still open)
    pub closed_at: Option<i64>,
    /// Unix timestamp of last activity (change recorded)
    pub last_activity_at: i64,
}

/// A single change entry in the changelog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// Auto-incrementing ID
    pub id: i64,
    /// ID of the batch this change belongs to
    pub batch_id: String,
    /// Type of entity that was changed
    pub entity_type: ChangeEntityType,
    /// ID of the entity that was changed
    pub entity_id: String,
    /// Type of operation performed
    pub operation: ChangeOperation,
    /// JSON object with field-level changes: {"field": {"old": X, "new": Y}}
    pub field_changes: serde_json::Value,
    /// Full JSON snapshot of the entity after the change (before for deletes)
    pub entity_snapshot: serde_json::Value,
    /// Human-readable summary of the change
    pub display_summary: Option<String>,
    /// Unix timestamp when the change was recorded
    pub created_at: i64,
}

/// Summary of changes in a batch for the "What's New" endpoint
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchChangeSummary {
    pub artists: EntityChangeSummary,
    pub albums: EntityChangeSummary,
    pub tracks: TrackChangeSummary,
    pub images: EntityChangeSummary,
}

/// Summary of changes for a single entity type (artists, albums, images)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityChangeSummary {
    /// List of added entities with id and name
    pub added: Vec<EntityRef>,
    /// Count of updated entities
    pub updated_count: usize,
    /// List of deleted entities with id and name
    pub deleted: Vec<EntityRef>,
}

/// Summary of track changes (counts only due to volume)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackChangeSummary {
    pub added_count: usize,
    pub updated_count: usize,
    pub deleted_count: usize,
}

/// Reference to an entity with id and name
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

/// Input for creating a new batch
#[derive(Clone, Debug, Deserialize)]
pub struct CreateBatchRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Response for the "What's New" endpoint
#[derive(Clone, Debug, Serialize)]
pub struct WhatsNewResponse {
    pub batches: Vec<WhatsNewBatch>,
}

/// A batch in the "What's New" response
#[derive(Clone, Debug, Serialize)]
pub struct WhatsNewBatch {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub closed_at: i64,
    pub summary: BatchChangeSummary,
}

// =============================================================================
// Field Diff Calculation
// =============================================================================

/// Calculate the diff between two JSON values representing entity states.
///
/// For CREATE operations, pass `None` as `old`.
/// For DELETE operations, pass `None` as `new`.
/// For UPDATE operations, pass both values.
///
/// Returns a JSON object with changed fields: `{"field": {"old": X, "new": Y}}`
pub fn calculate_field_diff(
    old: Option<&serde_json::Value>,
    new: Option<&serde_json::Value>,
) -> serde_json::Value {
    match (old, new) {
        // CREATE: all fields are new
        (None, Some(new_val)) => {
            if let Some(obj) = new_val.as_object() {
                let mut diff = serde_json::Map::new();
                for (key, value) in obj {
                    diff.insert(key.clone(), serde_json::json!({"old": null, "new": value}));
                }
                serde_json::Value::Object(diff)
            } else {
                serde_json::json!({"value": {"old": null, "new": new_val}})
            }
        }
        // DELETE: all fields are removed
        (Some(old_val), None) => {
            if let Some(obj) = old_val.as_object() {
                let mut diff = serde_json::Map::new();
                for (key, value) in obj {
                    diff.insert(key.clone(), serde_json::json!({"old": value, "new": null}));
                }
                serde_json::Value::Object(diff)
            } else {
                serde_json::json!({"value": {"old": old_val, "new": null}})
            }
        }
        // UPDATE: compare fields
        (Some(old_val), Some(new_val)) => calculate_object_diff(old_val, new_val),
        // Both None - shouldn't happen, return empty diff
        (None, None) => serde_json::json!({}),
    }
}

/// Generate a human-readable display summary for a change.
///
/// # Arguments
/// * `entity_type` - Type of entity (Artist, Album, Track, Image)
/// * `operation` - Type of operation (Create, Update, Delete)
/// * `entity_name` - Name of the entity (extracted from snapshot)
/// * `field_changes` - The diff object (for updates, to summarize changed fields)
///
/// # Returns
/// A human-readable summary string like "Created artist The Beatles" or "Updated album Abbey Road"
pub fn generate_display_summary(
    entity_type: &ChangeEntityType,
    operation: &ChangeOperation,
    entity_name: Option<&str>,
) -> String {
    let type_str = entity_type.to_db_str();
    let name = entity_name.unwrap_or("(unknown)");

    match operation {
        ChangeOperation::Create => format!("Created {} '{}'", type_str, name),
        ChangeOperation::Update => format!("Updated {} '{}'", type_str, name),
        ChangeOperation::Delete => format!("Deleted {} '{}'", type_str, name),
    }
}

/// Extract the name field from an entity snapshot.
///
/// Looks for common name fields: "name", "title" (for tracks/albums).
pub fn extract_entity_name(snapshot: &serde_json::Value) -> Option<String> {
    if let Some(obj) = snapshot.as_object() {
        // Try "name" first (artists, albums)
        if let Some(name) = obj.get("name").and_then(|v| v.as_str()) {
            return Some(name.to_string());
        }
        // Try "title" (tracks might use this)
        if let Some(title) = obj.get("title").and_then(|v| v.as_str()) {
            return Some(title.to_string());
        }
    }
    None
}

/// Calculate diff between two JSON objects, returning only changed fields.
fn calculate_object_diff(old: &serde_json::Value, new: &serde_json::Value) -> serde_json::Value {
    let mut diff = serde_json::Map::new();

    let old_obj = old.as_object();
    let new_obj = new.as_object();

    match (old_obj, new_obj) {
        (Some(old_map), Some(new_map)) => {
            // Check all keys in old
            for (key, old_value) in old_map {
                match new_map.get(key) {
                    Some(new_value) => {
                        if old_value != new_value {
                            diff.insert(
                                key.clone(),
                                serde_json::json!({"old": old_value, "new": new_value}),
                            );
                        }
                    }
                    None => {
                        // Key was removed
                        diff.insert(
                            key.clone(),
                            serde_json::json!({"old": old_value, "new": null}),
                        );
                    }
                }
            }
            // Check for new keys
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    diff.insert(
                        key.clone(),
                        serde_json::json!({"old": null, "new": new_value}),
                    );
                }
            }
        }
        _ => {
            // Not both objects, treat as simple value change
            if old != new {
                diff.insert(
                    "value".to_string(),
                    serde_json::json!({"old": old, "new": new}),
                );
            }
        }
    }

    serde_json::Value::Object(diff)
}

// =============================================================================
// ChangeLogStore
// =============================================================================

/// Default inactivity threshold (in seconds) after which a batch is considered stale.
/// Stale batches are automatically closed when a new change is recorded.
pub const DEFAULT_BATCH_INACTIVITY_THRESHOLD_SECS: i64 = 3600; // 1 hour

/// Store for managing catalog changelog batches and entries.
///
/// Shares the same database connection as SqliteCatalogStore.
#[derive(Clone)]
pub struct ChangeLogStore {
    conn: Arc<Mutex<Connection>>,
    /// Inactivity threshold in seconds for auto-closing batches.
    batch_inactivity_threshold_secs: i64,
}

impl ChangeLogStore {
    /// Create a new ChangeLogStore with a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            batch_inactivity_threshold_secs: DEFAULT_BATCH_INACTIVITY_THRESHOLD_SECS,
        }
    }

    /// Create a new ChangeLogStore with a custom inactivity threshold.
    pub fn with_inactivity_threshold(conn: Arc<Mutex<Connection>>, threshold_secs: i64) -> Self {
        Self {
            conn,
            batch_inactivity_threshold_secs: threshold_secs,
        }
    }

    /// Get the current Unix timestamp.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    // =========================================================================
    // Batch Management
    // =========================================================================

    /// Create a new batch. Fails if there's already an open batch.
    pub fn create_batch(&self, name: &str, description: Option<&str>) -> Result<CatalogBatch> {
        let conn = self.conn.lock().unwrap();

        // Check if there's already an active batch
        let active_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM catalog_batches WHERE is_open = 1",
            [],
            |row| row.get(0),
        )?;

        if active_count > 0 {
            bail!("Cannot create batch: another batch is already open");
        }

        let id = Uuid::new_v4().to_string();
        let now = Self::now();

        conn.execute(
            "INSERT INTO catalog_batches (id, name, description, is_open, created_at, last_activity_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            params![id, name, description, now],
        )?;

        Ok(CatalogBatch {
            id,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            is_open: true,
            created_at: now,
            closed_at: None,
            last_activity_at: now,
        })
    }

    /// Get a batch by ID.
    pub fn get_batch(&self, id: &str) -> Result<Option<CatalogBatch>> {
        let conn = self.conn.lock().unwrap();
        self.get_batch_internal(&conn, id)
    }

    /// Internal method to get a batch using an existing connection lock.
    fn get_batch_internal(&self, conn: &Connection, id: &str) -> Result<Option<CatalogBatch>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
             FROM catalog_batches WHERE id = ?1",
        )?;

        match stmt.query_row(params![id], |row| {
            Ok(CatalogBatch {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                is_open: row.get::<_, i64>(3)? == 1,
                created_at: row.get(4)?,
                closed_at: row.get(5)?,
                last_activity_at: row.get(6)?,
            })
        }) {
            Ok(batch) => Ok(Some(batch)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get the currently active (open) batch, if any.
    pub fn get_active_batch(&self) -> Result<Option<CatalogBatch>> {
        let conn = self.conn.lock().unwrap();
        self.get_active_batch_internal(&conn)
    }

    /// Internal method to get active batch using an existing connection lock.
    pub fn get_active_batch_internal(&self, conn: &Connection) -> Result<Option<CatalogBatch>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
             FROM catalog_batches WHERE is_open = 1 LIMIT 1",
        )?;

        match stmt.query_row([], |row| {
            Ok(CatalogBatch {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                is_open: row.get::<_, i64>(3)? == 1,
                created_at: row.get(4)?,
                closed_at: row.get(5)?,
                last_activity_at: row.get(6)?,
            })
        }) {
            Ok(batch) => Ok(Some(batch)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Close a batch. Fails if batch doesn't exist or is already closed.
    pub fn close_batch(&self, id: &str) -> Result<CatalogBatch> {
        let conn = self.conn.lock().unwrap();

        let batch = self.get_batch_internal(&conn, id)?;
        let batch = match batch {
            Some(b) => b,
            None => bail!("Batch not found: {}", id),
        };

        if !batch.is_open {
            bail!("Batch is already closed: {}", id);
        }

        let now = Self::now();
        conn.execute(
            "UPDATE catalog_batches SET is_open = 0, closed_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;

        Ok(CatalogBatch {
            is_open: false,
            closed_at: Some(now),
            ..batch
        })
    }

    /// Internal method to close a batch using an existing connection lock.
    fn close_batch_internal(&self, conn: &Connection, id: &str) -> Result<CatalogBatch> {
        let batch = self.get_batch_internal(conn, id)?;
        let batch = match batch {
            Some(b) => b,
            None => bail!("Batch not found: {}", id),
        };

        if !batch.is_open {
            bail!("Batch is already closed: {}", id);
        }

        let now = Self::now();
        conn.execute(
            "UPDATE catalog_batches SET is_open = 0, closed_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;

        Ok(CatalogBatch {
            is_open: false,
            closed_at: Some(now),
            ..batch
        })
    }

    /// Generate a date-based name for auto-created batches.
    fn generate_auto_batch_name() -> String {
        use chrono::{DateTime, Utc};
        let now: DateTime<Utc> = Utc::now();
        now.format("%Y-%m-%d").to_string()
    }

    /// Internal method to create a batch using an existing connection lock.
    /// Does NOT check for existing open batches - caller is responsible.
    fn create_batch_internal(
        &self,
        conn: &Connection,
        name: &str,
        description: Option<&str>,
    ) -> Result<CatalogBatch> {
        let id = Uuid::new_v4().to_string();
        let now = Self::now();

        conn.execute(
            "INSERT INTO catalog_batches (id, name, description, is_open, created_at, last_activity_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            params![id, name, description, now],
        )?;

        Ok(CatalogBatch {
            id,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            is_open: true,
            created_at: now,
            closed_at: None,
            last_activity_at: now,
        })
    }

    /// Ensure an active batch exists, creating one if needed.
    ///
    /// This method implements automatic batch management:
    /// - If an open batch exists and is not stale, returns it
    /// - If an open batch exists but is stale (inactive > threshold), closes it and creates a new one
    /// - If no open batch exists, creates a new one
    ///
    /// Auto-created batches are named with the current date (YYYY-MM-DD).
    pub fn ensure_active_batch_internal(&self, conn: &Connection) -> Result<CatalogBatch> {
        // Check for existing open batch
        if let Some(batch) = self.get_active_batch_internal(conn)? {
            let now = Self::now();
            let inactive_seconds = now - batch.last_activity_at;

            if inactive_seconds > self.batch_inactivity_threshold_secs {
                // Batch is stale, close it and create a new one
                tracing::info!(
                    "Closing stale batch '{}' (inactive for {} seconds)",
                    batch.name,
                    inactive_seconds
                );
                self.close_batch_internal(conn, &batch.id)?;
            } else {
                // Batch is still active
                return Ok(batch);
            }
        }

        // Create a new auto-batch
        let name = Self::generate_auto_batch_name();
        tracing::info!("Creating new auto-batch '{}'", name);
        self.create_batch_internal(conn, &name, None)
    }

    /// Close any stale open batches.
    ///
    /// This is intended to be called periodically by a background task.
    /// Returns the number of batches that were closed.
    pub fn close_stale_batches(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let now = Self::now();
        let cutoff = now - self.batch_inactivity_threshold_secs;

        // Find and close stale open batches
        let mut stmt = conn.prepare(
            "SELECT id, name FROM catalog_batches WHERE is_open = 1 AND last_activity_at < ?1",
        )?;

        let stale_batches: Vec<(String, String)> = stmt
            .query_map(params![cutoff], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let count = stale_batches.len();
        for (id, name) in stale_batches {
            tracing::info!("Background task closing stale batch '{}'", name);
            conn.execute(
                "UPDATE catalog_batches SET is_open = 0, closed_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
        }

        Ok(count)
    }

    /// List batches, optionally filtered by open/closed status.
    pub fn list_batches(&self, is_open: Option<bool>) -> Result<Vec<CatalogBatch>> {
        let conn = self.conn.lock().unwrap();

        let sql = match is_open {
            Some(true) => {
                "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
                          FROM catalog_batches WHERE is_open = 1 ORDER BY created_at DESC"
            }
            Some(false) => {
                "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
                           FROM catalog_batches WHERE is_open = 0 ORDER BY closed_at DESC"
            }
            None => {
                "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
                    FROM catalog_batches ORDER BY created_at DESC"
            }
        };

        let mut stmt = conn.prepare(sql)?;
        let batches = stmt
            .query_map([], |row| {
                Ok(CatalogBatch {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_open: row.get::<_, i64>(3)? == 1,
                    created_at: row.get(4)?,
                    closed_at: row.get(5)?,
                    last_activity_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }

    /// Delete a batch. Only allowed if batch is open and has no changes.
    pub fn delete_batch(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        let batch = self.get_batch_internal(&conn, id)?;
        let batch = match batch {
            Some(b) => b,
            None => bail!("Batch not found: {}", id),
        };

        if !batch.is_open {
            bail!("Cannot delete closed batch: {}", id);
        }

        // Check if batch has any changes
        let change_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM catalog_change_log WHERE batch_id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        if change_count > 0 {
            bail!(
                "Cannot delete batch with {} recorded changes: {}",
                change_count,
                id
            );
        }

        conn.execute("DELETE FROM catalog_batches WHERE id = ?1", params![id])?;

        Ok(())
    }

    /// Get the count of changes in a batch.
    pub fn get_batch_change_count(&self, batch_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM catalog_change_log WHERE batch_id = ?1",
            params![batch_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Update the last_activity_at timestamp for a batch.
    /// Called internally when recording changes.
    pub fn update_batch_activity_internal(&self, conn: &Connection, batch_id: &str) -> Result<()> {
        let now = Self::now();
        conn.execute(
            "UPDATE catalog_batches SET last_activity_at = ?1 WHERE id = ?2",
            params![now, batch_id],
        )?;
        Ok(())
    }

    // =========================================================================
    // Change Recording
    // =========================================================================

    /// Record a change to an entity within the active batch.
    ///
    /// This is the internal method called during catalog write operations.
    /// It requires an existing connection lock to participate in the same transaction.
    ///
    /// If no active batch exists, one is automatically created with a date-based name.
    /// If the active batch is stale (inactive for longer than the threshold), it is
    /// closed and a new batch is created.
    ///
    /// # Arguments
    /// * `conn` - Locked database connection (for transaction safety)
    /// * `entity_type` - Type of entity being changed
    /// * `entity_id` - ID of the entity being changed
    /// * `operation` - Type of operation (Create, Update, Delete)
    /// * `field_changes` - JSON object with field-level changes
    /// * `entity_snapshot` - Full JSON snapshot of the entity
    /// * `display_summary` - Human-readable summary of the change
    ///
    /// # Returns
    /// The ID of the inserted change entry.
    #[allow(clippy::too_many_arguments)]
    pub fn record_change_internal(
        &self,
        conn: &Connection,
        entity_type: ChangeEntityType,
        entity_id: &str,
        operation: ChangeOperation,
        field_changes: &serde_json::Value,
        entity_snapshot: &serde_json::Value,
        display_summary: Option<&str>,
    ) -> Result<i64> {
        // Ensure we have an active batch (auto-create if needed)
        let batch = self.ensure_active_batch_internal(conn)?;

        let now = Self::now();
        let field_changes_str = serde_json::to_string(field_changes)?;
        let entity_snapshot_str = serde_json::to_string(entity_snapshot)?;

        conn.execute(
            "INSERT INTO catalog_change_log
             (batch_id, entity_type, entity_id, operation, field_changes, entity_snapshot, display_summary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                batch.id,
                entity_type.to_db_str(),
                entity_id,
                operation.to_db_str(),
                field_changes_str,
                entity_snapshot_str,
                display_summary,
                now,
            ],
        )?;

        let change_id = conn.last_insert_rowid();

        // Update batch activity timestamp
        self.update_batch_activity_internal(conn, &batch.id)?;

        Ok(change_id)
    }

    /// Record a change using the store's own connection (for standalone use).
    ///
    /// This method acquires its own lock and is suitable for use outside of
    /// existing transactions.
    pub fn record_change(
        &self,
        entity_type: ChangeEntityType,
        entity_id: &str,
        operation: ChangeOperation,
        field_changes: &serde_json::Value,
        entity_snapshot: &serde_json::Value,
        display_summary: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        self.record_change_internal(
            &conn,
            entity_type,
            entity_id,
            operation,
            field_changes,
            entity_snapshot,
            display_summary,
        )
    }

    // =========================================================================
    // Change Queries
    // =========================================================================

    /// Get all changes in a batch.
    pub fn get_batch_changes(&self, batch_id: &str) -> Result<Vec<ChangeEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, batch_id, entity_type, entity_id, operation, field_changes,
                    entity_snapshot, display_summary, created_at
             FROM catalog_change_log WHERE batch_id = ?1 ORDER BY created_at ASC",
        )?;

        let entries = stmt
            .query_map(params![batch_id], |row| {
                let field_changes_str: String = row.get(5)?;
                let entity_snapshot_str: String = row.get(6)?;

                Ok(ChangeEntry {
                    id: row.get(0)?,
                    batch_id: row.get(1)?,
                    entity_type: ChangeEntityType::from_db_str(&row.get::<_, String>(2)?),
                    entity_id: row.get(3)?,
                    operation: ChangeOperation::from_db_str(&row.get::<_, String>(4)?),
                    field_changes: serde_json::from_str(&field_changes_str).unwrap_or_default(),
                    entity_snapshot: serde_json::from_str(&entity_snapshot_str).unwrap_or_default(),
                    display_summary: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Get change history for a specific entity.
    pub fn get_entity_history(
        &self,
        entity_type: ChangeEntityType,
        entity_id: &str,
    ) -> Result<Vec<ChangeEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, batch_id, entity_type, entity_id, operation, field_changes,
                    entity_snapshot, display_summary, created_at
             FROM catalog_change_log
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY created_at DESC",
        )?;

        let entries = stmt
            .query_map(params![entity_type.to_db_str(), entity_id], |row| {
                let field_changes_str: String = row.get(5)?;
                let entity_snapshot_str: String = row.get(6)?;

                Ok(ChangeEntry {
                    id: row.get(0)?,
                    batch_id: row.get(1)?,
                    entity_type: ChangeEntityType::from_db_str(&row.get::<_, String>(2)?),
                    entity_id: row.get(3)?,
                    operation: ChangeOperation::from_db_str(&row.get::<_, String>(4)?),
                    field_changes: serde_json::from_str(&field_changes_str).unwrap_or_default(),
                    entity_snapshot: serde_json::from_str(&entity_snapshot_str).unwrap_or_default(),
                    display_summary: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    // =========================================================================
    // What's New Endpoint Support
    // =========================================================================

    /// Get a summary of changes in a batch.
    ///
    /// Aggregates all changes in the batch into a summary with:
    /// - Artists: added (id, name), updated count, deleted (id, name)
    /// - Albums: added (id, name), updated count, deleted (id, name)
    /// - Tracks: added count, updated count, deleted count
    /// - Images: added count, updated count, deleted count (not shown in What's New)
    pub fn get_batch_summary(&self, batch_id: &str) -> Result<BatchChangeSummary> {
        let changes = self.get_batch_changes(batch_id)?;
        Ok(Self::aggregate_changes_to_summary(&changes))
    }

    /// Aggregate a list of changes into a summary.
    fn aggregate_changes_to_summary(changes: &[ChangeEntry]) -> BatchChangeSummary {
        let mut summary = BatchChangeSummary::default();

        for change in changes {
            // Extract name from entity snapshot
            let name = change
                .entity_snapshot
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown")
                .to_string();

            let entity_ref = EntityRef {
                id: change.entity_id.clone(),
                name,
            };

            match change.entity_type {
                ChangeEntityType::Artist => match change.operation {
                    ChangeOperation::Create => summary.artists.added.push(entity_ref),
                    ChangeOperation::Update => summary.artists.updated_count += 1,
                    ChangeOperation::Delete => summary.artists.deleted.push(entity_ref),
                },
                ChangeEntityType::Album => match change.operation {
                    ChangeOperation::Create => summary.albums.added.push(entity_ref),
                    ChangeOperation::Update => summary.albums.updated_count += 1,
                    ChangeOperation::Delete => summary.albums.deleted.push(entity_ref),
                },
                ChangeEntityType::Track => match change.operation {
                    ChangeOperation::Create => summary.tracks.added_count += 1,
                    ChangeOperation::Update => summary.tracks.updated_count += 1,
                    ChangeOperation::Delete => summary.tracks.deleted_count += 1,
                },
                ChangeEntityType::Image => match change.operation {
                    ChangeOperation::Create => summary.images.added.push(entity_ref),
                    ChangeOperation::Update => summary.images.updated_count += 1,
                    ChangeOperation::Delete => summary.images.deleted.push(entity_ref),
                },
            }
        }

        summary
    }

    /// Get closed batches with their summaries for the What's New endpoint.
    ///
    /// Returns batches in descending order by closed_at (most recent first).
    pub fn get_whats_new_batches(&self, limit: usize) -> Result<Vec<WhatsNewBatch>> {
        let conn = self.conn.lock().unwrap();

        // Get closed batches
        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
             FROM catalog_batches
             WHERE is_open = 0
             ORDER BY closed_at DESC
             LIMIT ?1",
        )?;

        let batches: Vec<CatalogBatch> = stmt
            .query_map(params![limit as i64], |row| {
                Ok(CatalogBatch {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_open: row.get::<_, i32>(3)? != 0,
                    created_at: row.get(4)?,
                    closed_at: row.get(5)?,
                    last_activity_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Get summaries for each batch
        let mut result = Vec::with_capacity(batches.len());
        for batch in batches {
            let changes = self.get_batch_changes_internal(&conn, &batch.id)?;
            let summary = Self::aggregate_changes_to_summary(&changes);
            result.push(WhatsNewBatch {
                id: batch.id,
                name: batch.name,
                description: batch.description,
                closed_at: batch.closed_at.unwrap_or(0),
                summary,
            });
        }

        Ok(result)
    }

    /// Internal method to get batch changes with an existing connection.
    fn get_batch_changes_internal(
        &self,
        conn: &Connection,
        batch_id: &str,
    ) -> Result<Vec<ChangeEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, batch_id, entity_type, entity_id, operation, field_changes,
                    entity_snapshot, display_summary, created_at
             FROM catalog_change_log
             WHERE batch_id = ?1
             ORDER BY created_at ASC",
        )?;

        let entries = stmt
            .query_map(params![batch_id], |row| {
                let field_changes_str: String = row.get(5)?;
                let entity_snapshot_str: String = row.get(6)?;

                Ok(ChangeEntry {
                    id: row.get(0)?,
                    batch_id: row.get(1)?,
                    entity_type: ChangeEntityType::from_db_str(&row.get::<_, String>(2)?),
                    entity_id: row.get(3)?,
                    operation: ChangeOperation::from_db_str(&row.get::<_, String>(4)?),
                    field_changes: serde_json::from_str(&field_changes_str).unwrap_or_default(),
                    entity_snapshot: serde_json::from_str(&entity_snapshot_str).unwrap_or_default(),
                    display_summary: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Get batches that have been open longer than the specified threshold.
    ///
    /// A batch is considered "stale" if:
    /// - It is open (is_open = true)
    /// - It was created more than `stale_threshold_hours` ago
    ///
    /// Returns the stale batches ordered by created_at ascending (oldest first).
    pub fn get_stale_batches(&self, stale_threshold_hours: u64) -> Result<Vec<CatalogBatch>> {
        let conn = self.conn.lock().unwrap();
        let now = Self::now();
        let cutoff = now - (stale_threshold_hours * 60 * 60) as i64;

        let mut stmt = conn.prepare(
            "SELECT id, name, description, is_open, created_at, closed_at, last_activity_at
             FROM catalog_batches
             WHERE is_open = 1 AND created_at < ?1
             ORDER BY created_at ASC",
        )?;

        let batches = stmt
            .query_map(params![cutoff], |row| {
                Ok(CatalogBatch {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    is_open: row.get::<_, i32>(3)? != 0,
                    created_at: row.get(4)?,
                    closed_at: row.get(5)?,
                    last_activity_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(batches)
    }
}
