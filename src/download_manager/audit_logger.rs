//! Audit logging for download operations.
//!
//! Provides a higher-level interface for logging download events,
//! building on the queue store's raw audit log functionality.

use std::sync::Arc;

use anyhow::Result;

use super::models::{
    AuditEventType, AuditLogEntry, DownloadError, QueueItem, RequestSource, WatchdogReport,
};
use super::queue_store::DownloadQueueStore;

/// Helper for logging audit events during download operations.
///
/// Provides convenient methods that automatically populate audit entries
/// from queue items and other context.
pub struct AuditLogger {
    queue_store: Arc<dyn DownloadQueueStore>,
}

impl AuditLogger {
    /// Create a new AuditLogger with the given queue store.
    pub fn new(queue_store: Arc<dyn DownloadQueueStore>) -> Self {
        Self { queue_store }
    }

    /// Log a new download request being created.
    ///
    /// Records the queue position at the time of creation.
    pub fn log_request_created(&self, queue_item: &QueueItem, queue_position: usize) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::RequestCreated)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(queue_item.request_source)
            .with_details(serde_json::json!({
                "queue_position": queue_position,
                "priority": queue_item.priority.as_i32(),
                "content_name": queue_item.content_name,
                "artist_name": queue_item.artist_name,
            }));

        let entry = if let Some(user_id) = &queue_item.requested_by_user_id {
            entry.with_user(user_id.clone())
        } else {
            entry
        };

        self.queue_store.log_audit_event(entry)
    }

    /// Log a download starting processing.
    pub fn log_download_started(&self, queue_item: &QueueItem) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::DownloadStarted)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(queue_item.request_source);

        let entry = if let Some(user_id) = &queue_item.requested_by_user_id {
            entry.with_user(user_id.clone())
        } else {
            entry
        };

        self.queue_store.log_audit_event(entry)
    }

    /// Log children being created for a parent album item.
    ///
    /// Records the breakdown of track audio and image children.
    pub fn log_children_created(
        &self,
        parent_item: &QueueItem,
        children_count: usize,
        track_count: usize,
        image_count: usize,
    ) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::ChildrenCreated)
            .with_queue_item(parent_item.id.clone())
            .with_content(parent_item.content_type, parent_item.content_id.clone())
            .with_source(parent_item.request_source)
            .with_details(serde_json::json!({
                "children_count": children_count,
                "track_count": track_count,
                "image_count": image_count,
            }));

        let entry = if let Some(user_id) = &parent_item.requested_by_user_id {
            entry.with_user(user_id.clone())
        } else {
            entry
        };

        self.queue_store.log_audit_event(entry)
    }

    /// Log a download completing successfully.
    ///
    /// For album completions, includes the track count.
    pub fn log_download_completed(
        &self,
        queue_item: &QueueItem,
        bytes_downloaded: u64,
        duration_ms: i64,
        tracks_downloaded: Option<usize>,
    ) -> Result<()> {
        let mut details = serde_json::json!({
            "bytes_downloaded": bytes_downloaded,
            "duration_ms": duration_ms,
        });

        if let Some(tracks) = tracks_downloaded {
            details["tracks_downloaded"] = serde_json::json!(tracks);
        }

        let entry = AuditLogEntry::new(AuditEventType::DownloadCompleted)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(queue_item.request_source)
            .with_details(details);

        let entry = if let Some(user_id) = &queue_item.requested_by_user_id {
            entry.with_user(user_id.clone())
        } else {
            entry
        };

        self.queue_store.log_audit_event(entry)
    }

    /// Log a download failing permanently (after max retries).
    pub fn log_download_failed(&self, queue_item: &QueueItem, error: &DownloadError) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::DownloadFailed)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(queue_item.request_source)
            .with_details(serde_json::json!({
                "error_type": error.error_type.as_str(),
                "error_message": error.message,
                "retry_count": queue_item.retry_count,
            }));

        let entry = if let Some(user_id) = &queue_item.requested_by_user_id {
            entry.with_user(user_id.clone())
        } else {
            entry
        };

        self.queue_store.log_audit_event(entry)
    }

    /// Log a retry being scheduled for a failed download.
    pub fn log_retry_scheduled(
        &self,
        queue_item: &QueueItem,
        next_retry_at: i64,
        backoff_secs: u64,
        error: &DownloadError,
    ) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::RetryScheduled)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(queue_item.request_source)
            .with_details(serde_json::json!({
                "retry_count": queue_item.retry_count,
                "next_retry_at": next_retry_at,
                "backoff_secs": backoff_secs,
                "error_type": error.error_type.as_str(),
                "error_message": error.message,
            }));

        let entry = if let Some(user_id) = &queue_item.requested_by_user_id {
            entry.with_user(user_id.clone())
        } else {
            entry
        };

        self.queue_store.log_audit_event(entry)
    }

    /// Log an admin manually retrying a failed item.
    pub fn log_admin_retry(&self, queue_item: &QueueItem, admin_user_id: &str) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::AdminRetry)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(queue_item.request_source)
            .with_user(admin_user_id.to_string())
            .with_details(serde_json::json!({
                "previous_retry_count": queue_item.retry_count,
                "previous_error_type": queue_item.error_type.as_ref().map(|e| e.as_str()),
                "previous_error_message": queue_item.error_message,
            }));

        self.queue_store.log_audit_event(entry)
    }

    /// Log the watchdog queuing an item for repair.
    pub fn log_watchdog_queued(&self, queue_item: &QueueItem, reason: &str) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::WatchdogQueued)
            .with_queue_item(queue_item.id.clone())
            .with_content(queue_item.content_type, queue_item.content_id.clone())
            .with_source(RequestSource::Watchdog)
            .with_details(serde_json::json!({
                "reason": reason,
            }));

        self.queue_store.log_audit_event(entry)
    }

    /// Log a watchdog scan starting.
    pub fn log_watchdog_scan_started(&self) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::WatchdogScanStarted)
            .with_source(RequestSource::Watchdog);

        self.queue_store.log_audit_event(entry)
    }

    /// Log a watchdog scan completing.
    pub fn log_watchdog_scan_completed(&self, report: &WatchdogReport) -> Result<()> {
        let entry = AuditLogEntry::new(AuditEventType::WatchdogScanCompleted)
            .with_source(RequestSource::Watchdog)
            .with_details(serde_json::json!({
                "missing_track_audio_count": report.missing_track_audio.len(),
                "missing_album_images_count": report.missing_album_images.len(),
                "missing_artist_images_count": report.missing_artist_images.len(),
                "total_missing": report.total_missing(),
                "items_queued": report.items_queued,
                "items_skipped": report.items_skipped,
                "scan_duration_ms": report.scan_duration_ms,
                "is_clean": report.is_clean(),
            }));

        self.queue_store.log_audit_event(entry)
    }
}
