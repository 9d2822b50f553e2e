//! Notification data models

use serde::{Deserialize, Serialize};

/// Notification type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    DownloadCompleted,
    // Future: DownloadFailed, NewRelease, SystemAnnouncement
}

/// A user notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub body: Option<String>,
    pub data: serde_json::Value,
    pub read_at: Option<i64>,
    pub created_at: i64,
}

/// Data payload for DownloadCompleted notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadCompletedData {
    pub album_id: String,
    pub album_name: String,
    pub artist_name: String,
    pub image_id: Option<String>,
    pub request_id: String,
}
