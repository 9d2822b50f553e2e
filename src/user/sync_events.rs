//! Sync event types for multi-device synchronization.
//!
//! This module defines the event types used in the append-only event log
//! for synchronizing user data across devices.

use serde::{Deserialize, Serialize};

use crate::user::permissions::Permission;
use crate::user::settings::UserSetting;
use crate::user::user_models::LikedContentType;

// =============================================================================
// Download Status Types (for sync events)
// =============================================================================

/// Download content type for sync events.
///
/// Simplified version of the full DownloadContentType for sync purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDownloadContentType {
    Album,
}

/// Download queue status for sync events.
///
/// Mirrors the QueueStatus enum from download_manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncQueueStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    RetryWaiting,
}

/// Download progress for sync events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDownloadProgress {
    pub total_children: i32,
    pub completed: i32,
    pub failed: i32,
    pub pending: i32,
    pub in_progress: i32,
}

/// All sync event types that can be recorded in the user event log.
///
/// Events are serialized using serde's adjacently tagged representation:
/// `{"type": "event_name", "payload": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum UserEvent {
    // Likes
    #[serde(rename = "content_liked")]
    ContentLiked {
        content_type: LikedContentType,
        content_id: String,
    },

    #[serde(rename = "content_unliked")]
    ContentUnliked {
        content_type: LikedContentType,
        content_id: String,
    },

    // Settings
    #[serde(rename = "setting_changed")]
    SettingChanged { setting: UserSetting },

    // Playlists
    #[serde(rename = "playlist_created")]
    PlaylistCreated { playlist_id: String, name: String },

    #[serde(rename = "playlist_renamed")]
    PlaylistRenamed { playlist_id: String, name: String },

    #[serde(rename = "playlist_deleted")]
    PlaylistDeleted { playlist_id: String },

    #[serde(rename = "playlist_tracks_updated")]
    PlaylistTracksUpdated {
        playlist_id: String,
        track_ids: Vec<String>,
    },

    // Permissions (triggered by CLI admin actions)
    #[serde(rename = "permission_granted")]
    PermissionGranted { permission: Permission },

    #[serde(rename = "permission_revoked")]
    PermissionRevoked { permission: Permission },

    #[serde(rename = "permissions_reset")]
    PermissionsReset { permissions: Vec<Permission> },

    // Download status events
    #[serde(rename = "download_request_created")]
    DownloadRequestCreated {
        request_id: String,
        content_id: String,
        content_type: SyncDownloadContentType,
        content_name: String,
        artist_name: Option<String>,
        queue_position: i32,
    },

    #[serde(rename = "download_status_changed")]
    DownloadStatusChanged {
        request_id: String,
        content_id: String,
        status: SyncQueueStatus,
        queue_position: Option<i32>,
        error_message: Option<String>,
    },

    #[serde(rename = "download_progress_updated")]
    DownloadProgressUpdated {
        request_id: String,
        content_id: String,
        progress: SyncDownloadProgress,
    },

    #[serde(rename = "download_completed")]
    DownloadCompleted {
        request_id: String,
        content_id: String,
    },
}

impl UserEvent {
    /// Get the event type string for database storage.
    pub fn event_type(&self) -> &'static str {
        match self {
            UserEvent::ContentLiked { .. } => "content_liked",
            UserEvent::ContentUnliked { .. } => "content_unliked",
            UserEvent::SettingChanged { .. } => "setting_changed",
            UserEvent::PlaylistCreated { .. } => "playlist_created",
            UserEvent::PlaylistRenamed { .. } => "playlist_renamed",
            UserEvent::PlaylistDeleted { .. } => "playlist_deleted",
            UserEvent::PlaylistTracksUpdated { .. } => "playlist_tracks_updated",
            UserEvent::PermissionGranted { .. } => "permission_granted",
            UserEvent::PermissionRevoked { .. } => "permission_revoked",
            UserEvent::PermissionsReset { .. } => "permissions_reset",
            UserEvent::DownloadRequestCreated { .. } => "download_request_created",
            UserEvent::DownloadStatusChanged { .. } => "download_status_changed",
            UserEvent::DownloadProgressUpdated { .. } => "download_progress_updated",
            UserEvent::DownloadCompleted { .. } => "download_completed",
        }
    }
}

/// An event stored in the database with its sequence number and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredEvent {
    pub seq: i64,
    #[serde(flatten)]
    pub event: UserEvent,
    pub server_timestamp: i64,
}
