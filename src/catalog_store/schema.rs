//! SQLite schema definitions for the Spotify catalog database.
//!
//! This module defines the database schema matching the Spotify metadata dump.
//! Primary keys are integer rowids with unique text Spotify IDs for lookups.
//! Images are stored as URLs to Spotify CDN (lazy download on first access).

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Core Tables - Spotify Schema
// =============================================================================

/// Artists table - stores artist metadata
const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true), // Spotify base62 ID
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("followers_total", &SqlType::Integer, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_artists_id", "id")],
    unique_constraints: &[&["id"]],
};

/// Albums table - stores album metadata
const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true), // Spotify base62 ID
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_type", &SqlType::Text, non_null = true), // 'album', 'single', 'compilation'
        sqlite_column!("external_id_upc", &SqlType::Text),
        sqlite_column!("external_id_amgid", &SqlType::Text),
        sqlite_column!("label", &SqlType::Text, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("release_date", &SqlType::Text, non_null = true), // '2023-05-15', '2023-05', '2023'
        sqlite_column!("release_date_precision", &SqlType::Text, non_null = true), // 'day', 'month', 'year'
        sqlite_column!(
            "album_availability",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'missing'")
        ), // 'complete', 'partial', 'missing'
    ],
    indices: &[
        ("idx_albums_id", "id"),
        ("idx_albums_upc", "external_id_upc"),
        ("idx_albums_availability", "album_availability"),
    ],
    unique_constraints: &[&["id"]],
};

/// Tracks table - stores track metadata
const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true), // Spotify base62 ID
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("album_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("track_number", &SqlType::Integer, non_null = true),
        sqlite_column!("external_id_isrc", &SqlType::Text),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        sqlite_column!("disc_number", &SqlType::Integer, non_null = true),
        sqlite_column!("duration_ms", &SqlType::Integer, non_null = true),
        sqlite_column!("explicit", &SqlType::Integer, non_null = true),
        sqlite_column!("language", &SqlType::Text), // ISO 639-1 or 'zxx' for instrumental
        sqlite_column!("audio_uri", &SqlType::Text),
    ],
    indices: &[
        ("idx_tracks_id", "id"),
        ("idx_tracks_album", "album_rowid"),
        ("idx_tracks_isrc", "external_id_isrc"),
    ],
    unique_constraints: &[&["id"]],
};

// =============================================================================
// Junction Tables - Spotify Schema
// =============================================================================

/// Track <-> Artist relationship with role
const TRACK_ARTISTS_TABLE: Table = Table {
    name: "track_artists",
    columns: &[
        sqlite_column!("track_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("role", &SqlType::Integer), // 0=main, 1=featured, 2=composer, 3=remixer, 4=conductor, 5=orchestra
    ],
    indices: &[
        ("idx_track_artists_track", "track_rowid"),
        ("idx_track_artists_artist", "artist_rowid"),
    ],
    unique_constraints: &[],
};

/// Artist <-> Album relationship
const ARTIST_ALBUMS_TABLE: Table = Table {
    name: "artist_albums",
    columns: &[
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("album_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("is_appears_on", &SqlType::Integer, non_null = true),
        sqlite_column!("is_implicit_appears_on", &SqlType::Integer, non_null = true),
        sqlite_column!("index_in_album", &SqlType::Integer),
    ],
    indices: &[
        ("idx_artist_albums_artist", "artist_rowid"),
        ("idx_artist_albums_album", "album_rowid"),
    ],
    unique_constraints: &[],
};

/// Artist <-> Genre relationship
const ARTIST_GENRES_TABLE: Table = Table {
    name: "artist_genres",
    columns: &[
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_artist_genres_artist", "artist_rowid")],
    unique_constraints: &[],
};

// =============================================================================
// Image Tables - Spotify CDN URLs
// =============================================================================

/// Album images (URLs to Spotify CDN)
const ALBUM_IMAGES_TABLE: Table = Table {
    name: "album_images",
    columns: &[
        sqlite_column!("album_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("width", &SqlType::Integer, non_null = true),
        sqlite_column!("height", &SqlType::Integer, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_album_images_album", "album_rowid")],
    unique_constraints: &[],
};

/// Artist images (URLs to Spotify CDN)
const ARTIST_IMAGES_TABLE: Table = Table {
    name: "artist_images",
    columns: &[
        sqlite_column!("artist_rowid", &SqlType::Integer, non_null = true),
        sqlite_column!("width", &SqlType::Integer, non_null = true),
        sqlite_column!("height", &SqlType::Integer, non_null = true),
        sqlite_column!("url", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_artist_images_artist", "artist_rowid")],
    unique_constraints: &[],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

/// Spotify catalog schema.
///
/// This schema matches the Spotify metadata dump structure.
pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        TRACKS_TABLE,
        TRACK_ARTISTS_TABLE,
        ARTIST_ALBUMS_TABLE,
        ARTIST_GENRES_TABLE,
        ALBUM_IMAGES_TABLE,
        ARTIST_IMAGES_TABLE,
    ],
    migration: None,
}];
