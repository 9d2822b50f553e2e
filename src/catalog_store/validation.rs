//! Validation for catalog entities.
//!
//! Provides validation functions to ensure data integrity before
//! inserting or updating entities in the catalog store.

use super::models::{Album, Artist, Track};
use std::fmt;

/// Validation error types
#[derive(Debug)]
pub enum ValidationError {
    EmptyField {
        field: &'static str,
    },
    NonPositiveValue {
        field: &'static str,
        value: i32,
    },
    NegativeValue {
        field: &'static str,
        value: i64,
    },
    ForeignKeyViolation {
        entity_type: &'static str,
        id: String,
    },
    DuplicateId {
        entity_type: &'static str,
        id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::NonPositiveValue { field, value } => {
                write!(f, "Field '{}' must be positive, got {}", field, value)
            }
            ValidationError::NegativeValue { field, value } => {
                write!(f, "Field '{}' must be non-negative, got {}", field, value)
            }
            ValidationError::ForeignKeyViolation { entity_type, id } => {
                write!(f, "Referenced {} '{}' does not exist", entity_type, id)
            }
            ValidationError::DuplicateId { entity_type, id } => {
                write!(f, "{} with id '{}' already exists", entity_type, id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an artist entity
pub fn validate_artist(artist: &Artist) -> ValidationResult<()> {
    if artist.id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "id" });
    }
    if artist.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    Ok(())
}

/// Validate an album entity
pub fn validate_album(album: &Album) -> ValidationResult<()> {
    if album.id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "id" });
    }
    if album.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    Ok(())
}

/// Validate a track entity (without foreign key check)
pub fn validate_track(track: &Track) -> ValidationResult<()> {
    if track.id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "id" });
    }
    if track.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    if track.album_id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "album_id" });
    }
    if track.disc_number < 1 {
        return Err(ValidationError::NonPositiveValue {
            field: "disc_number",
            value: track.disc_number,
        });
    }
    if track.track_number < 1 {
        return Err(ValidationError::NonPositiveValue {
            field: "track_number",
            value: track.track_number,
        });
    }
    if track.duration_ms < 0 {
        return Err(ValidationError::NegativeValue {
            field: "duration_ms",
            value: track.duration_ms,
        });
    }
    Ok(())
}
