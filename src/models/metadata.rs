//! Free-form key/value metadata shared by reference across every entity type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A `(key, value)` row. The same row may be linked to any number of
/// students, courses, instructors and enrollments at once.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    pub key: String,

    /// Metadata value as plain text.
    pub value: String,

    /// Set once when the pair is first created.
    pub created_at: DateTime<Utc>,

    /// Last change to the row. Reuse by another owner leaves it as is.
    pub updated_at: DateTime<Utc>,
}

/// A parsed, not yet persisted, `key:value` token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataPair {
    pub key: String,
    pub value: String,
}

/// Entity types that can carry metadata, with the link table backing each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataOwner {
    Student,
    Course,
    Instructor,
    Enrollment,
}

impl MetadataOwner {
    pub fn link_table(self) -> &'static str {
        match self {
            Self::Student => "student_metadata",
            Self::Course => "course_metadata",
            Self::Instructor => "instructor_metadata",
            Self::Enrollment => "enrollment_metadata",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            Self::Student => "student_id",
            Self::Course => "course_id",
            Self::Instructor => "instructor_id",
            Self::Enrollment => "enrollment_id",
        }
    }
}
