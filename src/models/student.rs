//! Students and the input accepted by the student mutations.

use super::metadata::Metadata;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,

    /// Globally unique among students, compared exactly as stored.
    pub email: String,

    /// Date of birth.
    pub dob: NaiveDate,
}

/// A student together with its attached metadata.
#[derive(Serialize, Clone, Debug)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub metadata: Vec<Metadata>,
}

/// Every mutable student field. Edits resubmit the whole set.
#[derive(Clone, Debug)]
pub struct StudentInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: NaiveDate,
    /// Raw `key:value, key:value` text.
    pub metadata: String,
}
