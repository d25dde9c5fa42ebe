//! Instructors, the courses they teach, and the instructor mutation input.

use super::{course::Course, metadata::Metadata};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Instructor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,

    /// Globally unique among instructors.
    pub email: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct InstructorDetail {
    #[serde(flatten)]
    pub instructor: Instructor,
    pub courses: Vec<Course>,
    pub metadata: Vec<Metadata>,
}

#[derive(Clone, Debug)]
pub struct InstructorInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// The complete set of courses taught. Replaces the stored set on edit.
    pub courses: Vec<Uuid>,
    pub metadata: String,
}
