//! Enrollment of one student in one course, with an optional score.

use super::{course::Course, metadata::Metadata, score::Score};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// The `(student_id, course_id)` pair is unique.
#[derive(Serialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub score: Option<Score>,
}

/// An enrollment with its course loaded alongside.
#[derive(Serialize, Clone, Debug)]
pub struct EnrollmentDetail {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub course: Course,
    pub metadata: Vec<Metadata>,
}

/// The student comes from the request path and never changes on edit.
#[derive(Clone, Debug)]
pub struct EnrollmentInput {
    pub course_id: Uuid,
    pub score: Option<Score>,
    pub metadata: String,
}
