//! Courses and the input accepted by the course mutations.

use super::metadata::Metadata;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Course {
    pub id: Uuid,
    pub name: String,

    /// Uppercase letters and digits only, globally unique.
    pub course_code: String,

    pub description: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub metadata: Vec<Metadata>,
}

#[derive(Clone, Debug)]
pub struct CourseInput {
    pub name: String,
    /// As submitted; the service uppercases it before validating.
    pub course_code: String,
    pub description: Option<String>,
    pub metadata: String,
}
