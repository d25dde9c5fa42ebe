//! Business logic over the SQLite store.

pub mod auth_service;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod instructors;
pub mod metadata;
pub mod record_service;
pub mod students;
