//! Core data models for the campus records service.
//!
//! Entities are plain records: they map to database tables via
//! `sqlx::FromRow`, serialize as JSON via `serde`, and hold no connection to
//! storage. Each entity module also defines the full input struct its
//! mutations take.

pub mod course;
pub mod enrollment;
pub mod instructor;
pub mod metadata;
pub mod score;
pub mod student;
pub mod user;
