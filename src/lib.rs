//! Campus records administration service.
//!
//! Students, courses, instructors and enrollments with free-form key/value
//! metadata, served over HTTP behind cookie sessions and stored in SQLite.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
