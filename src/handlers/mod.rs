pub mod auth_handlers;
pub mod course_handlers;
pub mod dashboard_handlers;
pub mod enrollment_handlers;
pub mod form;
pub mod health_handlers;
pub mod instructor_handlers;
pub mod record_path;
pub mod session;
pub mod student_handlers;

use serde::{Deserialize, Serialize};

/// `?q=` accepted by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Body of a list response: the echoed query and the matching records.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub query: Option<String>,
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> Listing<T> {
    pub fn new(query: Option<String>, items: Vec<T>) -> Self {
        Self {
            query,
            count: items.len(),
            items,
        }
    }
}
