//! RecordService: create/read/update/delete for students, courses,
//! instructors and enrollments, backed by SQLite.
//!
//! Each mutation runs in one `BEGIN IMMEDIATE` transaction: validate, write
//! the entity, apply the metadata attachment, commit. Any failure drops the
//! transaction so nothing is left half-written. Per-entity operations live in the sibling
//! `students`, `courses`, `instructors` and `enrollments` modules.

use super::error::ServiceResult;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

/// Appended after each `LIKE ?` so escaped wildcards match literally.
pub(crate) const LIKE_ESCAPE: &str = r" ESCAPE '\'";

#[derive(Clone)]
pub struct RecordService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardCounts {
    pub total_students: i64,
    pub total_courses: i64,
    pub total_instructors: i64,
    pub total_enrollments: i64,
}

impl RecordService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self) -> ServiceResult<DashboardCounts> {
        let mut conn = self.db.acquire().await?;
        Ok(DashboardCounts {
            total_students: count(&mut conn, "students").await?,
            total_courses: count(&mut conn, "courses").await?,
            total_instructors: count(&mut conn, "instructors").await?,
            total_enrollments: count(&mut conn, "enrollments").await?,
        })
    }
}

async fn count(conn: &mut SqliteConnection, table: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(conn)
        .await
}

/// Build a case-insensitive substring pattern from a free-text query.
///
/// Blank queries mean "no filter". `%`, `_` and `\` are escaped.
pub(crate) fn search_pattern(q: Option<&str>) -> Option<String> {
    let q = q.map(str::trim).filter(|q| !q.is_empty())?;
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// True when another row of `table` already holds `value` in `column`.
///
/// `exclude` is the id of the row being edited.
pub(crate) async fn value_taken(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    value: &str,
    exclude: Option<Uuid>,
) -> sqlx::Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE {column} = ? AND (? IS NULL OR id != ?))"
    );
    let found: i64 = sqlx::query_scalar(&sql)
        .bind(value)
        .bind(exclude)
        .bind(exclude)
        .fetch_one(conn)
        .await?;
    Ok(found != 0)
}

pub(crate) async fn row_exists(
    conn: &mut SqliteConnection,
    table: &str,
    id: Uuid,
) -> sqlx::Result<bool> {
    let found: i64 =
        sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"))
            .bind(id)
            .fetch_one(conn)
            .await?;
    Ok(found != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_do_not_filter() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(search_pattern(Some(" ada ")).as_deref(), Some("%ada%"));
        assert_eq!(
            search_pattern(Some("50%_off\\")).as_deref(),
            Some(r"%50\%\_off\\%")
        );
    }
}
