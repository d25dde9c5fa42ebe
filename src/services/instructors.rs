//! Instructor operations on [`RecordService`].
//!
//! The set of courses an instructor teaches is replaced wholesale on every
//! create/edit, the same way metadata is.

use super::{
    error::{ServiceError, ServiceResult, conflict_or_unexpected},
    metadata,
    record_service::{LIKE_ESCAPE, RecordService, row_exists, search_pattern, value_taken},
};
use crate::{
    db,
    models::{
        course::Course,
        instructor::{Instructor, InstructorDetail, InstructorInput},
        metadata::MetadataOwner,
    },
    validation::validate_instructor,
};
use sqlx::{FromRow, QueryBuilder, SqliteConnection, sqlite::Sqlite};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

const DUPLICATE_EMAIL: &str = "An instructor with this email already exists.";

impl RecordService {
    /// List instructors, optionally filtered by a substring of first name,
    /// last name, email or the name of any course they teach.
    pub async fn list_instructors(&self, q: Option<&str>) -> ServiceResult<Vec<InstructorDetail>> {
        let mut conn = self.db.acquire().await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT i.id, i.first_name, i.last_name, i.email FROM instructors i",
        );
        if let Some(pattern) = search_pattern(q) {
            builder.push(" WHERE i.first_name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(" OR i.last_name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(" OR i.email LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(
                " OR EXISTS (SELECT 1 FROM instructor_courses ic \
                 JOIN courses c ON c.id = ic.course_id \
                 WHERE ic.instructor_id = i.id AND c.name LIKE ",
            );
            builder.push_bind(pattern);
            builder.push(LIKE_ESCAPE);
            builder.push(")");
        }
        builder.push(" ORDER BY i.last_name, i.first_name, i.email");

        let instructors: Vec<Instructor> = builder.build_query_as().fetch_all(&mut *conn).await?;
        let ids: Vec<Uuid> = instructors.iter().map(|i| i.id).collect();
        let mut courses = load_courses(&mut conn, &ids).await?;
        let mut meta = metadata::load_for(&mut conn, MetadataOwner::Instructor, &ids).await?;

        Ok(instructors
            .into_iter()
            .map(|instructor| InstructorDetail {
                courses: courses.remove(&instructor.id).unwrap_or_default(),
                metadata: meta.remove(&instructor.id).unwrap_or_default(),
                instructor,
            })
            .collect())
    }

    pub async fn get_instructor(&self, id: Uuid) -> ServiceResult<InstructorDetail> {
        let mut conn = self.db.acquire().await?;
        let instructor = fetch_instructor(&mut conn, id).await?;
        load_detail(&mut conn, instructor).await
    }

    pub async fn create_instructor(
        &self,
        input: InstructorInput,
    ) -> ServiceResult<InstructorDetail> {
        let mut tx = db::begin_write(&self.db).await?;
        let courses = check_instructor(&mut tx, &input, None).await?;

        let instructor = Instructor {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
        };

        sqlx::query(
            "INSERT INTO instructors (id, first_name, last_name, email) VALUES (?, ?, ?, ?)",
        )
        .bind(instructor.id)
        .bind(&instructor.first_name)
        .bind(&instructor.last_name)
        .bind(&instructor.email)
        .execute(&mut *tx)
        .await
        .map_err(|err| conflict_or_unexpected(err, "email", DUPLICATE_EMAIL))?;

        set_courses(&mut tx, instructor.id, &courses).await?;
        metadata::attach(
            &mut tx,
            MetadataOwner::Instructor,
            instructor.id,
            &input.metadata,
        )
        .await?;
        let detail = load_detail(&mut tx, instructor).await?;
        tx.commit().await?;

        info!(instructor_id = %detail.instructor.id, courses = detail.courses.len(), "instructor created");
        Ok(detail)
    }

    pub async fn update_instructor(
        &self,
        id: Uuid,
        input: InstructorInput,
    ) -> ServiceResult<InstructorDetail> {
        let mut tx = db::begin_write(&self.db).await?;
        fetch_instructor(&mut tx, id).await?;
        let courses = check_instructor(&mut tx, &input, Some(id)).await?;

        let instructor = Instructor {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
        };

        sqlx::query("UPDATE instructors SET first_name = ?, last_name = ?, email = ? WHERE id = ?")
            .bind(&instructor.first_name)
            .bind(&instructor.last_name)
            .bind(&instructor.email)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| conflict_or_unexpected(err, "email", DUPLICATE_EMAIL))?;

        set_courses(&mut tx, id, &courses).await?;
        metadata::replace(&mut tx, MetadataOwner::Instructor, id, &input.metadata).await?;
        let detail = load_detail(&mut tx, instructor).await?;
        tx.commit().await?;

        info!(instructor_id = %id, "instructor updated");
        Ok(detail)
    }

    /// Delete an instructor. The courses they taught are untouched.
    pub async fn delete_instructor(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM instructors WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("instructor", id));
        }

        info!(instructor_id = %id, "instructor deleted");
        Ok(())
    }
}

/// Run every instructor rule and return the de-duplicated course set.
async fn check_instructor(
    conn: &mut SqliteConnection,
    input: &InstructorInput,
    editing: Option<Uuid>,
) -> ServiceResult<Vec<Uuid>> {
    let mut errors = validate_instructor(input);
    if value_taken(&mut *conn, "instructors", "email", &input.email, editing).await? {
        errors.add("email", DUPLICATE_EMAIL);
    }

    let mut courses: Vec<Uuid> = Vec::with_capacity(input.courses.len());
    for course_id in &input.courses {
        if !courses.contains(course_id) {
            courses.push(*course_id);
        }
    }
    for course_id in &courses {
        if !row_exists(&mut *conn, "courses", *course_id).await? {
            errors.add(
                "courses",
                format!("Select a valid choice. {course_id} is not one of the available choices."),
            );
        }
    }

    errors.into_result().map_err(ServiceError::Validation)?;
    Ok(courses)
}

async fn fetch_instructor(conn: &mut SqliteConnection, id: Uuid) -> ServiceResult<Instructor> {
    sqlx::query_as::<_, Instructor>(
        "SELECT id, first_name, last_name, email FROM instructors WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ServiceError::not_found("instructor", id))
}

async fn load_detail(
    conn: &mut SqliteConnection,
    instructor: Instructor,
) -> ServiceResult<InstructorDetail> {
    let courses = load_courses(&mut *conn, &[instructor.id])
        .await?
        .remove(&instructor.id)
        .unwrap_or_default();
    let metadata = metadata::load_one(conn, MetadataOwner::Instructor, instructor.id).await?;
    Ok(InstructorDetail {
        instructor,
        courses,
        metadata,
    })
}

async fn set_courses(
    conn: &mut SqliteConnection,
    instructor_id: Uuid,
    courses: &[Uuid],
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM instructor_courses WHERE instructor_id = ?")
        .bind(instructor_id)
        .execute(&mut *conn)
        .await?;

    for course_id in courses {
        sqlx::query("INSERT INTO instructor_courses (instructor_id, course_id) VALUES (?, ?)")
            .bind(instructor_id)
            .bind(course_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[derive(FromRow)]
struct TaughtCourse {
    instructor_id: Uuid,
    #[sqlx(flatten)]
    course: Course,
}

/// Courses taught by each of `instructor_ids`, in one query.
async fn load_courses(
    conn: &mut SqliteConnection,
    instructor_ids: &[Uuid],
) -> sqlx::Result<HashMap<Uuid, Vec<Course>>> {
    let mut by_instructor: HashMap<Uuid, Vec<Course>> = HashMap::new();
    if instructor_ids.is_empty() {
        return Ok(by_instructor);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT ic.instructor_id, c.id, c.name, c.course_code, c.description \
         FROM instructor_courses ic JOIN courses c ON c.id = ic.course_id \
         WHERE ic.instructor_id IN (",
    );
    let mut ids = builder.separated(", ");
    for id in instructor_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY c.course_code");

    let rows: Vec<TaughtCourse> = builder.build_query_as().fetch_all(&mut *conn).await?;
    for row in rows {
        by_instructor
            .entry(row.instructor_id)
            .or_default()
            .push(row.course);
    }
    Ok(by_instructor)
}
