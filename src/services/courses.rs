//! Course operations on [`RecordService`].

use super::{
    error::{ServiceError, ServiceResult, conflict_or_unexpected},
    metadata,
    record_service::{LIKE_ESCAPE, RecordService, search_pattern, value_taken},
};
use crate::{
    db,
    models::{
        course::{Course, CourseDetail, CourseInput},
        metadata::MetadataOwner,
    },
    validation::{normalize_course_code, validate_course},
};
use sqlx::{QueryBuilder, SqliteConnection, sqlite::Sqlite};
use tracing::info;
use uuid::Uuid;

const DUPLICATE_CODE: &str = "A course with this code already exists.";

/// Uppercase the code and collapse a blank description to absent.
fn normalize(input: CourseInput) -> CourseInput {
    CourseInput {
        course_code: normalize_course_code(&input.course_code),
        description: input.description.filter(|d| !d.trim().is_empty()),
        ..input
    }
}

impl RecordService {
    /// List courses, optionally filtered by a substring of name or code.
    pub async fn list_courses(&self, q: Option<&str>) -> ServiceResult<Vec<CourseDetail>> {
        let mut conn = self.db.acquire().await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, course_code, description FROM courses",
        );
        if let Some(pattern) = search_pattern(q) {
            builder.push(" WHERE name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(" OR course_code LIKE ");
            builder.push_bind(pattern);
            builder.push(LIKE_ESCAPE);
        }
        builder.push(" ORDER BY course_code");

        let courses: Vec<Course> = builder.build_query_as().fetch_all(&mut *conn).await?;
        let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();
        let mut meta = metadata::load_for(&mut conn, MetadataOwner::Course, &ids).await?;

        Ok(courses
            .into_iter()
            .map(|course| CourseDetail {
                metadata: meta.remove(&course.id).unwrap_or_default(),
                course,
            })
            .collect())
    }

    pub async fn get_course(&self, id: Uuid) -> ServiceResult<CourseDetail> {
        let mut conn = self.db.acquire().await?;
        let course = fetch_course(&mut conn, id).await?;
        let metadata = metadata::load_one(&mut conn, MetadataOwner::Course, id).await?;
        Ok(CourseDetail { course, metadata })
    }

    pub async fn create_course(&self, input: CourseInput) -> ServiceResult<CourseDetail> {
        let input = normalize(input);
        let mut tx = db::begin_write(&self.db).await?;

        let mut errors = validate_course(&input);
        if !input.course_code.is_empty()
            && value_taken(&mut tx, "courses", "course_code", &input.course_code, None).await?
        {
            errors.add("course_code", DUPLICATE_CODE);
        }
        errors.into_result().map_err(ServiceError::Validation)?;

        let course = Course {
            id: Uuid::new_v4(),
            name: input.name,
            course_code: input.course_code,
            description: input.description,
        };

        sqlx::query(
            "INSERT INTO courses (id, name, course_code, description) VALUES (?, ?, ?, ?)",
        )
        .bind(course.id)
        .bind(&course.name)
        .bind(&course.course_code)
        .bind(&course.description)
        .execute(&mut *tx)
        .await
        .map_err(|err| conflict_or_unexpected(err, "course_code", DUPLICATE_CODE))?;

        let metadata =
            metadata::attach(&mut tx, MetadataOwner::Course, course.id, &input.metadata).await?;
        tx.commit().await?;

        info!(course_id = %course.id, code = %course.course_code, "course created");
        Ok(CourseDetail { course, metadata })
    }

    pub async fn update_course(&self, id: Uuid, input: CourseInput) -> ServiceResult<CourseDetail> {
        let input = normalize(input);
        let mut tx = db::begin_write(&self.db).await?;
        fetch_course(&mut tx, id).await?;

        let mut errors = validate_course(&input);
        if !input.course_code.is_empty()
            && value_taken(&mut tx, "courses", "course_code", &input.course_code, Some(id))
                .await?
        {
            errors.add("course_code", DUPLICATE_CODE);
        }
        errors.into_result().map_err(ServiceError::Validation)?;

        let course = Course {
            id,
            name: input.name,
            course_code: input.course_code,
            description: input.description,
        };

        sqlx::query("UPDATE courses SET name = ?, course_code = ?, description = ? WHERE id = ?")
            .bind(&course.name)
            .bind(&course.course_code)
            .bind(&course.description)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| conflict_or_unexpected(err, "course_code", DUPLICATE_CODE))?;

        let metadata =
            metadata::replace(&mut tx, MetadataOwner::Course, id, &input.metadata).await?;
        tx.commit().await?;

        info!(course_id = %id, "course updated");
        Ok(CourseDetail { course, metadata })
    }

    /// Delete a course. Enrollments in it and instructor links go with it;
    /// the instructors themselves stay.
    pub async fn delete_course(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("course", id));
        }

        info!(course_id = %id, "course deleted");
        Ok(())
    }
}

pub(crate) async fn fetch_course(conn: &mut SqliteConnection, id: Uuid) -> ServiceResult<Course> {
    sqlx::query_as::<_, Course>("SELECT id, name, course_code, description FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("course", id))
}
