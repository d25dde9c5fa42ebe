//! Enrollment operations on [`RecordService`].
//!
//! Enrollments are always addressed through their student: an enrollment id
//! paired with the wrong student id is treated as absent.

use super::{
    courses::fetch_course,
    error::{ServiceError, ServiceResult, conflict_or_unexpected},
    metadata,
    record_service::{LIKE_ESCAPE, RecordService, search_pattern},
    students::fetch_student,
};
use crate::{
    db,
    models::{
        course::Course,
        enrollment::{Enrollment, EnrollmentDetail, EnrollmentInput},
        metadata::MetadataOwner,
        score::Score,
    },
    validation::{FieldErrors, check_metadata},
};
use sqlx::{FromRow, QueryBuilder, SqliteConnection, sqlite::Sqlite};
use tracing::info;
use uuid::Uuid;

const ALREADY_ENROLLED: &str = "This student is already enrolled in the selected course.";
const UNKNOWN_COURSE: &str = "Select a valid choice. That choice is not one of the available choices.";

const SELECT_WITH_COURSE: &str = "SELECT e.id, e.student_id, e.course_id, e.score, \
     c.name AS course_name, c.course_code, c.description AS course_description \
     FROM enrollments e JOIN courses c ON c.id = e.course_id";

/// An enrollment row joined with its course.
#[derive(FromRow)]
struct EnrollmentRow {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    score: Option<Score>,
    course_name: String,
    course_code: String,
    course_description: Option<String>,
}

impl EnrollmentRow {
    fn split(self) -> (Enrollment, Course) {
        (
            Enrollment {
                id: self.id,
                student_id: self.student_id,
                course_id: self.course_id,
                score: self.score,
            },
            Course {
                id: self.course_id,
                name: self.course_name,
                course_code: self.course_code,
                description: self.course_description,
            },
        )
    }
}

impl RecordService {
    /// List one student's enrollments, optionally filtered by a substring of
    /// the course code or course name.
    pub async fn list_enrollments(
        &self,
        student_id: Uuid,
        q: Option<&str>,
    ) -> ServiceResult<Vec<EnrollmentDetail>> {
        let mut conn = self.db.acquire().await?;
        fetch_student(&mut conn, student_id).await?;

        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_WITH_COURSE);
        builder.push(" WHERE e.student_id = ");
        builder.push_bind(student_id);
        if let Some(pattern) = search_pattern(q) {
            builder.push(" AND (c.course_code LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(" OR c.name LIKE ");
            builder.push_bind(pattern);
            builder.push(LIKE_ESCAPE);
            builder.push(")");
        }
        builder.push(" ORDER BY c.course_code");

        let rows: Vec<EnrollmentRow> = builder.build_query_as().fetch_all(&mut *conn).await?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut meta = metadata::load_for(&mut conn, MetadataOwner::Enrollment, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (enrollment, course) = row.split();
                EnrollmentDetail {
                    metadata: meta.remove(&enrollment.id).unwrap_or_default(),
                    enrollment,
                    course,
                }
            })
            .collect())
    }

    pub async fn get_enrollment(
        &self,
        student_id: Uuid,
        id: Uuid,
    ) -> ServiceResult<EnrollmentDetail> {
        let mut conn = self.db.acquire().await?;
        let (enrollment, course) = fetch_enrollment(&mut conn, student_id, id).await?;
        let metadata = metadata::load_one(&mut conn, MetadataOwner::Enrollment, id).await?;
        Ok(EnrollmentDetail {
            enrollment,
            course,
            metadata,
        })
    }

    pub async fn create_enrollment(
        &self,
        student_id: Uuid,
        input: EnrollmentInput,
    ) -> ServiceResult<EnrollmentDetail> {
        let mut tx = db::begin_write(&self.db).await?;
        fetch_student(&mut tx, student_id).await?;
        let course = check_enrollment(&mut tx, student_id, &input, None).await?;

        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            student_id,
            course_id: course.id,
            score: input.score,
        };

        sqlx::query("INSERT INTO enrollments (id, student_id, course_id, score) VALUES (?, ?, ?, ?)")
            .bind(enrollment.id)
            .bind(enrollment.student_id)
            .bind(enrollment.course_id)
            .bind(enrollment.score)
            .execute(&mut *tx)
            .await
            .map_err(|err| conflict_or_unexpected(err, "course", ALREADY_ENROLLED))?;

        let metadata = metadata::attach(
            &mut tx,
            MetadataOwner::Enrollment,
            enrollment.id,
            &input.metadata,
        )
        .await?;
        tx.commit().await?;

        info!(
            enrollment_id = %enrollment.id,
            student_id = %student_id,
            course = %course.course_code,
            "enrollment created"
        );
        Ok(EnrollmentDetail {
            enrollment,
            course,
            metadata,
        })
    }

    /// Change the course, score and metadata of an enrollment. The student
    /// never changes.
    pub async fn update_enrollment(
        &self,
        student_id: Uuid,
        id: Uuid,
        input: EnrollmentInput,
    ) -> ServiceResult<EnrollmentDetail> {
        let mut tx = db::begin_write(&self.db).await?;
        fetch_enrollment(&mut tx, student_id, id).await?;
        let course = check_enrollment(&mut tx, student_id, &input, Some(id)).await?;

        let enrollment = Enrollment {
            id,
            student_id,
            course_id: course.id,
            score: input.score,
        };

        sqlx::query("UPDATE enrollments SET course_id = ?, score = ? WHERE id = ?")
            .bind(enrollment.course_id)
            .bind(enrollment.score)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| conflict_or_unexpected(err, "course", ALREADY_ENROLLED))?;

        let metadata =
            metadata::replace(&mut tx, MetadataOwner::Enrollment, id, &input.metadata).await?;
        tx.commit().await?;

        info!(enrollment_id = %id, student_id = %student_id, "enrollment updated");
        Ok(EnrollmentDetail {
            enrollment,
            course,
            metadata,
        })
    }

    pub async fn delete_enrollment(&self, student_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = ? AND student_id = ?")
            .bind(id)
            .bind(student_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("enrollment", id));
        }

        info!(enrollment_id = %id, student_id = %student_id, "enrollment deleted");
        Ok(())
    }
}

async fn fetch_enrollment(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    id: Uuid,
) -> ServiceResult<(Enrollment, Course)> {
    let sql = format!("{SELECT_WITH_COURSE} WHERE e.id = ? AND e.student_id = ?");
    sqlx::query_as::<_, EnrollmentRow>(&sql)
        .bind(id)
        .bind(student_id)
        .fetch_optional(conn)
        .await?
        .map(EnrollmentRow::split)
        .ok_or_else(|| ServiceError::not_found("enrollment", id))
}

/// Resolve the selected course and check the `(student, course)` pair is free.
async fn check_enrollment(
    conn: &mut SqliteConnection,
    student_id: Uuid,
    input: &EnrollmentInput,
    editing: Option<Uuid>,
) -> ServiceResult<Course> {
    let mut errors = FieldErrors::new();
    check_metadata(&mut errors, &input.metadata);

    let course = match fetch_course(&mut *conn, input.course_id).await {
        Ok(course) => Some(course),
        Err(ServiceError::NotFound { .. }) => {
            errors.add("course", UNKNOWN_COURSE);
            None
        }
        Err(err) => return Err(err),
    };

    if course.is_some() {
        let taken: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM enrollments \
             WHERE student_id = ? AND course_id = ? AND (? IS NULL OR id != ?))",
        )
        .bind(student_id)
        .bind(input.course_id)
        .bind(editing)
        .bind(editing)
        .fetch_one(&mut *conn)
        .await?;
        if taken != 0 {
            errors.add("course", ALREADY_ENROLLED);
        }
    }

    errors.into_result().map_err(ServiceError::Validation)?;
    course.ok_or_else(|| ServiceError::not_found("course", input.course_id))
}
