//! Student operations on [`RecordService`].

use super::{
    error::{ServiceError, ServiceResult, conflict_or_unexpected},
    metadata,
    record_service::{LIKE_ESCAPE, RecordService, search_pattern, value_taken},
};
use crate::{
    db,
    models::{
        metadata::MetadataOwner,
        student::{Student, StudentDetail, StudentInput},
    },
    validation::validate_student,
};
use sqlx::{QueryBuilder, SqliteConnection, sqlite::Sqlite};
use tracing::info;
use uuid::Uuid;

const DUPLICATE_EMAIL: &str = "A student with this email already exists.";

impl RecordService {
    /// List students, optionally filtered by a substring of first name,
    /// last name or email.
    pub async fn list_students(&self, q: Option<&str>) -> ServiceResult<Vec<StudentDetail>> {
        let mut conn = self.db.acquire().await?;

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, first_name, last_name, email, dob FROM students",
        );
        if let Some(pattern) = search_pattern(q) {
            builder.push(" WHERE first_name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(" OR last_name LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(LIKE_ESCAPE);
            builder.push(" OR email LIKE ");
            builder.push_bind(pattern);
            builder.push(LIKE_ESCAPE);
        }
        builder.push(" ORDER BY last_name, first_name, email");

        let students: Vec<Student> = builder.build_query_as().fetch_all(&mut *conn).await?;
        let ids: Vec<Uuid> = students.iter().map(|s| s.id).collect();
        let mut meta = metadata::load_for(&mut conn, MetadataOwner::Student, &ids).await?;

        Ok(students
            .into_iter()
            .map(|student| StudentDetail {
                metadata: meta.remove(&student.id).unwrap_or_default(),
                student,
            })
            .collect())
    }

    pub async fn get_student(&self, id: Uuid) -> ServiceResult<StudentDetail> {
        let mut conn = self.db.acquire().await?;
        let student = fetch_student(&mut conn, id).await?;
        let metadata = metadata::load_one(&mut conn, MetadataOwner::Student, id).await?;
        Ok(StudentDetail { student, metadata })
    }

    pub async fn create_student(&self, input: StudentInput) -> ServiceResult<StudentDetail> {
        let mut tx = db::begin_write(&self.db).await?;

        let mut errors = validate_student(&input);
        if value_taken(&mut tx, "students", "email", &input.email, None).await? {
            errors.add("email", DUPLICATE_EMAIL);
        }
        errors.into_result().map_err(ServiceError::Validation)?;

        let student = Student {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            dob: input.dob,
        };

        sqlx::query(
            "INSERT INTO students (id, first_name, last_name, email, dob) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(student.id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(student.dob)
        .execute(&mut *tx)
        .await
        .map_err(|err| conflict_or_unexpected(err, "email", DUPLICATE_EMAIL))?;

        let metadata =
            metadata::attach(&mut tx, MetadataOwner::Student, student.id, &input.metadata).await?;
        tx.commit().await?;

        info!(student_id = %student.id, "student created");
        Ok(StudentDetail { student, metadata })
    }

    /// Replace every field of a student, and its whole metadata set.
    pub async fn update_student(
        &self,
        id: Uuid,
        input: StudentInput,
    ) -> ServiceResult<StudentDetail> {
        let mut tx = db::begin_write(&self.db).await?;
        fetch_student(&mut tx, id).await?;

        let mut errors = validate_student(&input);
        if value_taken(&mut tx, "students", "email", &input.email, Some(id)).await? {
            errors.add("email", DUPLICATE_EMAIL);
        }
        errors.into_result().map_err(ServiceError::Validation)?;

        let student = Student {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            dob: input.dob,
        };

        sqlx::query(
            "UPDATE students SET first_name = ?, last_name = ?, email = ?, dob = ? WHERE id = ?",
        )
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.email)
        .bind(student.dob)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|err| conflict_or_unexpected(err, "email", DUPLICATE_EMAIL))?;

        let metadata =
            metadata::replace(&mut tx, MetadataOwner::Student, id, &input.metadata).await?;
        tx.commit().await?;

        info!(student_id = %id, "student updated");
        Ok(StudentDetail { student, metadata })
    }

    /// Delete a student. Its enrollments go with it.
    pub async fn delete_student(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("student", id));
        }

        info!(student_id = %id, "student deleted");
        Ok(())
    }
}

pub(crate) async fn fetch_student(conn: &mut SqliteConnection, id: Uuid) -> ServiceResult<Student> {
    sqlx::query_as::<_, Student>(
        "SELECT id, first_name, last_name, email, dob FROM students WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ServiceError::not_found("student", id))
}
