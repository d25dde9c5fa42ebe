//! Decoding of `application/x-www-form-urlencoded` submissions into the
//! explicit input struct of each operation.
//!
//! Bodies are read as an ordered list of pairs so repeated fields such as
//! `courses` survive. Conversion reports every missing or malformed field of
//! one submission together.

use crate::{
    errors::AppError,
    models::{
        course::CourseInput,
        enrollment::EnrollmentInput,
        instructor::InstructorInput,
        score::Score,
        student::StudentInput,
        user::{LoginInput, RegisterInput, ResetPasswordInput},
    },
    validation::{FieldErrors, REQUIRED},
};
use axum::{
    Form,
    extract::{FromRequest, Request},
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `name`, in order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text of an optional field; absent reads as empty.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(str::trim).unwrap_or_default().to_string()
    }

    /// Trimmed text of a required field. Blank or absent is recorded.
    fn required(&self, errors: &mut FieldErrors, name: &str) -> String {
        let value = self.text(name);
        if value.is_empty() {
            errors.add(name, REQUIRED);
        }
        value
    }

    /// Password fields are taken verbatim, never trimmed.
    fn secret(&self, errors: &mut FieldErrors, name: &str) -> String {
        let value = self.get(name).unwrap_or_default().to_string();
        if value.is_empty() {
            errors.add(name, REQUIRED);
        }
        value
    }

    /// Submitted values for re-display. Password fields are left out.
    pub fn submitted(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &self.0 {
            if key.contains("password") {
                continue;
            }
            fields.entry(key.clone()).or_default().push(value.clone());
        }
        fields
    }

    /// Reject the submission with field errors, echoing its values back.
    pub fn reject(&self, errors: FieldErrors) -> AppError {
        AppError::validation(errors).with_submitted(self.submitted())
    }

    /// Turn an operation failure into a response that keeps the input.
    pub fn fail(&self, err: impl Into<AppError>) -> AppError {
        err.into().with_submitted(self.submitted())
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;
        Ok(Self(pairs))
    }
}

fn parse_date(errors: &mut FieldErrors, form: &FormData, name: &str) -> Option<NaiveDate> {
    let raw = form.required(errors, name);
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(name, "Enter a valid date in YYYY-MM-DD format.");
            None
        }
    }
}

fn invalid_choice(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}

impl TryFrom<&FormData> for StudentInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();
        let first_name = form.required(&mut errors, "first_name");
        let last_name = form.required(&mut errors, "last_name");
        let email = form.required(&mut errors, "email");
        let dob = parse_date(&mut errors, form, "dob");

        match dob {
            Some(dob) if errors.is_empty() => Ok(Self {
                first_name,
                last_name,
                email,
                dob,
                metadata: form.text("metadata"),
            }),
            _ => Err(errors),
        }
    }
}

impl TryFrom<&FormData> for CourseInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();
        let name = form.required(&mut errors, "name");
        let course_code = form.required(&mut errors, "course_code");
        errors.into_result()?;

        Ok(Self {
            name,
            course_code,
            description: form.get("description").map(str::to_string),
            metadata: form.text("metadata"),
        })
    }
}

impl TryFrom<&FormData> for InstructorInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();
        let first_name = form.required(&mut errors, "first_name");
        let last_name = form.required(&mut errors, "last_name");
        let email = form.required(&mut errors, "email");

        let mut courses = Vec::new();
        for raw in form.all("courses").map(str::trim).filter(|v| !v.is_empty()) {
            match Uuid::parse_str(raw) {
                Ok(id) => courses.push(id),
                Err(_) => errors.add("courses", invalid_choice(raw)),
            }
        }
        errors.into_result()?;

        Ok(Self {
            first_name,
            last_name,
            email,
            courses,
            metadata: form.text("metadata"),
        })
    }
}

impl TryFrom<&FormData> for EnrollmentInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();

        let raw_course = form.required(&mut errors, "course");
        let course_id = if raw_course.is_empty() {
            None
        } else {
            match Uuid::parse_str(&raw_course) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("course", invalid_choice(&raw_course));
                    None
                }
            }
        };

        let raw_score = form.text("score");
        let score = if raw_score.is_empty() {
            None
        } else {
            match Score::parse(&raw_score) {
                Ok(score) => Some(score),
                Err(message) => {
                    errors.add("score", message);
                    None
                }
            }
        };

        match course_id {
            Some(course_id) if errors.is_empty() => Ok(Self {
                course_id,
                score,
                metadata: form.text("metadata"),
            }),
            _ => Err(errors),
        }
    }
}

impl TryFrom<&FormData> for RegisterInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();
        let username = form.required(&mut errors, "username");
        let password = form.secret(&mut errors, "password");
        let confirm_password = form.secret(&mut errors, "confirm_password");
        errors.into_result()?;

        let email = form.text("email");
        Ok(Self {
            username,
            email: (!email.is_empty()).then_some(email),
            password,
            confirm_password,
        })
    }
}

impl TryFrom<&FormData> for LoginInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();
        let username = form.required(&mut errors, "username");
        let password = form.secret(&mut errors, "password");
        errors.into_result()?;

        let next = form.text("next");
        Ok(Self {
            username,
            password,
            next: (!next.is_empty()).then_some(next),
        })
    }
}

impl TryFrom<&FormData> for ResetPasswordInput {
    type Error = FieldErrors;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let mut errors = FieldErrors::new();
        let old_password = form.secret(&mut errors, "old_password");
        let new_password = form.secret(&mut errors, "new_password");
        errors.into_result()?;

        Ok(Self {
            old_password,
            new_password,
        })
    }
}
