//! Field-level rules checked before every create/update commit.
//!
//! Rules never stop at the first violation: each check appends to a
//! [`FieldErrors`] collection so a submission reports every bad field at once.

use crate::{
    models::{
        course::CourseInput, instructor::InstructorInput, metadata::MetadataPair,
        student::StudentInput,
    },
    services::metadata::parse_pairs,
};
use regex::Regex;
use serde::Serialize;
use std::{fmt, sync::LazyLock};

pub const REQUIRED: &str = "This field is required.";

const NAME_MAX_LEN: usize = 100;
const COURSE_NAME_MAX_LEN: usize = 200;
const EMAIL_MAX_LEN: usize = 254;
const COURSE_CODE_MAX_LEN: usize = 20;
const METADATA_KEY_MAX_LEN: usize = 100;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

static COURSE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]+$").expect("course code pattern compiles"));

/// A single violation attributed to a submitted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a collection holding one violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True when at least one violation names `field`.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Uppercase a course code as submitted. Surrounding whitespace is dropped.
pub fn normalize_course_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_valid_course_code(code: &str) -> bool {
    COURSE_CODE_RE.is_match(code)
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this value has at most {max_len} characters."),
        );
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", REQUIRED);
    } else if email.chars().count() > EMAIL_MAX_LEN {
        errors.add(
            "email",
            format!("Ensure this value has at most {EMAIL_MAX_LEN} characters."),
        );
    } else if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
}

/// Metadata keys share the `metadata` form field for attribution.
pub fn check_metadata(errors: &mut FieldErrors, raw: &str) {
    let too_long = parse_pairs(raw)
        .iter()
        .any(|MetadataPair { key, .. }| key.chars().count() > METADATA_KEY_MAX_LEN);
    if too_long {
        errors.add(
            "metadata",
            format!("Metadata keys must have at most {METADATA_KEY_MAX_LEN} characters."),
        );
    }
}

pub fn validate_student(input: &StudentInput) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "first_name", &input.first_name, NAME_MAX_LEN);
    check_text(&mut errors, "last_name", &input.last_name, NAME_MAX_LEN);
    check_email(&mut errors, &input.email);
    check_metadata(&mut errors, &input.metadata);
    errors
}

/// Expects `input.course_code` already normalized.
pub fn validate_course(input: &CourseInput) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "name", &input.name, COURSE_NAME_MAX_LEN);

    let code = &input.course_code;
    if code.is_empty() {
        errors.add("course_code", REQUIRED);
    } else if code.chars().count() > COURSE_CODE_MAX_LEN {
        errors.add(
            "course_code",
            format!("Ensure this value has at most {COURSE_CODE_MAX_LEN} characters."),
        );
    } else if !is_valid_course_code(code) {
        errors.add(
            "course_code",
            "Course code must be capital letters and numbers only.",
        );
    }

    check_metadata(&mut errors, &input.metadata);
    errors
}

pub fn validate_instructor(input: &InstructorInput) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "first_name", &input.first_name, NAME_MAX_LEN);
    check_text(&mut errors, "last_name", &input.last_name, NAME_MAX_LEN);
    check_email(&mut errors, &input.email);
    check_metadata(&mut errors, &input.metadata);
    errors
}
