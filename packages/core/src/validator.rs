// ABOUTME: Field-level validation for entity create and update payloads
// ABOUTME: Checks presence, numeric ranges, and email formats before persistence

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::types::{
    CategoryCreateInput, CategoryUpdateInput, RatingInput, SolutionCreateInput,
    SolutionUpdateInput, TagCreateInput, TagUpdateInput, UserCreateInput, UserUpdateInput,
    UNCLASSIFIED_QUADRANT,
};

/// Largest radar quadrant index
pub const MAX_QUADRANT: i64 = 3;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Validation error naming the offending field and constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

fn check_email(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if !is_valid_email(value) {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a valid email address", value),
        ));
    }
}

fn check_quadrant(errors: &mut Vec<ValidationError>, value: i64) {
    if !(UNCLASSIFIED_QUADRANT..=MAX_QUADRANT).contains(&value) {
        errors.push(ValidationError::new(
            "radar_quadrant",
            format!(
                "must be between {} and {}",
                UNCLASSIFIED_QUADRANT, MAX_QUADRANT
            ),
        ));
    }
}

fn check_tag_names(errors: &mut Vec<ValidationError>, tags: &[String]) {
    if tags.iter().any(|tag| tag.trim().is_empty()) {
        errors.push(ValidationError::new("tags", "Tags cannot be empty"));
    }
}

pub fn validate_solution_create(data: &SolutionCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Solution name is required"));
    }
    if data.description.trim().is_empty() {
        errors.push(ValidationError::new("description", "Description is required"));
    }
    if data.department.trim().is_empty() {
        errors.push(ValidationError::new("department", "Department is required"));
    }
    if data.team.trim().is_empty() {
        errors.push(ValidationError::new("team", "Team is required"));
    }
    if let Some(ref email) = data.team_email {
        check_email(&mut errors, "team_email", email);
    }
    if let Some(ref email) = data.maintainer_email {
        check_email(&mut errors, "maintainer_email", email);
    }
    check_tag_names(&mut errors, &data.tags);

    errors
}

pub fn validate_solution_update(data: &SolutionUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Solution name cannot be empty"));
        }
    }
    if let Some(ref description) = data.description {
        if description.trim().is_empty() {
            errors.push(ValidationError::new(
                "description",
                "Description cannot be empty",
            ));
        }
    }
    if let Some(ref department) = data.department {
        if department.trim().is_empty() {
            errors.push(ValidationError::new("department", "Department cannot be empty"));
        }
    }
    if let Some(ref team) = data.team {
        if team.trim().is_empty() {
            errors.push(ValidationError::new("team", "Team cannot be empty"));
        }
    }
    if let Some(Some(ref email)) = data.team_email {
        check_email(&mut errors, "team_email", email);
    }
    if let Some(Some(ref email)) = data.maintainer_email {
        check_email(&mut errors, "maintainer_email", email);
    }
    if let Some(ref tags) = data.tags {
        check_tag_names(&mut errors, tags);
    }

    errors
}

pub fn validate_category_create(data: &CategoryCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Category name is required"));
    }
    check_quadrant(&mut errors, data.radar_quadrant);

    errors
}

pub fn validate_category_update(data: &CategoryUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Category name cannot be empty"));
        }
    }
    if let Some(quadrant) = data.radar_quadrant {
        check_quadrant(&mut errors, quadrant);
    }

    errors
}

pub fn validate_tag_create(data: &TagCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Tag name is required"));
    }

    errors
}

pub fn validate_tag_update(data: &TagUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Tag name cannot be empty"));
        }
    }

    errors
}

pub fn validate_rating(data: &RatingInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !(1..=5).contains(&data.score) {
        errors.push(ValidationError::new("score", "Score must be between 1 and 5"));
    }

    errors
}

pub fn validate_user_create(data: &UserCreateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if data.username.trim().is_empty() {
        errors.push(ValidationError::new("username", "Username is required"));
    }
    if data.full_name.trim().is_empty() {
        errors.push(ValidationError::new("full_name", "Full name is required"));
    }
    check_email(&mut errors, "email", &data.email);
    if data.password.is_empty() {
        errors.push(ValidationError::new("password", "Password is required"));
    }

    errors
}

pub fn validate_user_update(data: &UserUpdateInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(ref email) = data.email {
        check_email(&mut errors, "email", email);
    }
    if let Some(ref full_name) = data.full_name {
        if full_name.trim().is_empty() {
            errors.push(ValidationError::new("full_name", "Full name cannot be empty"));
        }
    }

    errors
}
