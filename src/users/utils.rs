use regex::Regex;

use crate::auth::password::MAX_INPUT_BYTES;
use crate::types::ValidationError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex = {
        let pattern = r"(?i)\A[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\z";
        Regex::new(pattern).unwrap()
    };
    static ref USERNAME_RE: Regex = Regex::new(r"\A[A-Za-z0-9_]+\z").unwrap();
}

pub fn blank(field: &str) -> ValidationError {
    ValidationError::from(field, "can't be blank")
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        Err(blank("email"))
    } else if !EMAIL_RE.is_match(email) {
        Err(ValidationError::from("email", "is invalid"))
    } else {
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if username.trim().is_empty() {
        Err(blank("username"))
    } else if length < USERNAME_MIN {
        Err(ValidationError::from(
            "username",
            format!("is too short (minimum is {} characters)", USERNAME_MIN),
        ))
    } else if length > USERNAME_MAX {
        Err(ValidationError::from(
            "username",
            format!("is too long (maximum is {} characters)", USERNAME_MAX),
        ))
    } else if !USERNAME_RE.is_match(username) {
        Err(ValidationError::from("username", "is invalid"))
    } else {
        Ok(())
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        Err(blank("password"))
    } else if password.chars().count() < PASSWORD_MIN {
        Err(ValidationError::from(
            "password",
            format!("is too short (minimum is {} characters)", PASSWORD_MIN),
        ))
    } else if password.len() > MAX_INPUT_BYTES {
        Err(ValidationError::from(
            "password",
            format!("is too long (maximum is {} bytes)", MAX_INPUT_BYTES),
        ))
    } else {
        Ok(())
    }
}

/// Runs every check and collects all failures instead of stopping at the first.
pub fn collect(checks: Vec<Result<(), ValidationError>>) -> Result<(), ValidationError> {
    let mut errors = ValidationError::default();
    for check in checks {
        if let Err(e) = check {
            errors.merge(e);
        }
    }
    errors.into_result()
}
