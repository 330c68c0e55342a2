use std::collections::HashMap;

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use serde_json::json;

use crate::repo::{RepoError, Unique};
use crate::utils::try_respond;

/// Request bodies check themselves before any store access.
pub trait Validate
where
    Self: Sized,
{
    type Error;
    fn validate(self) -> Result<Self, Self::Error>;
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Unauthorized(ValidationError),
    Forbidden(ValidationError),
    NotFound(ValidationError),
    Conflict(ValidationError),
    Backend(String),
    Internal(String),
}

impl ApiError {
    pub fn unauthorized<K: Into<String>, V: Into<String>>(key: K, val: V) -> ApiError {
        ApiError::Unauthorized(ValidationError::from(key, val))
    }

    pub fn forbidden<V: Into<String>>(val: V) -> ApiError {
        ApiError::Forbidden(ValidationError::from("permission", val))
    }

    pub fn not_found<K: Into<String>>(entity: K) -> ApiError {
        ApiError::NotFound(ValidationError::from(entity, "not found"))
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::UnprocessableEntity,
            ApiError::Unauthorized(_) => Status::Unauthorized,
            ApiError::Forbidden(_) => Status::Forbidden,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Backend(_) | ApiError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> ApiError {
        ApiError::Validation(err)
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> ApiError {
        match err {
            RepoError::NotFound(entity) => ApiError::not_found(entity),
            RepoError::Conflict(Unique::Slug) => {
                ApiError::Conflict(ValidationError::from("slug", "has already been taken"))
            }
            RepoError::Conflict(unique) => {
                ApiError::Validation(ValidationError::from(unique.field(), "has already been taken"))
            }
            RepoError::Backend(detail) => ApiError::Backend(detail),
            RepoError::Timeout => ApiError::Backend("store call timed out".into()),
        }
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub type Created<T> = status::Custom<Json<T>>;

pub fn created<T>(body: T) -> Created<T> {
    status::Custom(Status::Created, Json(body))
}

#[derive(Debug, Serialize, Default, PartialEq)]
pub struct ValidationError(HashMap<String, Vec<String>>);

impl ValidationError {
    pub fn add_error<K: Into<String>, V: Into<String>>(&mut self, key: K, val: V) {
        let entry = self.0.entry(key.into()).or_default();
        entry.push(val.into());
    }

    pub fn from<K: Into<String>, V: Into<String>>(key: K, val: V) -> Self {
        let mut error = ValidationError::default();
        error.add_error(key, val);
        error
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: ValidationError) {
        for (key, errors) in other.0.into_iter() {
            let entry = self.0.entry(key).or_default();
            entry.extend(errors);
        }
    }

    pub fn empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let errors = match self {
            ApiError::Validation(e)
            | ApiError::Unauthorized(e)
            | ApiError::Forbidden(e)
            | ApiError::NotFound(e)
            | ApiError::Conflict(e) => e,
            ApiError::Backend(detail) => {
                log::error!("backend failure on {}: {}", req.uri(), detail);
                ValidationError::from("server", "temporarily unavailable, retry later")
            }
            ApiError::Internal(detail) => {
                log::error!("internal failure on {}: {}", req.uri(), detail);
                ValidationError::from("server", "internal error")
            }
        };
        try_respond(req, &json!({ "errors": errors }), status)
    }
}

impl<T> Validate for Json<T>
where
    T: Validate,
{
    type Error = <T as Validate>::Error;
    fn validate(self) -> Result<Self, Self::Error> {
        let inner = self.into_inner();
        let validated = inner.validate()?;
        Ok(Json(validated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_messages_per_field() {
        let mut errors = ValidationError::from("email", "can't be blank");
        let mut other = ValidationError::from("email", "is invalid");
        other.add_error("password", "is too short");
        errors.merge(other);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.messages("email").unwrap(),
            &["can't be blank".to_string(), "is invalid".to_string()]
        );
    }

    #[test]
    fn maps_repository_errors_to_statuses() {
        let cases = vec![
            (RepoError::NotFound("article"), Status::NotFound),
            (RepoError::Conflict(Unique::Email), Status::UnprocessableEntity),
            (RepoError::Conflict(Unique::Username), Status::UnprocessableEntity),
            (RepoError::Conflict(Unique::Slug), Status::Conflict),
            (RepoError::Backend("down".into()), Status::InternalServerError),
            (RepoError::Timeout, Status::InternalServerError),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
