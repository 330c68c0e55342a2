use super::utils::*;
use crate::repo::User;
use crate::types::{Validate, ValidationError};

#[derive(Debug, Serialize)]
pub struct UserJson {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl UserJson {
    pub fn new(user: User, token: String) -> Self {
        UserJson {
            email: user.email,
            token,
            username: user.username,
            bio: user.bio,
            image: user.image,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserJson,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationDetails {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub user: RegistrationDetails,
}

impl Validate for Registration {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        collect(vec![
            validate_email(&self.user.email),
            validate_username(&self.user.username),
            validate_password(&self.user.password),
        ])?;
        Ok(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginDetails {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub user: LoginDetails,
}

impl Validate for Login {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::default();
        if self.user.email.trim().is_empty() {
            errors.merge(blank("email"));
        }
        if self.user.password.is_empty() {
            errors.merge(blank("password"));
        }
        errors.into_result()?;
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub user: UpdateUser,
}

impl Validate for Update {
    type Error = ValidationError;
    /// Only the supplied fields are checked.
    fn validate(self) -> Result<Self, ValidationError> {
        let mut checks = Vec::new();
        if let Some(ref email) = self.user.email {
            checks.push(validate_email(email));
        }
        if let Some(ref username) = self.user.username {
            checks.push(validate_username(username));
        }
        if let Some(ref password) = self.user.password {
            checks.push(validate_password(password));
        }
        collect(checks)?;
        Ok(self)
    }
}
