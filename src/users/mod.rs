use rocket::serde::json::Json;
use rocket::{get, post, put, State};

use crate::auth::password::PasswordHasher;
use crate::auth::CurrentUser;
use crate::repo::{NewUser, RepoError, UserChanges};
use crate::state::Conduit;
use crate::types::{created, ApiError, ApiResult, Created, Validate};

pub mod models;
mod utils;

use self::models::*;

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("email or password", "is invalid")
}

fn hash_password(passwords: PasswordHasher, password: &str) -> Result<String, ApiError> {
    passwords
        .hash(password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

#[post("/users", format = "json", data = "<registration>")]
pub async fn register(conduit: &State<Conduit>, registration: Json<Registration>) -> Result<Created<UserResponse>, ApiError> {
    let details = registration.validate()?.into_inner().user;
    let passwords = conduit.passwords;

    let user = conduit
        .run(move |store| {
            let password_hash = hash_password(passwords, &details.password)?;
            let new_user = NewUser {
                username: details.username,
                email: details.email,
                password_hash,
            };
            Ok(store.insert_user(&new_user)?)
        })
        .await?;

    log::info!("registered user {} ({})", user.id, user.username);
    let token = conduit.issue_token(user.id, &user.email, &user.username)?;
    Ok(created(UserResponse { user: UserJson::new(user, token) }))
}

#[post("/users/login", format = "json", data = "<login>")]
pub async fn login(conduit: &State<Conduit>, login: Json<Login>) -> ApiResult<UserResponse> {
    let details = login.validate()?.into_inner().user;
    let passwords = conduit.passwords;

    let user = conduit
        .run(move |store| {
            let user = match store.user_by_email(&details.email) {
                Ok(user) => user,
                Err(RepoError::NotFound(_)) => return Err(invalid_credentials()),
                Err(e) => return Err(e.into()),
            };
            match passwords.verify(&details.password, &user.password_hash) {
                Ok(true) => Ok(user),
                Ok(false) => Err(invalid_credentials()),
                Err(e) => Err(ApiError::Internal(format!("stored hash for user {} is unreadable: {}", user.id, e))),
            }
        })
        .await?;

    let token = conduit.issue_token(user.id, &user.email, &user.username)?;
    Ok(Json(UserResponse { user: UserJson::new(user, token) }))
}

#[get("/user")]
pub async fn current(conduit: &State<Conduit>, user: CurrentUser) -> ApiResult<UserResponse> {
    let id = user?.id();
    let user = conduit.run(move |store| Ok(store.user_by_id(id)?)).await?;
    let token = conduit.issue_token(user.id, &user.email, &user.username)?;
    Ok(Json(UserResponse { user: UserJson::new(user, token) }))
}

#[put("/user", format = "json", data = "<update>")]
pub async fn update(conduit: &State<Conduit>, user: CurrentUser, update: Json<Update>) -> ApiResult<UserResponse> {
    let id = user?.id();
    let update = update.validate()?.into_inner().user;
    let passwords = conduit.passwords;

    let user = conduit
        .run(move |store| {
            let password_hash = match update.password {
                Some(ref password) => Some(hash_password(passwords, password)?),
                None => None,
            };
            let changes = UserChanges {
                username: update.username,
                email: update.email,
                password_hash,
                bio: update.bio,
                image: update.image,
            };
            Ok(store.update_user(id, &changes)?)
        })
        .await?;

    let token = conduit.issue_token(user.id, &user.email, &user.username)?;
    Ok(Json(UserResponse { user: UserJson::new(user, token) }))
}
