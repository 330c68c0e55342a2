use std::sync::Arc;
use std::time::Duration;

use rocket::tokio::task;
use rocket::tokio::time;

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenIssuer;
use crate::repo::{RepoError, Store};
use crate::types::ApiError;

/// Everything handlers need, built once in `main` and managed by Rocket.
#[derive(Clone)]
pub struct Conduit {
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub passwords: PasswordHasher,
    pub timeout: Duration,
}

impl Conduit {
    pub fn new(store: Arc<dyn Store>, tokens: TokenIssuer, passwords: PasswordHasher, timeout: Duration) -> Self {
        Conduit { store, tokens, passwords, timeout }
    }

    /// Runs blocking store work off the async workers, bounded by the store
    /// timeout. An elapsed timeout is reported as a backend error, but the
    /// detached work is not cancelled and may still commit, so retrying a
    /// write after a timeout is not idempotent. On Postgres the pool's
    /// `statement_timeout` aborts the statement server-side at the same bound.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<T, ApiError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let work = task::spawn_blocking(move || f(store.as_ref()));
        match time::timeout(self.timeout, work).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ApiError::Internal(format!("store task failed: {}", join))),
            Err(_) => {
                log::warn!("store call exceeded {:?}; its work is left running", self.timeout);
                Err(RepoError::Timeout.into())
            }
        }
    }

    pub fn issue_token(&self, user_id: i32, email: &str, username: &str) -> Result<String, ApiError> {
        self.tokens
            .issue(user_id, email, Some(username))
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}
