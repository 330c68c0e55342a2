use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::repo::{RepoError, RepoResult, Store, Unique};

pub mod schema;

mod articles;
mod comments;
mod users;

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

error_chain! {
    foreign_links {
        R2D2(r2d2::Error);
        Diesel(DieselError);
    }
}

/// Bounds every statement on a pooled connection.
#[derive(Debug)]
struct StatementTimeout(u128);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> ::std::result::Result<(), diesel::r2d2::Error> {
        diesel::sql_query(format!("SET statement_timeout = {}", self.0))
            .execute(conn)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Both checkout and each statement are bounded by `timeout`.
pub fn init_pool(database_url: &str, timeout: Duration) -> Result<Pool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .connection_timeout(timeout)
        .connection_customizer(Box::new(StatementTimeout(timeout.as_millis())))
        .build(manager)?;
    Ok(pool)
}

pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        PgStore { pool }
    }

    fn conn(&self) -> RepoResult<DbConnection> {
        self.pool.get().map_err(|e| {
            log::warn!("no database connection available: {}", e);
            RepoError::Timeout
        })
    }
}

impl Store for PgStore {
    fn ping(&self) -> RepoResult<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1")
            .execute(&mut *conn)
            .map(|_| ())
            .map_err(repo_err("database"))
    }
}

/// Maps a Diesel failure onto the repository taxonomy. Unique violations are
/// told apart by constraint name; a broken foreign key means the referenced
/// `entity` is gone.
pub(crate) fn repo_err(entity: &'static str) -> impl Fn(DieselError) -> RepoError {
    move |err| match err {
        DieselError::NotFound => RepoError::NotFound(entity),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => match info.constraint_name() {
            Some("users_email_key") => RepoError::Conflict(Unique::Email),
            Some("users_username_key") => RepoError::Conflict(Unique::Username),
            Some("articles_slug_key") => RepoError::Conflict(Unique::Slug),
            other => RepoError::Backend(format!("unique violation on {:?}: {}", other, info.message())),
        },
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => RepoError::NotFound(entity),
        other => RepoError::Backend(other.to_string()),
    }
}
