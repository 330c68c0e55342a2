use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::users;
use super::{repo_err, PgStore};
use crate::repo::{NewUser, RepoResult, User, UserChanges, UserRepository};

#[derive(Debug, Queryable)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> User {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            bio: row.bio,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUserRow {
    username: String,
    email: String,
    password_hash: String,
}

/// `None` fields are left out of the UPDATE.
#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChangeset {
    username: Option<String>,
    email: Option<String>,
    password_hash: Option<String>,
    bio: Option<String>,
    image: Option<String>,
    updated_at: DateTime<Utc>,
}

impl UserRepository for PgStore {
    fn insert_user(&self, new: &NewUser) -> RepoResult<User> {
        let mut conn = self.conn()?;
        let row = NewUserRow {
            username: new.username.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
        };
        diesel::insert_into(users::table)
            .values(row)
            .get_result::<UserRow>(&mut *conn)
            .map(User::from)
            .map_err(repo_err("user"))
    }

    fn user_by_id(&self, id: i32) -> RepoResult<User> {
        let mut conn = self.conn()?;
        users::table
            .find(id)
            .first::<UserRow>(&mut *conn)
            .map(User::from)
            .map_err(repo_err("user"))
    }

    fn user_by_email(&self, email: &str) -> RepoResult<User> {
        let mut conn = self.conn()?;
        users::table
            .filter(users::email.eq(email))
            .first::<UserRow>(&mut *conn)
            .map(User::from)
            .map_err(repo_err("user"))
    }

    fn user_by_username(&self, username: &str) -> RepoResult<User> {
        let mut conn = self.conn()?;
        users::table
            .filter(users::username.eq(username))
            .first::<UserRow>(&mut *conn)
            .map(User::from)
            .map_err(repo_err("profile"))
    }

    fn update_user(&self, id: i32, changes: &UserChanges) -> RepoResult<User> {
        let mut conn = self.conn()?;
        let changeset = UserChangeset {
            username: changes.username.clone(),
            email: changes.email.clone(),
            password_hash: changes.password_hash.clone(),
            bio: changes.bio.clone(),
            image: changes.image.clone(),
            updated_at: Utc::now(),
        };
        diesel::update(users::table.find(id))
            .set(changeset)
            .get_result::<UserRow>(&mut *conn)
            .map(User::from)
            .map_err(repo_err("user"))
    }
}
