//! Repositories over a single wide-column table.
//!
//! Key layout:
//!
//! | entity        | partition key          | sort key          |
//! |---------------|------------------------|-------------------|
//! | user          | `USER#<id>`            | `PROFILE`         |
//! | email marker  | `EMAIL#<email>`        | `UNIQUE`          |
//! | name marker   | `USERNAME#<username>`  | `UNIQUE`          |
//! | article       | `ARTICLE#<id>`         | `METADATA`        |
//! | slug marker   | `SLUG#<slug>`          | `UNIQUE`          |
//! | favorite      | `FAVORITE#<article>`   | `USER#<user>`     |
//! | comment       | `ARTICLE#<article>`    | `COMMENT#<id>`    |
//!
//! Marker items are written with `NotExists` in the same transaction as the
//! entity they guard. Articles and comments carry a copy of their author's
//! public profile taken at write time; later profile edits do not reach
//! those copies.

use std::sync::atomic::{AtomicI32, Ordering};

use chrono::{DateTime, Utc};

use crate::repo::{Article, Author, Comment, RepoError, RepoResult, Store, User};

pub mod table;

mod articles;
mod comments;
mod users;

use self::table::{Key, Table, TableError};

pub const PROFILE: &str = "PROFILE";
pub const METADATA: &str = "METADATA";
pub const UNIQUE: &str = "UNIQUE";

pub fn user_key(id: i32) -> Key {
    Key::new(format!("USER#{}", id), PROFILE)
}

pub fn email_key(email: &str) -> Key {
    Key::new(format!("EMAIL#{}", email), UNIQUE)
}

pub fn username_key(username: &str) -> Key {
    Key::new(format!("USERNAME#{}", username), UNIQUE)
}

pub fn article_pk(id: i32) -> String {
    format!("ARTICLE#{}", id)
}

pub fn article_key(id: i32) -> Key {
    Key::new(article_pk(id), METADATA)
}

pub fn slug_key(slug: &str) -> Key {
    Key::new(format!("SLUG#{}", slug), UNIQUE)
}

pub fn favorite_pk(article_id: i32) -> String {
    format!("FAVORITE#{}", article_id)
}

pub fn favorite_key(article_id: i32, user_id: i32) -> Key {
    Key::new(favorite_pk(article_id), format!("USER#{}", user_id))
}

/// Zero padded so sort-key order matches insertion order.
pub fn comment_key(article_id: i32, id: i32) -> Key {
    Key::new(article_pk(article_id), format!("COMMENT#{:010}", id))
}

#[derive(Debug, Clone)]
pub struct ArticleItem {
    pub article: Article,
    pub author: Author,
}

#[derive(Debug, Clone)]
pub struct CommentItem {
    pub comment: Comment,
    pub author: Author,
}

#[derive(Debug, Clone)]
pub enum Item {
    Unique { owner: i32 },
    User(User),
    Article(ArticleItem),
    Favorite { created_at: DateTime<Utc> },
    Comment(CommentItem),
}

pub struct WideStore {
    table: Table<Item>,
    user_ids: AtomicI32,
    article_ids: AtomicI32,
    comment_ids: AtomicI32,
}

impl Default for WideStore {
    fn default() -> Self {
        WideStore {
            table: Table::new(),
            user_ids: AtomicI32::new(0),
            article_ids: AtomicI32::new(0),
            comment_ids: AtomicI32::new(0),
        }
    }
}

impl WideStore {
    pub fn new() -> Self {
        WideStore::default()
    }

    fn next_id(counter: &AtomicI32) -> i32 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn owner_of(&self, marker: &Key) -> Option<i32> {
        match self.table.get(marker) {
            Some(Item::Unique { owner }) => Some(owner),
            _ => None,
        }
    }

    fn load_user(&self, id: i32) -> RepoResult<User> {
        match self.table.get(&user_key(id)) {
            Some(Item::User(user)) => Ok(user),
            _ => Err(RepoError::NotFound("user")),
        }
    }

    fn load_article(&self, id: i32) -> RepoResult<ArticleItem> {
        match self.table.get(&article_key(id)) {
            Some(Item::Article(item)) => Ok(item),
            _ => Err(RepoError::NotFound("article")),
        }
    }

    fn has_favorited(&self, viewer: Option<i32>, article_id: i32) -> bool {
        viewer.map_or(false, |user_id| self.table.contains(&favorite_key(article_id, user_id)))
    }
}

impl Store for WideStore {
    fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}

impl From<TableError> for RepoError {
    fn from(err: TableError) -> RepoError {
        RepoError::Backend(err.to_string())
    }
}
