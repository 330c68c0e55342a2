//! Storage-agnostic records and repository traits.
//!
//! Both backends (`db` for Postgres, `wide` for the wide-column table)
//! implement the same three repositories. Slug allocation lives here as
//! provided methods so both backends retry the same way when the store
//! reports a slug collision.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::slug;

/// How many fresh slug snapshots a create or rename takes before giving up.
pub const SLUG_ATTEMPTS: usize = 5;

pub const DEFAULT_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unique {
    Email,
    Username,
    Slug,
}

impl Unique {
    pub fn field(&self) -> &'static str {
        match self {
            Unique::Email => "email",
            Unique::Username => "username",
            Unique::Slug => "slug",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RepoError {
    NotFound(&'static str),
    Conflict(Unique),
    Backend(String),
    Timeout,
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RepoError::NotFound(entity) => write!(f, "{} not found", entity),
            RepoError::Conflict(unique) => write!(f, "{} already taken", unique.field()),
            RepoError::Backend(detail) => write!(f, "backend error: {}", detail),
            RepoError::Timeout => write!(f, "store call timed out"),
        }
    }
}

impl std::error::Error for RepoError {}

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

/// The public face of a user as embedded in articles and comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i32,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl From<&User> for Author {
    fn from(user: &User) -> Author {
        Author {
            id: user.id,
            username: user.username.clone(),
            bio: user.bio.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: i32,
    pub author_id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorites_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleView {
    pub article: Article,
    pub author: Author,
    pub favorited: bool,
}

/// What a client supplies for a new article; the slug is derived.
#[derive(Debug, Clone)]
pub struct ArticleDraft {
    pub author_id: i32,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub author_id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tag_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleFilter {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        ArticleFilter {
            tag: None,
            author: None,
            favorited: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i32,
    pub article_id: i32,
    pub author_id: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Author,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub article_id: i32,
    pub author_id: i32,
    pub body: String,
}

pub trait UserRepository {
    fn insert_user(&self, user: &NewUser) -> RepoResult<User>;
    fn user_by_id(&self, id: i32) -> RepoResult<User>;
    fn user_by_email(&self, email: &str) -> RepoResult<User>;
    fn user_by_username(&self, username: &str) -> RepoResult<User>;
    fn update_user(&self, id: i32, changes: &UserChanges) -> RepoResult<User>;
}

pub trait ArticleRepository {
    /// The base slug itself plus every `base-*` slug currently stored.
    fn similar_slugs(&self, base: &str) -> RepoResult<Vec<String>>;
    /// Must fail with `Conflict(Unique::Slug)` if the slug is taken.
    fn insert_article(&self, article: &NewArticle) -> RepoResult<Article>;
    fn article_by_slug(&self, slug: &str, viewer: Option<i32>) -> RepoResult<ArticleView>;
    fn list_articles(&self, filter: &ArticleFilter, viewer: Option<i32>) -> RepoResult<(Vec<ArticleView>, i64)>;
    /// Must fail with `Conflict(Unique::Slug)` if `changes.slug` is taken.
    fn apply_article_changes(&self, id: i32, changes: &ArticleChanges) -> RepoResult<Article>;
    fn delete_article(&self, id: i32) -> RepoResult<()>;
    /// Returns false when the favorite already existed.
    fn add_favorite(&self, user_id: i32, article_id: i32) -> RepoResult<bool>;
    /// Returns false when there was nothing to remove.
    fn remove_favorite(&self, user_id: i32, article_id: i32) -> RepoResult<bool>;
    fn tags(&self) -> RepoResult<Vec<String>>;

    fn create_article(&self, draft: &ArticleDraft) -> RepoResult<Article> {
        let base = slug::generate(&draft.title);
        for attempt in 1..=SLUG_ATTEMPTS {
            let existing = self.similar_slugs(&base)?;
            let article = NewArticle {
                author_id: draft.author_id,
                slug: slug::generate_unique(&draft.title, &existing),
                title: draft.title.clone(),
                description: draft.description.clone(),
                body: draft.body.clone(),
                tag_list: draft.tag_list.clone(),
                created_at: Utc::now(),
            };
            match self.insert_article(&article) {
                Err(RepoError::Conflict(Unique::Slug)) => {
                    log::warn!("slug {} taken concurrently (attempt {})", article.slug, attempt);
                }
                other => return other,
            }
        }
        Err(RepoError::Conflict(Unique::Slug))
    }

    /// Re-slugs only when the new title derives a different base than the
    /// current one; otherwise the stored slug is kept.
    fn update_article(&self, current: &Article, changes: ArticleChanges) -> RepoResult<Article> {
        let new_title = match changes.title {
            Some(ref title) if slug::generate(title) != slug::generate(&current.title) => title.clone(),
            _ => return self.apply_article_changes(current.id, &changes),
        };

        let base = slug::generate(&new_title);
        for attempt in 1..=SLUG_ATTEMPTS {
            let existing = self.similar_slugs(&base)?;
            let changes = ArticleChanges {
                slug: Some(slug::generate_unique(&new_title, &existing)),
                ..changes.clone()
            };
            match self.apply_article_changes(current.id, &changes) {
                Err(RepoError::Conflict(Unique::Slug)) => {
                    log::warn!("slug for article {} taken concurrently (attempt {})", current.id, attempt);
                }
                other => return other,
            }
        }
        Err(RepoError::Conflict(Unique::Slug))
    }
}

pub trait CommentRepository {
    fn insert_comment(&self, comment: &NewComment) -> RepoResult<CommentView>;
    fn comments_for_article(&self, article_id: i32) -> RepoResult<Vec<CommentView>>;
    /// Only finds comments that belong to `article_id`.
    fn comment(&self, article_id: i32, id: i32) -> RepoResult<Comment>;
    fn delete_comment(&self, article_id: i32, id: i32) -> RepoResult<()>;
}

/// Everything the HTTP layer needs from a backend.
pub trait Store: UserRepository + ArticleRepository + CommentRepository + Send + Sync {
    fn ping(&self) -> RepoResult<()>;
}
