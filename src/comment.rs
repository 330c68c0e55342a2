use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::{delete, get, post, State};
use serde_json::{json, Value};

use crate::auth::{CommentAuthor, CurrentCommenter};
use crate::profile::Profile;
use crate::repo::{CommentView as StoredComment, NewComment};
use crate::state::Conduit;
use crate::types::{created, ApiError, ApiResult, Created, Validate, ValidationError};
use crate::utils::serialize_date;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    id: i32,
    #[serde(serialize_with = "serialize_date")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_date")]
    updated_at: DateTime<Utc>,
    body: String,
    author: Profile,
}

impl From<StoredComment> for CommentView {
    fn from(stored: StoredComment) -> Self {
        let comment = stored.comment;
        CommentView {
            id: comment.id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            body: comment.body,
            author: stored.author.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentBody {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentContainer<T> {
    comment: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentsContainer<T> {
    comments: T,
}

impl Validate for CommentContainer<CommentBody> {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        if self.comment.body.trim().is_empty() {
            return Err(ValidationError::from("body", "can't be blank"));
        }
        Ok(self)
    }
}

#[post("/articles/<slug>/comments", format = "json", data = "<details>")]
pub async fn add(
    conduit: &State<Conduit>,
    user: CurrentCommenter,
    slug: String,
    details: Json<CommentContainer<CommentBody>>,
) -> Result<Created<CommentContainer<CommentView>>, ApiError> {
    let author_id = user?.id();
    let body = details.validate()?.into_inner().comment.body;

    let stored = conduit
        .run(move |store| {
            let article = store.article_by_slug(&slug, None)?;
            let comment = NewComment {
                article_id: article.article.id,
                author_id,
                body,
            };
            Ok(store.insert_comment(&comment)?)
        })
        .await?;
    Ok(created(CommentContainer { comment: stored.into() }))
}

#[get("/articles/<slug>/comments")]
pub async fn list(
    conduit: &State<Conduit>,
    _viewer: Option<CommentAuthor>,
    slug: String,
) -> ApiResult<CommentsContainer<Vec<CommentView>>> {
    let comments = conduit
        .run(move |store| {
            let article = store.article_by_slug(&slug, None)?;
            Ok(store.comments_for_article(article.article.id)?)
        })
        .await?;
    Ok(Json(CommentsContainer {
        comments: comments.into_iter().map(CommentView::from).collect(),
    }))
}

#[delete("/articles/<slug>/comments/<id>")]
pub async fn delete(conduit: &State<Conduit>, user: CurrentCommenter, slug: String, id: i32) -> ApiResult<Value> {
    let user_id = user?.id();
    conduit
        .run(move |store| {
            let article = store.article_by_slug(&slug, None)?;
            let comment = store.comment(article.article.id, id)?;
            if comment.author_id != user_id {
                return Err(ApiError::forbidden("You can only delete your own comments"));
            }
            Ok(store.delete_comment(article.article.id, id)?)
        })
        .await?;
    Ok(Json(json!({})))
}
