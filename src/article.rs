use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::{delete, get, post, put, State};
use serde_json::{json, Value};

use crate::auth::{AuthUser, CurrentUser};
use crate::profile::Profile;
use crate::repo::{ArticleChanges, ArticleDraft, ArticleFilter, ArticleView, DEFAULT_LIMIT};
use crate::state::Conduit;
use crate::types::{created, ApiError, ApiResult, Created, Validate, ValidationError};
use crate::utils::{dedup_tags, serialize_date};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleJson {
    slug: String,
    title: String,
    description: String,
    body: String,
    tag_list: Vec<String>,
    #[serde(serialize_with = "serialize_date")]
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_date")]
    updated_at: DateTime<Utc>,
    favorited: bool,
    favorites_count: i64,
    author: Profile,
}

impl From<ArticleView> for ArticleJson {
    fn from(view: ArticleView) -> Self {
        let article = view.article;
        ArticleJson {
            slug: article.slug,
            title: article.title,
            description: article.description,
            body: article.body,
            tag_list: article.tag_list,
            created_at: article.created_at,
            updated_at: article.updated_at,
            favorited: view.favorited,
            favorites_count: article.favorites_count,
            author: view.author.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    article: ArticleJson,
}

impl From<ArticleView> for ArticleResponse {
    fn from(view: ArticleView) -> Self {
        ArticleResponse { article: view.into() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesResponse {
    articles: Vec<ArticleJson>,
    articles_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    tags: Vec<String>,
}

fn required(errors: &mut ValidationError, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add_error(field, "can't be blank");
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetails {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tag_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticle {
    article: ArticleDetails,
}

impl Validate for CreateArticle {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::default();
        required(&mut errors, "title", &self.article.title);
        required(&mut errors, "description", &self.article.description);
        required(&mut errors, "body", &self.article.body);
        errors.into_result()?;
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetails {
    title: Option<String>,
    description: Option<String>,
    body: Option<String>,
    tag_list: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticle {
    article: UpdateDetails,
}

impl Validate for UpdateArticle {
    type Error = ValidationError;
    fn validate(self) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::default();
        let fields = [
            ("title", &self.article.title),
            ("description", &self.article.description),
            ("body", &self.article.body),
        ];
        for (field, value) in fields.iter() {
            if let Some(value) = value {
                required(&mut errors, field, value);
            }
        }
        errors.into_result()?;
        Ok(self)
    }
}

/// Out-of-range paging values fall back to the defaults.
fn article_filter(
    tag: Option<String>,
    author: Option<String>,
    favorited: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ArticleFilter {
    ArticleFilter {
        tag,
        author,
        favorited,
        limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
        offset: offset.filter(|o| *o >= 0).unwrap_or(0),
    }
}

#[get("/articles?<tag>&<author>&<favorited>&<limit>&<offset>")]
pub async fn list(
    conduit: &State<Conduit>,
    viewer: Option<AuthUser>,
    tag: Option<String>,
    author: Option<String>,
    favorited: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<ArticlesResponse> {
    let viewer = viewer.map(|user| user.id());
    let filter = article_filter(tag, author, favorited, limit, offset);
    let (views, count) = conduit.run(move |store| Ok(store.list_articles(&filter, viewer)?)).await?;
    Ok(Json(ArticlesResponse {
        articles: views.into_iter().map(ArticleJson::from).collect(),
        articles_count: count,
    }))
}

#[post("/articles", format = "json", data = "<create>")]
pub async fn create(
    conduit: &State<Conduit>,
    user: CurrentUser,
    create: Json<CreateArticle>,
) -> Result<Created<ArticleResponse>, ApiError> {
    let author_id = user?.id();
    let details = create.validate()?.into_inner().article;
    let draft = ArticleDraft {
        author_id,
        title: details.title,
        description: details.description,
        body: details.body,
        tag_list: dedup_tags(details.tag_list),
    };

    let view = conduit
        .run(move |store| {
            let article = store.create_article(&draft)?;
            Ok(store.article_by_slug(&article.slug, Some(author_id))?)
        })
        .await?;
    log::info!("user {} created article {}", author_id, view.article.slug);
    Ok(created(view.into()))
}

#[get("/articles/<slug>")]
pub async fn get(conduit: &State<Conduit>, viewer: Option<AuthUser>, slug: String) -> ApiResult<ArticleResponse> {
    let viewer = viewer.map(|user| user.id());
    let view = conduit.run(move |store| Ok(store.article_by_slug(&slug, viewer)?)).await?;
    Ok(Json(view.into()))
}

#[put("/articles/<slug>", format = "json", data = "<update>")]
pub async fn update(
    conduit: &State<Conduit>,
    user: CurrentUser,
    slug: String,
    update: Json<UpdateArticle>,
) -> ApiResult<ArticleResponse> {
    let user_id = user?.id();
    let details = update.validate()?.into_inner().article;
    let changes = ArticleChanges {
        slug: None,
        title: details.title,
        description: details.description,
        body: details.body,
        tag_list: details.tag_list.map(dedup_tags),
    };

    let view = conduit
        .run(move |store| {
            let current = store.article_by_slug(&slug, Some(user_id))?;
            if current.article.author_id != user_id {
                return Err(ApiError::forbidden("You can only update your own articles"));
            }
            let updated = store.update_article(&current.article, changes)?;
            Ok(store.article_by_slug(&updated.slug, Some(user_id))?)
        })
        .await?;
    Ok(Json(view.into()))
}

#[delete("/articles/<slug>")]
pub async fn delete(conduit: &State<Conduit>, user: CurrentUser, slug: String) -> ApiResult<Value> {
    let user_id = user?.id();
    conduit
        .run(move |store| {
            let current = store.article_by_slug(&slug, None)?;
            if current.article.author_id != user_id {
                return Err(ApiError::forbidden("You can only delete your own articles"));
            }
            Ok(store.delete_article(current.article.id)?)
        })
        .await?;
    Ok(Json(json!({})))
}

#[post("/articles/<slug>/favorite")]
pub async fn favorite(conduit: &State<Conduit>, user: CurrentUser, slug: String) -> ApiResult<ArticleResponse> {
    let user_id = user?.id();
    let view = conduit
        .run(move |store| {
            let current = store.article_by_slug(&slug, Some(user_id))?;
            if !store.add_favorite(user_id, current.article.id)? {
                log::debug!("user {} already favorited {}", user_id, slug);
            }
            Ok(store.article_by_slug(&slug, Some(user_id))?)
        })
        .await?;
    Ok(Json(view.into()))
}

#[delete("/articles/<slug>/favorite")]
pub async fn unfavorite(conduit: &State<Conduit>, user: CurrentUser, slug: String) -> ApiResult<ArticleResponse> {
    let user_id = user?.id();
    let view = conduit
        .run(move |store| {
            let current = store.article_by_slug(&slug, Some(user_id))?;
            store.remove_favorite(user_id, current.article.id)?;
            Ok(store.article_by_slug(&slug, Some(user_id))?)
        })
        .await?;
    Ok(Json(view.into()))
}

#[get("/tags")]
pub async fn tags(conduit: &State<Conduit>) -> ApiResult<TagsResponse> {
    let tags = conduit.run(|store| Ok(store.tags()?)).await?;
    Ok(Json(TagsResponse { tags }))
}
