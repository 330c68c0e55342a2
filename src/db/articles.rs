use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use diesel::dsl::count;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Text;

use super::schema::{articles, favorites, users};
use super::users::UserRow;
use super::{repo_err, PgStore};
use crate::repo::{
    Article, ArticleChanges, ArticleFilter, ArticleRepository, ArticleView, Author, NewArticle, RepoError,
    RepoResult, User,
};
use crate::slug;

#[derive(Debug, Queryable)]
pub struct ArticleRow {
    pub id: i32,
    pub author_id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ArticleRow {
    fn into_article(self, favorites_count: i64) -> Article {
        Article {
            id: self.id,
            author_id: self.author_id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            body: self.body,
            tag_list: self.tag_list,
            created_at: self.created_at,
            updated_at: self.updated_at,
            favorites_count,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = articles)]
struct NewArticleRow {
    author_id: i32,
    slug: String,
    title: String,
    description: String,
    body: String,
    tag_list: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(AsChangeset)]
#[diesel(table_name = articles)]
struct ArticleChangeset {
    slug: Option<String>,
    title: Option<String>,
    description: Option<String>,
    body: Option<String>,
    tag_list: Option<Vec<String>>,
    updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = favorites)]
struct NewFavoriteRow {
    user_id: i32,
    article_id: i32,
    created_at: DateTime<Utc>,
}

#[derive(QueryableByName)]
struct TagRow {
    #[diesel(sql_type = Text)]
    tag: String,
}

fn filtered(filter: &ArticleFilter) -> articles::BoxedQuery<'static, Pg> {
    let mut query = articles::table.into_boxed();
    if let Some(ref tag) = filter.tag {
        query = query.filter(articles::tag_list.contains(vec![tag.clone()]));
    }
    if let Some(ref author) = filter.author {
        let author_ids = users::table
            .filter(users::username.eq(author.clone()))
            .select(users::id);
        query = query.filter(articles::author_id.eq_any(author_ids));
    }
    if let Some(ref username) = filter.favorited {
        let favorited = favorites::table
            .inner_join(users::table)
            .filter(users::username.eq(username.clone()))
            .select(favorites::article_id);
        query = query.filter(articles::id.eq_any(favorited));
    }
    query
}

fn favorite_counts(conn: &mut PgConnection, ids: &[i32]) -> QueryResult<HashMap<i32, i64>> {
    let counts = favorites::table
        .filter(favorites::article_id.eq_any(ids))
        .group_by(favorites::article_id)
        .select((favorites::article_id, count(favorites::id)))
        .load::<(i32, i64)>(conn)?;
    Ok(counts.into_iter().collect())
}

/// Attaches authors, favorite counts and the viewer's favorited flag with
/// one query each, whatever the page size.
fn views(conn: &mut PgConnection, rows: Vec<ArticleRow>, viewer: Option<i32>) -> QueryResult<Vec<ArticleView>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let author_ids: Vec<i32> = rows.iter().map(|row| row.author_id).collect();

    let authors: HashMap<i32, Author> = users::table
        .filter(users::id.eq_any(&author_ids))
        .load::<UserRow>(conn)?
        .into_iter()
        .map(|row| {
            let user = User::from(row);
            (user.id, Author::from(&user))
        })
        .collect();
    let counts = favorite_counts(conn, &ids)?;
    let favorited: HashSet<i32> = match viewer {
        Some(user_id) => favorites::table
            .filter(favorites::user_id.eq(user_id))
            .filter(favorites::article_id.eq_any(&ids))
            .select(favorites::article_id)
            .load::<i32>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    rows.into_iter()
        .map(|row| {
            let author = authors.get(&row.author_id).cloned().ok_or(diesel::result::Error::NotFound)?;
            let count = counts.get(&row.id).copied().unwrap_or(0);
            let is_favorited = favorited.contains(&row.id);
            Ok(ArticleView {
                article: row.into_article(count),
                author,
                favorited: is_favorited,
            })
        })
        .collect()
}

impl ArticleRepository for PgStore {
    fn similar_slugs(&self, base: &str) -> RepoResult<Vec<String>> {
        let mut conn = self.conn()?;
        let slugs = articles::table
            .select(articles::slug)
            .filter(articles::slug.eq(base).or(articles::slug.like(format!("{}-%", base))))
            .load::<String>(&mut *conn)
            .map_err(repo_err("article"))?;
        Ok(slugs.into_iter().filter(|s| slug::is_variant_of(s, base)).collect())
    }

    fn insert_article(&self, new: &NewArticle) -> RepoResult<Article> {
        let mut conn = self.conn()?;
        let row = NewArticleRow {
            author_id: new.author_id,
            slug: new.slug.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            body: new.body.clone(),
            tag_list: new.tag_list.clone(),
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        diesel::insert_into(articles::table)
            .values(row)
            .get_result::<ArticleRow>(&mut *conn)
            .map(|row| row.into_article(0))
            .map_err(repo_err("user"))
    }

    fn article_by_slug(&self, slug: &str, viewer: Option<i32>) -> RepoResult<ArticleView> {
        let mut conn = self.conn()?;
        let row = articles::table
            .filter(articles::slug.eq(slug))
            .first::<ArticleRow>(&mut *conn)
            .map_err(repo_err("article"))?;
        views(&mut conn, vec![row], viewer)
            .map_err(repo_err("article"))?
            .pop()
            .ok_or(RepoError::NotFound("article"))
    }

    fn list_articles(&self, filter: &ArticleFilter, viewer: Option<i32>) -> RepoResult<(Vec<ArticleView>, i64)> {
        let mut conn = self.conn()?;
        let total = filtered(filter)
            .count()
            .get_result::<i64>(&mut *conn)
            .map_err(repo_err("article"))?;
        let rows = filtered(filter)
            .order((articles::created_at.desc(), articles::id.desc()))
            .limit(filter.limit)
            .offset(filter.offset)
            .load::<ArticleRow>(&mut *conn)
            .map_err(repo_err("article"))?;
        let page = views(&mut conn, rows, viewer).map_err(repo_err("article"))?;
        Ok((page, total))
    }

    fn apply_article_changes(&self, id: i32, changes: &ArticleChanges) -> RepoResult<Article> {
        let mut conn = self.conn()?;
        let changeset = ArticleChangeset {
            slug: changes.slug.clone(),
            title: changes.title.clone(),
            description: changes.description.clone(),
            body: changes.body.clone(),
            tag_list: changes.tag_list.clone(),
            updated_at: Utc::now(),
        };
        let row = diesel::update(articles::table.find(id))
            .set(changeset)
            .get_result::<ArticleRow>(&mut *conn)
            .map_err(repo_err("article"))?;
        let count = favorite_counts(&mut conn, &[row.id])
            .map_err(repo_err("article"))?
            .get(&row.id)
            .copied()
            .unwrap_or(0);
        Ok(row.into_article(count))
    }

    fn delete_article(&self, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        // Comments and favorites go with it through ON DELETE CASCADE.
        let deleted = diesel::delete(articles::table.find(id))
            .execute(&mut *conn)
            .map_err(repo_err("article"))?;
        if deleted == 0 {
            return Err(RepoError::NotFound("article"));
        }
        Ok(())
    }

    fn add_favorite(&self, user_id: i32, article_id: i32) -> RepoResult<bool> {
        let mut conn = self.conn()?;
        let inserted = diesel::insert_into(favorites::table)
            .values(NewFavoriteRow {
                user_id,
                article_id,
                created_at: Utc::now(),
            })
            .on_conflict((favorites::user_id, favorites::article_id))
            .do_nothing()
            .execute(&mut *conn)
            .map_err(repo_err("article"))?;
        Ok(inserted > 0)
    }

    fn remove_favorite(&self, user_id: i32, article_id: i32) -> RepoResult<bool> {
        let mut conn = self.conn()?;
        let removed = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::article_id.eq(article_id)),
        )
        .execute(&mut *conn)
        .map_err(repo_err("article"))?;
        Ok(removed > 0)
    }

    fn tags(&self) -> RepoResult<Vec<String>> {
        let mut conn = self.conn()?;
        let rows = diesel::sql_query("SELECT DISTINCT unnest(tag_list) AS tag FROM articles ORDER BY tag")
            .load::<TagRow>(&mut *conn)
            .map_err(repo_err("tag"))?;
        Ok(rows.into_iter().map(|row| row.tag).collect())
    }
}
