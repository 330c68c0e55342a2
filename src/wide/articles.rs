use std::collections::{BTreeSet, HashSet};

use chrono::Utc;

use super::table::{Condition, TableError, Update, Write};
use super::{
    article_key, article_pk, favorite_key, favorite_pk, slug_key, ArticleItem, Item, WideStore, METADATA,
};
use crate::repo::{
    Article, ArticleChanges, ArticleFilter, ArticleRepository, ArticleView, Author, NewArticle, RepoError,
    RepoResult, Unique, UserRepository,
};
use crate::slug;

impl WideStore {
    fn view(&self, item: ArticleItem, viewer: Option<i32>) -> ArticleView {
        let favorited = self.has_favorited(viewer, item.article.id);
        ArticleView {
            article: item.article,
            author: item.author,
            favorited,
        }
    }

    fn all_articles(&self) -> Vec<ArticleItem> {
        self.table
            .scan(|key, _| key.sk == METADATA && key.pk.starts_with("ARTICLE#"))
            .into_iter()
            .filter_map(|(_, item)| match item {
                Item::Article(article) => Some(article),
                _ => None,
            })
            .collect()
    }

    /// Ids of every article `user_id` has favorited.
    fn favorited_by(&self, user_id: i32) -> HashSet<i32> {
        let sk = format!("USER#{}", user_id);
        self.table
            .scan(|key, _| key.sk == sk && key.pk.starts_with("FAVORITE#"))
            .into_iter()
            .filter_map(|(key, _)| key.pk["FAVORITE#".len()..].parse().ok())
            .collect()
    }

    /// Adjusts the stored counter in place; never read-modify-write from here.
    fn favorite_delta(delta: i64) -> Update<Item> {
        Box::new(move |item: &mut Item| {
            if let Item::Article(stored) = item {
                stored.article.favorites_count = (stored.article.favorites_count + delta).max(0);
            }
        })
    }
}

impl ArticleRepository for WideStore {
    fn similar_slugs(&self, base: &str) -> RepoResult<Vec<String>> {
        let slugs = self
            .table
            .query_prefix(&format!("SLUG#{}", base))
            .into_iter()
            .map(|(key, _)| key.pk["SLUG#".len()..].to_string())
            .filter(|candidate| slug::is_variant_of(candidate, base))
            .collect();
        Ok(slugs)
    }

    fn insert_article(&self, new: &NewArticle) -> RepoResult<Article> {
        let author = Author::from(&self.load_user(new.author_id)?);
        let id = WideStore::next_id(&self.article_ids);
        let article = Article {
            id,
            author_id: new.author_id,
            slug: new.slug.clone(),
            title: new.title.clone(),
            description: new.description.clone(),
            body: new.body.clone(),
            tag_list: new.tag_list.clone(),
            created_at: new.created_at,
            updated_at: new.created_at,
            favorites_count: 0,
        };
        let writes = vec![
            Write::Put { key: slug_key(&article.slug), item: Item::Unique { owner: id }, condition: Condition::NotExists },
            Write::Put {
                key: article_key(id),
                item: Item::Article(ArticleItem { article: article.clone(), author }),
                condition: Condition::NotExists,
            },
        ];
        match self.table.transact(writes) {
            Ok(()) => Ok(article),
            Err(TableError::ConditionFailed(0)) => Err(RepoError::Conflict(Unique::Slug)),
            Err(e) => Err(e.into()),
        }
    }

    fn article_by_slug(&self, slug: &str, viewer: Option<i32>) -> RepoResult<ArticleView> {
        let id = self.owner_of(&slug_key(slug)).ok_or(RepoError::NotFound("article"))?;
        let item = self.load_article(id)?;
        Ok(self.view(item, viewer))
    }

    fn list_articles(&self, filter: &ArticleFilter, viewer: Option<i32>) -> RepoResult<(Vec<ArticleView>, i64)> {
        let favorited = match filter.favorited {
            Some(ref username) => match self.user_by_username(username) {
                Ok(user) => Some(self.favorited_by(user.id)),
                Err(RepoError::NotFound(_)) => return Ok((Vec::new(), 0)),
                Err(e) => return Err(e),
            },
            None => None,
        };

        let mut matching: Vec<ArticleItem> = self
            .all_articles()
            .into_iter()
            .filter(|item| filter.tag.as_ref().map_or(true, |tag| item.article.tag_list.contains(tag)))
            .filter(|item| filter.author.as_ref().map_or(true, |name| item.author.username == *name))
            .filter(|item| favorited.as_ref().map_or(true, |ids| ids.contains(&item.article.id)))
            .collect();
        matching.sort_by(|a, b| {
            b.article
                .created_at
                .cmp(&a.article.created_at)
                .then(b.article.id.cmp(&a.article.id))
        });

        let count = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .map(|item| self.view(item, viewer))
            .collect();
        Ok((page, count))
    }

    fn apply_article_changes(&self, id: i32, changes: &ArticleChanges) -> RepoResult<Article> {
        let current = self.load_article(id)?;
        let mut writes = Vec::new();
        let mut renamed = false;

        if let Some(new_slug) = changes.slug.as_ref().filter(|s| **s != current.article.slug) {
            writes.push(Write::Put { key: slug_key(new_slug), item: Item::Unique { owner: id }, condition: Condition::NotExists });
            writes.push(Write::Delete { key: slug_key(&current.article.slug), condition: Condition::Always });
            renamed = true;
        }

        let changes = changes.clone();
        let now = Utc::now();
        writes.push(Write::Update {
            key: article_key(id),
            apply: Box::new(move |item: &mut Item| {
                if let Item::Article(stored) = item {
                    let article = &mut stored.article;
                    if let Some(slug) = changes.slug {
                        article.slug = slug;
                    }
                    if let Some(title) = changes.title {
                        article.title = title;
                    }
                    if let Some(description) = changes.description {
                        article.description = description;
                    }
                    if let Some(body) = changes.body {
                        article.body = body;
                    }
                    if let Some(tags) = changes.tag_list {
                        article.tag_list = tags;
                    }
                    article.updated_at = now;
                }
            }),
        });

        match self.table.transact(writes) {
            Ok(()) => self.load_article(id).map(|item| item.article),
            Err(TableError::ConditionFailed(0)) if renamed => Err(RepoError::Conflict(Unique::Slug)),
            Err(TableError::ConditionFailed(_)) => Err(RepoError::NotFound("article")),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_article(&self, id: i32) -> RepoResult<()> {
        let current = self.load_article(id)?;
        let writes = vec![
            Write::Delete { key: article_key(id), condition: Condition::Exists },
            Write::Delete { key: slug_key(&current.article.slug), condition: Condition::Always },
        ];
        match self.table.transact(writes) {
            Ok(()) => {}
            Err(TableError::ConditionFailed(_)) => return Err(RepoError::NotFound("article")),
            Err(e) => return Err(e.into()),
        }
        // Comments share the article's partition.
        let comments = self.table.delete_partition(&article_pk(id));
        let favorites = self.table.delete_partition(&favorite_pk(id));
        log::debug!("deleted article {} with {} comments and {} favorites", id, comments, favorites);
        Ok(())
    }

    fn add_favorite(&self, user_id: i32, article_id: i32) -> RepoResult<bool> {
        let writes = vec![
            Write::Put {
                key: favorite_key(article_id, user_id),
                item: Item::Favorite { created_at: Utc::now() },
                condition: Condition::NotExists,
            },
            Write::Update { key: article_key(article_id), apply: WideStore::favorite_delta(1) },
        ];
        match self.table.transact(writes) {
            Ok(()) => Ok(true),
            Err(TableError::ConditionFailed(0)) => Ok(false),
            Err(TableError::ConditionFailed(_)) => Err(RepoError::NotFound("article")),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_favorite(&self, user_id: i32, article_id: i32) -> RepoResult<bool> {
        let writes = vec![
            Write::Delete { key: favorite_key(article_id, user_id), condition: Condition::Exists },
            Write::Update { key: article_key(article_id), apply: WideStore::favorite_delta(-1) },
        ];
        match self.table.transact(writes) {
            Ok(()) => Ok(true),
            Err(TableError::ConditionFailed(0)) => Ok(false),
            Err(TableError::ConditionFailed(_)) => Err(RepoError::NotFound("article")),
            Err(e) => Err(e.into()),
        }
    }

    fn tags(&self) -> RepoResult<Vec<String>> {
        let tags: BTreeSet<String> = self
            .all_articles()
            .into_iter()
            .flat_map(|item| item.article.tag_list)
            .collect();
        Ok(tags.into_iter().collect())
    }
}
