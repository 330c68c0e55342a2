use chrono::Utc;

use super::table::{Condition, TableError, Write};
use super::{article_key, article_pk, comment_key, CommentItem, Item, WideStore};
use crate::repo::{Author, Comment, CommentRepository, CommentView, NewComment, RepoError, RepoResult};

impl CommentRepository for WideStore {
    fn insert_comment(&self, new: &NewComment) -> RepoResult<CommentView> {
        let author = Author::from(&self.load_user(new.author_id)?);
        let id = WideStore::next_id(&self.comment_ids);
        let now = Utc::now();
        let comment = Comment {
            id,
            article_id: new.article_id,
            author_id: new.author_id,
            body: new.body.clone(),
            created_at: now,
            updated_at: now,
        };
        let writes = vec![
            // No-op update; only asserts the article is still there.
            Write::Update { key: article_key(new.article_id), apply: Box::new(|_: &mut Item| {}) },
            Write::Put {
                key: comment_key(new.article_id, id),
                item: Item::Comment(CommentItem { comment: comment.clone(), author: author.clone() }),
                condition: Condition::NotExists,
            },
        ];
        match self.table.transact(writes) {
            Ok(()) => Ok(CommentView { comment, author }),
            Err(TableError::ConditionFailed(0)) => Err(RepoError::NotFound("article")),
            Err(e) => Err(e.into()),
        }
    }

    fn comments_for_article(&self, article_id: i32) -> RepoResult<Vec<CommentView>> {
        let mut comments: Vec<CommentView> = self
            .table
            .query(&article_pk(article_id))
            .into_iter()
            .filter_map(|(_, item)| match item {
                Item::Comment(CommentItem { comment, author }) => Some(CommentView { comment, author }),
                _ => None,
            })
            .collect();
        comments.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then(a.comment.id.cmp(&b.comment.id))
        });
        Ok(comments)
    }

    fn comment(&self, article_id: i32, id: i32) -> RepoResult<Comment> {
        match self.table.get(&comment_key(article_id, id)) {
            Some(Item::Comment(item)) => Ok(item.comment),
            _ => Err(RepoError::NotFound("comment")),
        }
    }

    fn delete_comment(&self, article_id: i32, id: i32) -> RepoResult<()> {
        match self.table.delete(&comment_key(article_id, id)) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound("comment")),
        }
    }
}
