use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{comments, users};
use super::users::UserRow;
use super::{repo_err, PgStore};
use crate::repo::{Author, Comment, CommentRepository, CommentView, NewComment, RepoError, RepoResult, User};

#[derive(Debug, Queryable)]
pub struct CommentRow {
    pub id: i32,
    pub article_id: i32,
    pub author_id: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Comment {
        Comment {
            id: row.id,
            article_id: row.article_id,
            author_id: row.author_id,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = comments)]
struct NewCommentRow {
    article_id: i32,
    author_id: i32,
    body: String,
}

fn view((comment, author): (CommentRow, UserRow)) -> CommentView {
    CommentView {
        comment: Comment::from(comment),
        author: Author::from(&User::from(author)),
    }
}

impl CommentRepository for PgStore {
    fn insert_comment(&self, new: &NewComment) -> RepoResult<CommentView> {
        let mut conn = self.conn()?;
        let row = NewCommentRow {
            article_id: new.article_id,
            author_id: new.author_id,
            body: new.body.clone(),
        };
        let comment = diesel::insert_into(comments::table)
            .values(row)
            .get_result::<CommentRow>(&mut *conn)
            .map_err(repo_err("article"))?;
        let author = users::table
            .find(comment.author_id)
            .first::<UserRow>(&mut *conn)
            .map_err(repo_err("user"))?;
        Ok(view((comment, author)))
    }

    fn comments_for_article(&self, article_id: i32) -> RepoResult<Vec<CommentView>> {
        let mut conn = self.conn()?;
        let rows = comments::table
            .inner_join(users::table)
            .filter(comments::article_id.eq(article_id))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select((comments::all_columns, users::all_columns))
            .load::<(CommentRow, UserRow)>(&mut *conn)
            .map_err(repo_err("comment"))?;
        Ok(rows.into_iter().map(view).collect())
    }

    fn comment(&self, article_id: i32, id: i32) -> RepoResult<Comment> {
        let mut conn = self.conn()?;
        comments::table
            .filter(comments::id.eq(id))
            .filter(comments::article_id.eq(article_id))
            .first::<CommentRow>(&mut *conn)
            .map(Comment::from)
            .map_err(repo_err("comment"))
    }

    fn delete_comment(&self, article_id: i32, id: i32) -> RepoResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            comments::table
                .filter(comments::id.eq(id))
                .filter(comments::article_id.eq(article_id)),
        )
        .execute(&mut *conn)
        .map_err(repo_err("comment"))?;
        if deleted == 0 {
            return Err(RepoError::NotFound("comment"));
        }
        Ok(())
    }
}
