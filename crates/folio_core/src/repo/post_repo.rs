//! Post repository contract and SQLite implementation.
//!
//! Posts are immutable once written: the contract has no update operation.

use crate::clock::{Clock, SystemClock};
use crate::model::post::{NewPost, Post};
use crate::model::record::{RecordId, RecordKind};
use crate::repo::{ensure_table_ready, parse_record_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, title, body, user_id, created_at";

/// Repository interface for owner-scoped post operations.
pub trait PostRepository {
    fn get_post(&self, id: RecordId) -> RepoResult<Option<Post>>;
    fn list_posts(&self) -> RepoResult<Vec<Post>>;
    fn insert_post(&self, post: &NewPost, user_id: &str) -> RepoResult<Post>;
    fn delete_post(&self, id: RecordId, user_id: &str) -> RepoResult<()>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_clock(conn, SystemClock)
    }

    /// Skips the schema check for a connection already verified by `try_new`.
    pub(crate) fn verified(conn: &'conn Connection) -> Self {
        Self {
            conn,
            clock: SystemClock,
        }
    }
}

impl<'conn, C: Clock> SqlitePostRepository<'conn, C> {
    pub fn try_with_clock(conn: &'conn Connection, clock: C) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "posts",
            &["id", "title", "body", "user_id", "created_at"],
        )?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> PostRepository for SqlitePostRepository<'_, C> {
    fn get_post(&self, id: RecordId) -> RepoResult<Option<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_post_row(row)?));
        }
        Ok(None)
    }

    fn list_posts(&self) -> RepoResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS}
             FROM posts
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn insert_post(&self, post: &NewPost, user_id: &str) -> RepoResult<Post> {
        post.validate()?;

        let created = Post {
            id: Uuid::new_v4(),
            title: post.title.clone(),
            body: post.body.clone(),
            user_id: user_id.to_string(),
            created_at: self.clock.now_epoch_ms(),
        };
        self.conn.execute(
            "INSERT INTO posts (id, title, body, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                created.id.to_string(),
                created.title.as_str(),
                created.body.as_str(),
                created.user_id.as_str(),
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    fn delete_post(&self, id: RecordId, user_id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM posts WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Post,
                id,
            });
        }
        Ok(())
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let id_text: String = row.get("id")?;
    let post = Post {
        id: parse_record_uuid("posts", &id_text)?,
        title: row.get("title")?,
        body: row.get("body")?,
        user_id: row.get("user_id")?,
        created_at: row.get("created_at")?,
    };

    if post.user_id.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty user_id for post `{id_text}`"
        )));
    }
    Ok(post)
}
