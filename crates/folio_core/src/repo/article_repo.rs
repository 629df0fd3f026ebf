//! Article repository contract and SQLite implementation.
//!
//! # Invariants
//! - `update_article` and `delete_article` filter on `id AND author_id` in a
//!   single statement; there is no read-then-check step.
//! - Lists are ordered `created_at DESC`, newest insert first on ties.
//! - `author_id` is written once at insert and never updated.

use crate::clock::{Clock, SystemClock};
use crate::model::article::{Article, ArticlePatch, NewArticle};
use crate::model::record::{RecordId, RecordKind};
use crate::repo::{ensure_table_ready, parse_record_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const ARTICLE_COLUMNS: &str = "id, title, body, author_id, created_at, updated_at";

/// Repository interface for owner-scoped article operations.
pub trait ArticleRepository {
    fn get_article(&self, id: RecordId) -> RepoResult<Option<Article>>;
    fn list_articles(&self) -> RepoResult<Vec<Article>>;
    fn insert_article(&self, article: &NewArticle, author_id: &str) -> RepoResult<Article>;
    fn update_article(
        &self,
        id: RecordId,
        patch: &ArticlePatch,
        author_id: &str,
    ) -> RepoResult<Article>;
    fn delete_article(&self, id: RecordId, author_id: &str) -> RepoResult<()>;
}

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn, C: Clock = SystemClock> {
    conn: &'conn Connection,
    clock: C,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Constructs a repository from a migrated connection using wall time.
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

impl<'conn, C: Clock> SqliteArticleRepository<'conn, C> {
    pub fn try_with_clock(conn: &'conn Connection, clock: C) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "articles",
            &["id", "title", "body", "author_id", "created_at", "updated_at"],
        )?;
        Ok(Self { conn, clock })
    }
}

impl<C: Clock> ArticleRepository for SqliteArticleRepository<'_, C> {
    fn get_article(&self, id: RecordId) -> RepoResult<Option<Article>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_article_row(row)?));
        }
        Ok(None)
    }

    fn list_articles(&self) -> RepoResult<Vec<Article>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS}
             FROM articles
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut articles = Vec::new();
        while let Some(row) = rows.next()? {
            articles.push(parse_article_row(row)?);
        }
        Ok(articles)
    }

    fn insert_article(&self, article: &NewArticle, author_id: &str) -> RepoResult<Article> {
        article.validate()?;

        let created = Article {
            id: Uuid::new_v4(),
            title: article.title.clone(),
            body: article.body.clone(),
            author_id: author_id.to_string(),
            created_at: self.clock.now_epoch_ms(),
            updated_at: None,
        };
        self.conn.execute(
            "INSERT INTO articles (id, title, body, author_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL);",
            params![
                created.id.to_string(),
                created.title.as_str(),
                created.body.as_str(),
                created.author_id.as_str(),
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    fn update_article(
        &self,
        id: RecordId,
        patch: &ArticlePatch,
        author_id: &str,
    ) -> RepoResult<Article> {
        patch.validate()?;

        let mut stmt = self.conn.prepare(&format!(
            "UPDATE articles
             SET
                title = COALESCE(?3, title),
                body = COALESCE(?4, body),
                updated_at = ?5
             WHERE id = ?1
               AND author_id = ?2
             RETURNING {ARTICLE_COLUMNS};"
        ))?;
        let mut rows = stmt.query(params![
            id.to_string(),
            author_id,
            patch.title.as_deref(),
            patch.body.as_deref(),
            self.clock.now_epoch_ms(),
        ])?;

        if let Some(row) = rows.next()? {
            return parse_article_row(row);
        }
        Err(RepoError::NotFound {
            kind: RecordKind::Article,
            id,
        })
    }

    fn delete_article(&self, id: RecordId, author_id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM articles WHERE id = ?1 AND author_id = ?2;",
            params![id.to_string(), author_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: RecordKind::Article,
                id,
            });
        }
        Ok(())
    }
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let id_text: String = row.get("id")?;
    let article = Article {
        id: parse_record_uuid("articles", &id_text)?,
        title: row.get("title")?,
        body: row.get("body")?,
        author_id: row.get("author_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };

    if article.author_id.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty author_id for article `{id_text}`"
        )));
    }
    Ok(article)
}
