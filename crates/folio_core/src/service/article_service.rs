//! Article command handlers.
//!
//! # Invariants
//! - Input is validated, then the session is required, then the store is
//!   called once.
//! - `author_id` always comes from the session, never from input.

use crate::model::article::{Article, ArticlePatch, NewArticle};
use crate::model::record::{parse_record_id, RecordId, RecordKind};
use crate::repo::article_repo::ArticleRepository;
use crate::service::{map_repo_error, require_identity, Deleted, HandlerError, HandlerResult};
use crate::session::SessionProvider;
use log::info;

/// Handler facade over an article repository and a session provider.
pub struct ArticleService<R: ArticleRepository, S: SessionProvider> {
    repo: R,
    session: S,
}

impl<R: ArticleRepository, S: SessionProvider> ArticleService<R, S> {
    pub fn new(repo: R, session: S) -> Self {
        Self { repo, session }
    }

    /// Fetches one article by id. Reads do not require a session.
    pub fn fetch_article(&self, id: &str) -> HandlerResult<Article> {
        let record_id = resolve_id(id)?;
        self.repo
            .get_article(record_id)
            .map_err(|err| map_repo_error(err, "article_fetch", RecordKind::Article, "fetch"))?
            .ok_or_else(|| not_found(id))
    }

    /// Lists every article, newest first.
    pub fn fetch_articles(&self) -> HandlerResult<Vec<Article>> {
        self.repo
            .list_articles()
            .map_err(|err| map_repo_error(err, "article_list", RecordKind::Article, "fetch"))
    }

    /// Creates an article owned by the current session identity.
    pub fn create_article(&self, input: &NewArticle) -> HandlerResult<Article> {
        input.validate()?;
        let identity = require_identity(&self.session, "article_create")?;

        let article = self
            .repo
            .insert_article(input, identity.id.as_str())
            .map_err(|err| map_repo_error(err, "article_create", RecordKind::Article, "create"))?;
        info!(
            "event=article_create module=service status=ok article_id={}",
            article.id
        );
        Ok(article)
    }

    /// Applies a partial update when the caller owns the article.
    pub fn update_article(&self, id: &str, patch: &ArticlePatch) -> HandlerResult<Article> {
        parse_record_id(id)?;
        patch.validate()?;
        let identity = require_identity(&self.session, "article_update")?;
        let record_id = resolve_id(id)?;

        let article = self
            .repo
            .update_article(record_id, patch, identity.id.as_str())
            .map_err(|err| map_repo_error(err, "article_update", RecordKind::Article, "update"))?;
        info!(
            "event=article_update module=service status=ok article_id={}",
            article.id
        );
        Ok(article)
    }

    /// Hard-deletes an article when the caller owns it.
    pub fn delete_article(&self, id: &str) -> HandlerResult<Deleted> {
        parse_record_id(id)?;
        let identity = require_identity(&self.session, "article_delete")?;
        let record_id = resolve_id(id)?;

        self.repo
            .delete_article(record_id, identity.id.as_str())
            .map_err(|err| map_repo_error(err, "article_delete", RecordKind::Article, "delete"))?;
        info!("event=article_delete module=service status=ok article_id={record_id}");
        Ok(Deleted::ok())
    }
}

fn resolve_id(id: &str) -> HandlerResult<RecordId> {
    parse_record_id(id)?.ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> HandlerError {
    HandlerError::NotFound {
        kind: RecordKind::Article,
        id: id.to_string(),
    }
}
