//! Wrapped mutators and cached reads over the command handlers.
//!
//! # Invariants
//! - create invalidates the collection key.
//! - update invalidates the collection key and the record key.
//! - delete invalidates the collection key and evicts the record key.
//! - A failed handler call touches no key and is returned unchanged.

use crate::cache::{lock_cache, CacheKey, SharedQueryCache};
use crate::model::article::{Article, ArticlePatch, NewArticle};
use crate::model::post::{NewPost, Post};
use crate::model::record::{parse_record_id, RecordKind};
use crate::repo::article_repo::ArticleRepository;
use crate::repo::post_repo::PostRepository;
use crate::service::article_service::ArticleService;
use crate::service::post_service::PostService;
use crate::service::{Deleted, HandlerError, HandlerResult};
use crate::session::SessionProvider;
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Article handlers routed through the shared query cache.
pub struct ArticleClient<R: ArticleRepository, S: SessionProvider> {
    service: ArticleService<R, S>,
    cache: SharedQueryCache,
}

impl<R: ArticleRepository, S: SessionProvider> ArticleClient<R, S> {
    pub fn new(service: ArticleService<R, S>, cache: SharedQueryCache) -> Self {
        Self { service, cache }
    }

    pub fn article(&self, id: &str) -> HandlerResult<Article> {
        match record_key(RecordKind::Article, id) {
            Some(key) => cached_read(&self.cache, key, || self.service.fetch_article(id)),
            None => self
                .service
                .fetch_article(id)
                .inspect_err(|err| log_failure("article_fetch", err)),
        }
    }

    pub fn articles(&self) -> HandlerResult<Vec<Article>> {
        let key = CacheKey::collection(RecordKind::Article);
        cached_read(&self.cache, key, || self.service.fetch_articles())
    }

    pub fn create_article(&self, input: &NewArticle) -> HandlerResult<Article> {
        let article = self
            .service
            .create_article(input)
            .inspect_err(|err| log_failure("article_create", err))?;

        let mut cache = lock_cache(&self.cache);
        cache.invalidate(&CacheKey::collection(RecordKind::Article));
        Ok(article)
    }

    pub fn update_article(&self, id: &str, patch: &ArticlePatch) -> HandlerResult<Article> {
        let article = self
            .service
            .update_article(id, patch)
            .inspect_err(|err| log_failure("article_update", err))?;

        let mut cache = lock_cache(&self.cache);
        cache.invalidate(&CacheKey::collection(RecordKind::Article));
        cache.invalidate(&CacheKey::record(
            RecordKind::Article,
            article.id.to_string(),
        ));
        Ok(article)
    }

    pub fn delete_article(&self, id: &str) -> HandlerResult<Deleted> {
        let deleted = self
            .service
            .delete_article(id)
            .inspect_err(|err| log_failure("article_delete", err))?;

        let mut cache = lock_cache(&self.cache);
        cache.invalidate(&CacheKey::collection(RecordKind::Article));
        if let Some(key) = record_key(RecordKind::Article, id) {
            cache.remove(&key);
        }
        Ok(deleted)
    }
}

/// Post handlers routed through the shared query cache.
pub struct PostClient<R: PostRepository, S: SessionProvider> {
    service: PostService<R, S>,
    cache: SharedQueryCache,
}

impl<R: PostRepository, S: SessionProvider> PostClient<R, S> {
    pub fn new(service: PostService<R, S>, cache: SharedQueryCache) -> Self {
        Self { service, cache }
    }

    pub fn post(&self, id: &str) -> HandlerResult<Post> {
        match record_key(RecordKind::Post, id) {
            Some(key) => cached_read(&self.cache, key, || self.service.fetch_post(id)),
            None => self
                .service
                .fetch_post(id)
                .inspect_err(|err| log_failure("post_fetch", err)),
        }
    }

    pub fn posts(&self) -> HandlerResult<Vec<Post>> {
        let key = CacheKey::collection(RecordKind::Post);
        cached_read(&self.cache, key, || self.service.fetch_posts())
    }

    pub fn create_post(&self, input: &NewPost) -> HandlerResult<Post> {
        let post = self
            .service
            .create_post(input)
            .inspect_err(|err| log_failure("post_create", err))?;

        lock_cache(&self.cache).invalidate(&CacheKey::collection(RecordKind::Post));
        Ok(post)
    }

    pub fn delete_post(&self, id: &str) -> HandlerResult<Deleted> {
        let deleted = self
            .service
            .delete_post(id)
            .inspect_err(|err| log_failure("post_delete", err))?;

        let mut cache = lock_cache(&self.cache);
        cache.invalidate(&CacheKey::collection(RecordKind::Post));
        if let Some(key) = record_key(RecordKind::Post, id) {
            cache.remove(&key);
        }
        Ok(deleted)
    }
}

/// Record key under the canonical id spelling, so every accepted alias of
/// one id shares a single entry. Ids that cannot name a record bypass the
/// cache.
fn record_key(kind: RecordKind, id: &str) -> Option<CacheKey> {
    match parse_record_id(id) {
        Ok(Some(record_id)) => Some(CacheKey::record(kind, record_id.to_string())),
        _ => None,
    }
}

fn cached_read<T: Serialize + DeserializeOwned>(
    cache: &SharedQueryCache,
    key: CacheKey,
    fetch: impl FnOnce() -> HandlerResult<T>,
) -> HandlerResult<T> {
    let cached = lock_cache(cache).get(&key).cloned();
    if let Some(value) = cached {
        match serde_json::from_value(value) {
            Ok(hit) => {
                debug!("event=cache_read module=cache status=hit key={key}");
                return Ok(hit);
            }
            Err(err) => {
                warn!("event=cache_read module=cache status=error key={key} error_code=decode_failed error={err}");
            }
        }
    }

    // The lock is released while the handler runs.
    let fresh = fetch().inspect_err(|err| log_failure("cache_read", err))?;
    match serde_json::to_value(&fresh) {
        Ok(value) => {
            lock_cache(cache).put(key.clone(), value);
            debug!("event=cache_read module=cache status=miss key={key}");
        }
        Err(err) => {
            warn!("event=cache_read module=cache status=error key={key} error_code=encode_failed error={err}");
        }
    }
    Ok(fresh)
}

fn log_failure(event: &'static str, err: &HandlerError) {
    error!(
        "event={event} module=cache status=error error_kind={} error={err}",
        err.kind().as_str()
    );
}
