//! Core domain logic for Folio: owned articles and posts.
//! This crate is the single source of truth for ownership and validation rules.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use api::{dispatch, dispatch_json, encode_response, execute, Folio, Request, Response};
pub use cache::{ArticleClient, CacheKey, PostClient, QueryCache, SharedQueryCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, FolioConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticlePatch, NewArticle};
pub use model::post::{NewPost, Post};
pub use model::record::{RecordId, RecordKind, ValidationError};
pub use repo::article_repo::{ArticleRepository, SqliteArticleRepository};
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::{RepoError, RepoResult};
pub use service::article_service::ArticleService;
pub use service::post_service::PostService;
pub use service::{Deleted, ErrorKind, HandlerError, HandlerResult};
pub use session::{
    current_user, Anonymous, CurrentUser, FixedSession, Identity, SessionHandle, SessionProvider,
};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
