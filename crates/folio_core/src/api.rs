//! JSON request dispatch for every command handler.
//!
//! # Responsibility
//! - Decode `{ "handler": "...", ...payload }` requests.
//! - Route reads and writes through the query cache layer.
//! - Encode results as `{ "ok": true, "data": ... }` or
//!   `{ "ok": false, "error": { "kind", "message" } }`.
//!
//! # Invariants
//! - `dispatch_json` never panics; malformed input is a `validation_error`.

use crate::cache::{ArticleClient, PostClient, QueryCache, SharedQueryCache};
use crate::config::FolioConfig;
use crate::db::open_db;
use crate::model::article::{ArticlePatch, NewArticle};
use crate::model::post::NewPost;
use crate::model::record::ValidationError;
use crate::repo::article_repo::SqliteArticleRepository;
use crate::repo::post_repo::SqlitePostRepository;
use crate::repo::RepoResult;
use crate::service::article_service::ArticleService;
use crate::service::post_service::PostService;
use crate::service::{ErrorKind, HandlerError, HandlerResult};
use crate::session::{current_user, SessionHandle};
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One handler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "handler", rename_all = "snake_case")]
pub enum Request {
    FetchArticle {
        id: String,
    },
    FetchArticles,
    CreateArticle {
        #[serde(default)]
        title: String,
        #[serde(default)]
        body: String,
    },
    UpdateArticle {
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        body: Option<String>,
    },
    DeleteArticle {
        id: String,
    },
    FetchPost {
        id: String,
    },
    FetchPosts,
    CreatePost {
        #[serde(default)]
        title: String,
        #[serde(default)]
        body: String,
    },
    DeletePost {
        id: String,
    },
    CurrentUser,
}

impl Request {
    /// Builds a request from a handler name and an optional payload object.
    pub fn from_parts(handler: &str, payload: Option<Value>) -> Result<Self, ValidationError> {
        let mut object = match payload {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(ValidationError::Malformed(format!(
                    "payload must be a JSON object, got `{other}`"
                )))
            }
        };
        object.insert("handler".to_string(), Value::String(handler.to_string()));
        serde_json::from_value(Value::Object(object))
            .map_err(|err| ValidationError::Malformed(err.to_string()))
    }

    /// Snake-case handler name.
    pub fn handler_name(&self) -> &'static str {
        match self {
            Self::FetchArticle { .. } => "fetch_article",
            Self::FetchArticles => "fetch_articles",
            Self::CreateArticle { .. } => "create_article",
            Self::UpdateArticle { .. } => "update_article",
            Self::DeleteArticle { .. } => "delete_article",
            Self::FetchPost { .. } => "fetch_post",
            Self::FetchPosts => "fetch_posts",
            Self::CreatePost { .. } => "create_post",
            Self::DeletePost { .. } => "delete_post",
            Self::CurrentUser => "current_user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Response envelope for one handler invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &HandlerError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ErrorBody {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|body| body.kind)
    }
}

/// Store connection, session and query cache for one process.
///
/// Construction verifies the record tables once; handler calls afterwards
/// touch the store only through the repositories.
pub struct Folio {
    conn: Connection,
    session: SessionHandle,
    cache: SharedQueryCache,
}

impl Folio {
    /// Wraps a migrated connection. Fails when a record table or column is
    /// missing.
    pub fn new(
        conn: Connection,
        session: SessionHandle,
        cache: SharedQueryCache,
    ) -> RepoResult<Self> {
        SqliteArticleRepository::try_new(&conn)?;
        SqlitePostRepository::try_new(&conn)?;
        Ok(Self {
            conn,
            session,
            cache,
        })
    }

    /// Opens the configured database with a fresh session and cache.
    pub fn open(config: &FolioConfig) -> RepoResult<Self> {
        let conn = open_db(&config.db_path)?;
        Self::new(
            conn,
            SessionHandle::new(),
            QueryCache::shared(config.cache_stale_time),
        )
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn cache(&self) -> &SharedQueryCache {
        &self.cache
    }

    /// Cache-wrapped article handlers bound to this store and session.
    pub fn articles(&self) -> ArticleClient<SqliteArticleRepository<'_>, &SessionHandle> {
        ArticleClient::new(
            ArticleService::new(SqliteArticleRepository::verified(&self.conn), &self.session),
            self.cache.clone(),
        )
    }

    /// Cache-wrapped post handlers bound to this store and session.
    pub fn posts(&self) -> PostClient<SqlitePostRepository<'_>, &SessionHandle> {
        PostClient::new(
            PostService::new(SqlitePostRepository::verified(&self.conn), &self.session),
            self.cache.clone(),
        )
    }
}

/// Runs one request and returns its typed outcome as JSON.
pub fn execute(folio: &Folio, request: Request) -> HandlerResult<Value> {
    match request {
        Request::FetchArticle { id } => to_json(folio.articles().article(&id)?),
        Request::FetchArticles => to_json(folio.articles().articles()?),
        Request::CreateArticle { title, body } => {
            to_json(folio.articles().create_article(&NewArticle { title, body })?)
        }
        Request::UpdateArticle { id, title, body } => to_json(
            folio
                .articles()
                .update_article(&id, &ArticlePatch { title, body })?,
        ),
        Request::DeleteArticle { id } => to_json(folio.articles().delete_article(&id)?),
        Request::FetchPost { id } => to_json(folio.posts().post(&id)?),
        Request::FetchPosts => to_json(folio.posts().posts()?),
        Request::CreatePost { title, body } => {
            to_json(folio.posts().create_post(&NewPost { title, body })?)
        }
        Request::DeletePost { id } => to_json(folio.posts().delete_post(&id)?),
        Request::CurrentUser => to_json(current_user(folio.session())),
    }
}

/// Runs one request and wraps the outcome in a response envelope.
pub fn dispatch(folio: &Folio, request: Request) -> Response {
    let handler = request.handler_name();
    match execute(folio, request) {
        Ok(data) => {
            info!("event=dispatch module=api status=ok handler={handler}");
            Response::success(data)
        }
        Err(err) => {
            error!(
                "event=dispatch module=api status=error handler={handler} error_kind={}",
                err.kind().as_str()
            );
            Response::failure(&err)
        }
    }
}

/// Decodes a JSON request, runs it, and encodes the response envelope.
pub fn dispatch_json(folio: &Folio, request_json: &str) -> String {
    let response = match serde_json::from_str::<Request>(request_json) {
        Ok(request) => dispatch(folio, request),
        Err(err) => {
            Response::failure(&HandlerError::Validation(ValidationError::Malformed(
                err.to_string(),
            )))
        }
    };
    encode_response(&response)
}

/// Serializes a response envelope, falling back to a fixed internal error.
pub fn encode_response(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        error!("event=dispatch module=api status=error error_code=encode_failed error={err}");
        r#"{"ok":false,"error":{"kind":"internal","message":"failed to encode response"}}"#
            .to_string()
    })
}

fn to_json<T: Serialize>(value: T) -> HandlerResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| HandlerError::Internal(format!("failed to encode result: {err}")))
}
