//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Own the process-wide session and query cache shared by every call.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every record operation goes through the cache-wrapped handlers.

use folio_core::{
    core_version as core_version_inner, dispatch, dispatch_json, encode_response,
    init_logging as init_logging_inner, ping as ping_inner, Folio, FolioConfig, HandlerError,
    Identity, QueryCache, Request, Response, SessionHandle, SessionProvider, SharedQueryCache,
};
use log::warn;
use std::sync::OnceLock;

static CONFIG: OnceLock<FolioConfig> = OnceLock::new();
static SESSION: OnceLock<SessionHandle> = OnceLock::new();
static QUERY_CACHE: OnceLock<SharedQueryCache> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Signs in the identity resolved by the host's auth flow.
///
/// Returns empty string on success and an error message when `user_id` is
/// blank. A rejected call leaves the current session untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn sign_in(user_id: String, email: String) -> String {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return "sign_in failed: user id must not be blank".to_string();
    }
    session().sign_in(Identity::new(user_id, email.trim()));
    String::new()
}

#[flutter_rust_bridge::frb(sync)]
pub fn sign_out() {
    session().sign_out();
}

/// Returns the signed-in email, or `None` when signed out.
#[flutter_rust_bridge::frb(sync)]
pub fn current_user_email() -> Option<String> {
    session().current_identity().map(|identity| identity.email)
}

/// Runs one JSON handler request and returns the JSON response envelope.
///
/// # FFI contract
/// - Never panics; store bootstrap failures come back as `internal` errors.
#[flutter_rust_bridge::frb(sync)]
pub fn handle_request(request_json: String) -> String {
    match with_folio(|folio| dispatch_json(folio, request_json.as_str())) {
        Ok(response) => response,
        Err(message) => encode_response(&Response::failure(&HandlerError::Internal(message))),
    }
}

/// Typed envelope for single-operation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// `validation_error|unauthenticated|not_found|internal` on failure.
    pub error_kind: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// JSON-encoded result on success.
    pub payload_json: Option<String>,
}

impl ActionResponse {
    fn from_response(response: Response, success_message: &str) -> Self {
        match response.error {
            None => Self {
                ok: true,
                error_kind: None,
                message: success_message.to_string(),
                payload_json: response.data.map(|data| data.to_string()),
            },
            Some(error) => Self {
                ok: false,
                error_kind: Some(error.kind.as_str().to_string()),
                message: error.message,
                payload_json: None,
            },
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            ok: false,
            error_kind: Some("internal".to_string()),
            message,
            payload_json: None,
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn article_fetch(id: String) -> ActionResponse {
    run(Request::FetchArticle { id }, "Article loaded.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn article_list() -> ActionResponse {
    run(Request::FetchArticles, "Articles loaded.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn article_create(title: String, body: String) -> ActionResponse {
    run(Request::CreateArticle { title, body }, "Article created.")
}

/// Updates title and/or body; `None` keeps the stored value.
#[flutter_rust_bridge::frb(sync)]
pub fn article_update(id: String, title: Option<String>, body: Option<String>) -> ActionResponse {
    run(Request::UpdateArticle { id, title, body }, "Article updated.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn article_delete(id: String) -> ActionResponse {
    run(Request::DeleteArticle { id }, "Article deleted.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn post_fetch(id: String) -> ActionResponse {
    run(Request::FetchPost { id }, "Post loaded.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn post_list() -> ActionResponse {
    run(Request::FetchPosts, "Posts loaded.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn post_create(title: String, body: String) -> ActionResponse {
    run(Request::CreatePost { title, body }, "Post created.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn post_delete(id: String) -> ActionResponse {
    run(Request::DeletePost { id }, "Post deleted.")
}

fn run(request: Request, success_message: &str) -> ActionResponse {
    match with_folio(|folio| dispatch(folio, request)) {
        Ok(response) => ActionResponse::from_response(response, success_message),
        Err(message) => ActionResponse::unavailable(message),
    }
}

fn config() -> &'static FolioConfig {
    CONFIG.get_or_init(|| {
        FolioConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=error error={err}");
            FolioConfig::default()
        })
    })
}

fn session() -> &'static SessionHandle {
    SESSION.get_or_init(SessionHandle::new)
}

fn query_cache() -> &'static SharedQueryCache {
    QUERY_CACHE.get_or_init(|| QueryCache::shared(config().cache_stale_time))
}

fn with_folio<T>(f: impl FnOnce(&Folio) -> T) -> Result<T, String> {
    let conn = folio_core::db::open_db(&config().db_path)
        .map_err(|err| format!("database open failed: {err}"))?;
    let folio = Folio::new(conn, session().clone(), query_cache().clone())
        .map_err(|err| format!("record store unavailable: {err}"))?;
    Ok(f(&folio))
}
