//! Post command handlers: fetch, list, create, delete.

use crate::model::post::{NewPost, Post};
use crate::model::record::{parse_record_id, RecordId, RecordKind};
use crate::repo::post_repo::PostRepository;
use crate::service::{map_repo_error, require_identity, Deleted, HandlerError, HandlerResult};
use crate::session::SessionProvider;
use log::info;

/// Handler facade over a post repository and a session provider.
pub struct PostService<R: PostRepository, S: SessionProvider> {
    repo: R,
    session: S,
}

impl<R: PostRepository, S: SessionProvider> PostService<R, S> {
    pub fn new(repo: R, session: S) -> Self {
        Self { repo, session }
    }

    pub fn fetch_post(&self, id: &str) -> HandlerResult<Post> {
        let record_id = resolve_id(id)?;
        self.repo
            .get_post(record_id)
            .map_err(|err| map_repo_error(err, "post_fetch", RecordKind::Post, "fetch"))?
            .ok_or_else(|| not_found(id))
    }

    pub fn fetch_posts(&self) -> HandlerResult<Vec<Post>> {
        self.repo
            .list_posts()
            .map_err(|err| map_repo_error(err, "post_list", RecordKind::Post, "fetch"))
    }

    /// Creates a post owned by the current session identity.
    pub fn create_post(&self, input: &NewPost) -> HandlerResult<Post> {
        input.validate()?;
        let identity = require_identity(&self.session, "post_create")?;

        let post = self
            .repo
            .insert_post(input, identity.id.as_str())
            .map_err(|err| map_repo_error(err, "post_create", RecordKind::Post, "create"))?;
        info!("event=post_create module=service status=ok post_id={}", post.id);
        Ok(post)
    }

    /// Hard-deletes a post when the caller owns it.
    pub fn delete_post(&self, id: &str) -> HandlerResult<Deleted> {
        parse_record_id(id)?;
        let identity = require_identity(&self.session, "post_delete")?;
        let record_id = resolve_id(id)?;

        self.repo
            .delete_post(record_id, identity.id.as_str())
            .map_err(|err| map_repo_error(err, "post_delete", RecordKind::Post, "delete"))?;
        info!("event=post_delete module=service status=ok post_id={record_id}");
        Ok(Deleted::ok())
    }
}

fn resolve_id(id: &str) -> HandlerResult<RecordId> {
    parse_record_id(id)?.ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> HandlerError {
    HandlerError::NotFound {
        kind: RecordKind::Post,
        id: id.to_string(),
    }
}
