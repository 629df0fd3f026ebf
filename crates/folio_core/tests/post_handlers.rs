use folio_core::db::open_db_in_memory;
use folio_core::{
    Anonymous, ArticleRepository, FixedSession, HandlerError, Identity, ManualClock, NewPost,
    PostRepository, PostService, RepoError, SessionHandle, SqliteArticleRepository,
    SqlitePostRepository, ValidationError,
};
use rusqlite::Connection;

fn carol() -> Identity {
    Identity::new("carol-id", "carol@example.com")
}

#[test]
fn create_post_stamps_user_id_and_lists_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let clock = ManualClock::starting_at(10);
    let repo = SqlitePostRepository::try_with_clock(&conn, clock.clone()).unwrap();
    let service = PostService::new(repo, FixedSession::new(carol()));

    let older = service.create_post(&NewPost::new("older", "b")).unwrap();
    clock.advance_ms(5);
    let newer = service.create_post(&NewPost::new("newer", "b")).unwrap();

    assert_eq!(newer.user_id, "carol-id");
    let listed = service.fetch_posts().unwrap();
    assert_eq!(
        listed.iter().map(|post| post.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );
    assert_eq!(service.fetch_post(&older.id.to_string()).unwrap(), older);
}

#[test]
fn empty_title_is_rejected_without_mutation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo, FixedSession::new(carol()));
    service.create_post(&NewPost::new("kept", "b")).unwrap();
    let before = service.fetch_posts().unwrap().len();

    let err = service.create_post(&NewPost::new("", "body")).unwrap_err();
    assert_eq!(
        err,
        HandlerError::Validation(ValidationError::Required("title"))
    );
    assert_eq!(service.fetch_posts().unwrap().len(), before);
}

#[test]
fn anonymous_create_and_delete_are_unauthenticated() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePostRepository::try_new(&conn).unwrap();
    let service = PostService::new(repo, Anonymous);

    assert_eq!(
        service.create_post(&NewPost::new("t", "b")),
        Err(HandlerError::Unauthenticated)
    );
    assert_eq!(
        service.delete_post(&uuid::Uuid::new_v4().to_string()),
        Err(HandlerError::Unauthenticated)
    );
    assert!(service.fetch_posts().unwrap().is_empty());
}

#[test]
fn only_the_owner_can_delete_a_post() {
    let conn = open_db_in_memory().unwrap();
    let session = SessionHandle::new();
    let service = PostService::new(SqlitePostRepository::try_new(&conn).unwrap(), &session);

    session.sign_in(carol());
    let id = service
        .create_post(&NewPost::new("mine", "b"))
        .unwrap()
        .id
        .to_string();

    session.sign_in(Identity::new("dave-id", "dave@example.com"));
    assert!(matches!(
        service.delete_post(&id),
        Err(HandlerError::NotFound { .. })
    ));
    assert!(service.fetch_post(&id).is_ok());

    session.sign_in(carol());
    assert!(service.delete_post(&id).unwrap().success);
    assert!(matches!(
        service.delete_post(&id),
        Err(HandlerError::NotFound { .. })
    ));
}

// Tables without the length checks, so ownerless rows can be planted.
fn unchecked_store() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE articles (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            author_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NULL
        );
        CREATE TABLE posts (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            user_id TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        INSERT INTO articles (id, title, body, author_id, created_at)
        VALUES ('00000000-0000-4000-8000-000000000001', 't', 'b', '', 1);
        INSERT INTO posts (id, title, body, user_id, created_at)
        VALUES ('00000000-0000-4000-8000-000000000002', 't', 'b', '', 1);",
    )
    .unwrap();
    conn
}

#[test]
fn ownerless_rows_are_rejected_for_both_kinds() {
    let conn = unchecked_store();

    let posts = SqlitePostRepository::try_new(&conn).unwrap();
    let err = posts.list_posts().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("user_id")));

    let articles = SqliteArticleRepository::try_new(&conn).unwrap();
    let err = articles.list_articles().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("author_id")));
}
