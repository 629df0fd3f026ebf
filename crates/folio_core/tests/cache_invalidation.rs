use folio_core::db::open_db_in_memory;
use folio_core::{
    ArticleClient, ArticlePatch, ArticleService, CacheKey, FixedSession, HandlerError, Identity,
    NewArticle, NewPost, PostClient, PostService, QueryCache, RecordKind, SessionHandle,
    SharedQueryCache, SqliteArticleRepository, SqlitePostRepository,
};
use folio_core::cache::lock_cache;
use std::time::Duration;

fn shared_cache() -> SharedQueryCache {
    QueryCache::shared(Duration::from_secs(300))
}

fn owner() -> Identity {
    Identity::new("owner-id", "owner@example.com")
}

#[test]
fn reads_are_served_from_cache_until_a_mutation_invalidates_them() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );

    assert!(client.articles().unwrap().is_empty());
    conn.execute(
        "INSERT INTO articles (id, title, body, author_id, created_at)
         VALUES ('00000000-0000-4000-8000-00000000000a', 'out of band', 'b', 'x', 1);",
        [],
    )
    .unwrap();
    assert!(
        client.articles().unwrap().is_empty(),
        "fresh collection entry should be served without refetch"
    );

    let created = client
        .create_article(&NewArticle::new("Title", "Body"))
        .unwrap();
    assert!(lock_cache(&cache).is_stale(&CacheKey::collection(RecordKind::Article)));

    let listed = client.articles().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, created.id);
}

#[test]
fn create_invalidates_only_the_collection_key() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );
    let first = client
        .create_article(&NewArticle::new("first", "b"))
        .unwrap();
    let first_id = first.id.to_string();
    client.article(&first_id).unwrap();
    client.articles().unwrap();

    client
        .create_article(&NewArticle::new("second", "b"))
        .unwrap();

    let cache = lock_cache(&cache);
    assert!(cache.is_stale(&CacheKey::collection(RecordKind::Article)));
    assert!(cache
        .get(&CacheKey::record(RecordKind::Article, first_id))
        .is_some());
}

#[test]
fn update_invalidates_collection_and_record_keys() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );
    let id = client
        .create_article(&NewArticle::new("before", "b"))
        .unwrap()
        .id
        .to_string();
    assert_eq!(client.article(&id).unwrap().title, "before");
    client.articles().unwrap();

    client
        .update_article(
            &id,
            &ArticlePatch {
                title: Some("after".to_string()),
                body: None,
            },
        )
        .unwrap();

    {
        let cache = lock_cache(&cache);
        assert!(cache.is_stale(&CacheKey::collection(RecordKind::Article)));
        assert!(cache.is_stale(&CacheKey::record(RecordKind::Article, id.clone())));
    }
    assert_eq!(client.article(&id).unwrap().title, "after");
    assert_eq!(client.articles().unwrap()[0].title, "after");
}

#[test]
fn delete_evicts_the_record_key() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );
    let id = client
        .create_article(&NewArticle::new("gone soon", "b"))
        .unwrap()
        .id
        .to_string();
    client.article(&id).unwrap();
    client.articles().unwrap();

    assert!(client.delete_article(&id).unwrap().success);

    {
        let cache = lock_cache(&cache);
        assert!(!cache.contains(&CacheKey::record(RecordKind::Article, id.clone())));
        assert!(cache.is_stale(&CacheKey::collection(RecordKind::Article)));
    }
    assert!(client.articles().unwrap().is_empty());
    assert!(matches!(
        client.article(&id),
        Err(HandlerError::NotFound { .. })
    ));
}

#[test]
fn failed_mutation_leaves_every_key_untouched() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let session = SessionHandle::new();
    let client = ArticleClient::new(
        ArticleService::new(SqliteArticleRepository::try_new(&conn).unwrap(), &session),
        cache.clone(),
    );

    session.sign_in(owner());
    let id = client
        .create_article(&NewArticle::new("stable", "b"))
        .unwrap()
        .id
        .to_string();
    client.article(&id).unwrap();
    client.articles().unwrap();

    session.sign_in(Identity::new("someone-else", "else@example.com"));
    let patch = ArticlePatch {
        title: Some("nope".to_string()),
        body: None,
    };
    assert!(matches!(
        client.update_article(&id, &patch),
        Err(HandlerError::NotFound { .. })
    ));
    assert!(matches!(
        client.delete_article(&id),
        Err(HandlerError::NotFound { .. })
    ));
    session.sign_out();
    assert_eq!(
        client.create_article(&NewArticle::new("t", "b")),
        Err(HandlerError::Unauthenticated)
    );

    let cache = lock_cache(&cache);
    assert!(cache
        .get(&CacheKey::collection(RecordKind::Article))
        .is_some());
    assert!(cache
        .get(&CacheKey::record(RecordKind::Article, id))
        .is_some());
}

#[test]
fn post_mutations_follow_the_same_policy() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = PostClient::new(
        PostService::new(
            SqlitePostRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );

    client.posts().unwrap();
    let id = client
        .create_post(&NewPost::new("hello", "world"))
        .unwrap()
        .id
        .to_string();
    assert!(lock_cache(&cache).is_stale(&CacheKey::collection(RecordKind::Post)));

    assert_eq!(client.posts().unwrap().len(), 1);
    client.post(&id).unwrap();
    client.delete_post(&id).unwrap();

    let cache = lock_cache(&cache);
    assert!(!cache.contains(&CacheKey::record(RecordKind::Post, id)));
    assert!(cache.is_stale(&CacheKey::collection(RecordKind::Post)));
}

#[test]
fn update_through_one_id_spelling_refreshes_reads_through_another() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );
    let created = client
        .create_article(&NewArticle::new("before", "b"))
        .unwrap();
    let hyphenated = created.id.to_string();
    let compact = created.id.simple().to_string();

    assert_eq!(client.article(&compact).unwrap().title, "before");
    assert!(lock_cache(&cache).contains(&CacheKey::record(RecordKind::Article, hyphenated.clone())));

    client
        .update_article(
            &hyphenated,
            &ArticlePatch {
                title: Some("after".to_string()),
                body: None,
            },
        )
        .unwrap();

    assert_eq!(client.article(&compact).unwrap().title, "after");
    assert_eq!(client.article(&hyphenated.to_uppercase()).unwrap().title, "after");
}

#[test]
fn delete_through_one_id_spelling_evicts_reads_through_another() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );
    let id = client
        .create_article(&NewArticle::new("t", "b"))
        .unwrap()
        .id
        .to_string();
    let upper = id.to_uppercase();

    assert_eq!(client.article(&upper).unwrap().title, "t");
    assert!(client.delete_article(&id).unwrap().success);

    assert!(!lock_cache(&cache).contains(&CacheKey::record(RecordKind::Article, id.clone())));
    assert!(matches!(
        client.article(&upper),
        Err(HandlerError::NotFound { .. })
    ));
}

#[test]
fn post_delete_through_an_alias_evicts_the_canonical_key() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = PostClient::new(
        PostService::new(
            SqlitePostRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );
    let created = client.create_post(&NewPost::new("hello", "world")).unwrap();
    let compact = created.id.simple().to_string();

    client.post(&created.id.to_string()).unwrap();
    client.delete_post(&compact).unwrap();

    assert!(matches!(
        client.post(&created.id.to_string()),
        Err(HandlerError::NotFound { .. })
    ));
}

#[test]
fn ids_that_cannot_name_a_record_bypass_the_cache() {
    let conn = open_db_in_memory().unwrap();
    let cache = shared_cache();
    let client = ArticleClient::new(
        ArticleService::new(
            SqliteArticleRepository::try_new(&conn).unwrap(),
            FixedSession::new(owner()),
        ),
        cache.clone(),
    );

    assert!(matches!(
        client.article("not-a-uuid"),
        Err(HandlerError::NotFound { .. })
    ));
    assert!(lock_cache(&cache).is_empty());
}
