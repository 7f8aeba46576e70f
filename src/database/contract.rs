//! Behaviour every `Store` implementation must share. Each check creates its
//! own users, so it can run against a shared Postgres database.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use super::models::{CollectionPatch, NewCollection, NewRequest, NewRun, RequestPatch, RequestScope};
use super::store::{Store, StoreError};

pub fn new_collection(name: &str) -> NewCollection {
    NewCollection {
        name: name.to_string(),
        description: Some("grouped endpoints".into()),
        icon: Some("star".into()),
    }
}

pub fn new_request(collection_id: Option<Uuid>) -> NewRequest {
    NewRequest {
        collection_id,
        name: "Ping".into(),
        method: None,
        url: "https://example.com/ping".into(),
        query_params: Some(json!([{ "key": "page", "value": "1" }])),
        headers: None,
        body_mode: None,
        body_content: None,
        auth_mode: Some("bearer".into()),
        auth_config: Some(json!({ "token": "abc" })),
    }
}

pub fn new_run(offset_secs: i64) -> NewRun {
    NewRun {
        started_at: Utc::now() + Duration::seconds(offset_secs),
        completed_at: None,
        status_code: Some(200),
        status_text: Some("OK".into()),
        duration_ms: Some(12),
        response_headers: None,
        response_body: None,
        error_message: None,
    }
}

pub async fn rows_are_invisible_to_other_users(store: &dyn Store) {
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let c = store.create_collection(alice, new_collection("Alice's")).await.unwrap();
    let r = store.create_request(alice, new_request(Some(c.id))).await.unwrap();
    let run = store.create_run(alice, r.id, new_run(0)).await.unwrap();

    assert!(matches!(
        store.get_collection(bob, c.id).await,
        Err(StoreError::NotFound { resource: "collection", .. })
    ));
    assert!(matches!(
        store.get_request(bob, r.id).await,
        Err(StoreError::NotFound { resource: "request", .. })
    ));
    assert!(matches!(store.get_run(bob, run.id).await, Err(StoreError::NotFound { .. })));
    assert!(store.list_collections(bob).await.unwrap().is_empty());
    assert!(store.list_requests(bob, RequestScope::All).await.unwrap().is_empty());
    assert!(store.list_runs(bob, None, 10).await.unwrap().is_empty());

    let rename = CollectionPatch {
        name: Some(Some("Bob's".into())),
        ..Default::default()
    };
    assert!(store.update_collection(bob, c.id, rename).await.is_err());
    assert!(store.delete_collection(bob, c.id).await.is_err());
    assert!(store.delete_request(bob, r.id).await.is_err());
    assert!(store.delete_run(bob, run.id).await.is_err());
    assert_eq!(store.clear_runs(bob, r.id).await.unwrap(), 0);

    assert_eq!(store.get_collection(alice, c.id).await.unwrap().name, "Alice's");
    assert_eq!(store.list_runs(alice, Some(r.id), 10).await.unwrap().len(), 1);
}

pub async fn request_counts_per_collection(store: &dyn Store) {
    let user = Uuid::new_v4();
    let full = store.create_collection(user, new_collection("Full")).await.unwrap();
    let empty = store.create_collection(user, new_collection("Empty")).await.unwrap();
    for _ in 0..3 {
        store.create_request(user, new_request(Some(full.id))).await.unwrap();
    }
    store.create_request(user, new_request(None)).await.unwrap();

    let listed = store.list_collections(user).await.unwrap();
    assert_eq!(listed.len(), 2);
    let count = |id: Uuid| listed.iter().find(|s| s.collection.id == id).unwrap().request_count;
    assert_eq!(count(full.id), 3);
    assert_eq!(count(empty.id), 0);
}

pub async fn request_scopes_filter(store: &dyn Store) {
    let user = Uuid::new_v4();
    let c = store.create_collection(user, new_collection("Scoped")).await.unwrap();
    let grouped = store.create_request(user, new_request(Some(c.id))).await.unwrap();
    let loose = store.create_request(user, new_request(None)).await.unwrap();

    assert_eq!(store.list_requests(user, RequestScope::All).await.unwrap().len(), 2);

    let in_collection = store.list_requests(user, RequestScope::Collection(c.id)).await.unwrap();
    assert_eq!(in_collection.len(), 1);
    assert_eq!(in_collection[0].id, grouped.id);

    let ungrouped = store.list_requests(user, RequestScope::Ungrouped).await.unwrap();
    assert_eq!(ungrouped.len(), 1);
    assert_eq!(ungrouped[0].id, loose.id);
}

pub async fn patches_clear_and_keep(store: &dyn Store) {
    let user = Uuid::new_v4();
    let c = store.create_collection(user, new_collection("Before")).await.unwrap();

    let patch = CollectionPatch {
        description: Some(None),
        ..Default::default()
    };
    let updated = store.update_collection(user, c.id, patch).await.unwrap();
    assert_eq!(updated.name, "Before");
    assert_eq!(updated.description, None);
    assert_eq!(updated.icon.as_deref(), Some("star"));
    assert!(updated.updated_at >= c.updated_at);
    assert_eq!(updated.created_at, c.created_at);

    let r = store.create_request(user, new_request(Some(c.id))).await.unwrap();
    assert_eq!(r.method, "GET");
    let patch = RequestPatch {
        collection_id: Some(None),
        method: Some(Some("POST".into())),
        auth_config: Some(None),
        body_content: Some(Some("hello".into())),
        ..Default::default()
    };
    let updated = store.update_request(user, r.id, patch).await.unwrap();
    assert_eq!(updated.collection_id, None);
    assert_eq!(updated.method, "POST");
    assert_eq!(updated.name, "Ping");
    assert_eq!(updated.auth_config, None);
    assert_eq!(updated.auth_mode.as_deref(), Some("bearer"));
    assert_eq!(updated.query_params, r.query_params);
    assert_eq!(updated.body_content.as_deref(), Some("hello"));
}

pub async fn deleting_collection_ungroups_requests(store: &dyn Store) {
    let user = Uuid::new_v4();
    let c = store.create_collection(user, new_collection("Temp")).await.unwrap();
    let r = store.create_request(user, new_request(Some(c.id))).await.unwrap();
    store.create_run(user, r.id, new_run(0)).await.unwrap();

    store.delete_collection(user, c.id).await.unwrap();

    let r = store.get_request(user, r.id).await.unwrap();
    assert_eq!(r.collection_id, None);
    assert_eq!(store.list_runs(user, Some(r.id), 10).await.unwrap().len(), 1);
    assert!(matches!(
        store.delete_collection(user, c.id).await,
        Err(StoreError::NotFound { .. })
    ));
}

pub async fn deleting_request_cascades_runs(store: &dyn Store) {
    let user = Uuid::new_v4();
    let r = store.create_request(user, new_request(None)).await.unwrap();
    let run = store.create_run(user, r.id, new_run(0)).await.unwrap();
    store.create_run(user, r.id, new_run(1)).await.unwrap();

    store.delete_request(user, r.id).await.unwrap();
    assert!(store.list_runs(user, None, 10).await.unwrap().is_empty());
    assert!(store.get_run(user, run.id).await.is_err());
}

pub async fn runs_are_newest_first_and_limited(store: &dyn Store) {
    let user = Uuid::new_v4();
    let r = store.create_request(user, new_request(None)).await.unwrap();
    let other = store.create_request(user, new_request(None)).await.unwrap();
    for offset in [0, 30, 10] {
        store.create_run(user, r.id, new_run(offset)).await.unwrap();
    }
    store.create_run(user, other.id, new_run(60)).await.unwrap();

    let runs = store.list_runs(user, Some(r.id), 2).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs[0].started_at > runs[1].started_at);
    assert!(runs.iter().all(|run| run.request_id == r.id));

    let recent = store.list_runs(user, None, 10).await.unwrap();
    assert_eq!(recent.len(), 4);
    assert_eq!(recent[0].request_id, other.id);

    let first = runs[0].id;
    store.delete_run(user, first).await.unwrap();
    assert!(store.get_run(user, first).await.is_err());

    assert_eq!(store.clear_runs(user, r.id).await.unwrap(), 2);
    assert_eq!(store.clear_runs(user, r.id).await.unwrap(), 0);
    assert_eq!(store.list_runs(user, None, 10).await.unwrap().len(), 1);
}

pub async fn unknown_parent_is_reported(store: &dyn Store) {
    let user = Uuid::new_v4();
    assert!(matches!(
        store.create_request(user, new_request(Some(Uuid::new_v4()))).await,
        Err(StoreError::MissingParent("collection"))
    ));
    assert!(matches!(
        store.create_run(user, Uuid::new_v4(), new_run(0)).await,
        Err(StoreError::MissingParent("request"))
    ));

    let r = store.create_request(user, new_request(None)).await.unwrap();
    let patch = RequestPatch {
        collection_id: Some(Some(Uuid::new_v4())),
        ..Default::default()
    };
    assert!(matches!(
        store.update_request(user, r.id, patch).await,
        Err(StoreError::MissingParent("collection"))
    ));
}
