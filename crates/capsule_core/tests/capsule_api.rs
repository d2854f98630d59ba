use capsule_core::db::open_db_in_memory;
use capsule_core::media::verify_signed_url;
use capsule_core::{
    ApiDeps, CapsuleApi, CapsulePatch, ContentSubmission, ErrorKind, LexiconScorer, LockState,
    ManualClock, MediaConfig, MemoryObjectStore, NewCapsule, PrincipalId, SqliteCapsuleStore,
    StaticTokenVerifier,
};
use rusqlite::Connection;
use serde_json::json;
use std::sync::Arc;

const T0: i64 = 1_780_000_000_000;
const UNLOCK_AT: i64 = 1_792_584_000_000;
const OWNER: Option<&str> = Some("Bearer owner-token");
const STRANGER: Option<&str> = Some("Bearer stranger-token");

fn media_config() -> MediaConfig {
    MediaConfig {
        public_base_url: "https://media.test/blobs".to_string(),
        signing_secret: "secret".to_string(),
        ..MediaConfig::default()
    }
}

fn build_api(conn: &Connection, clock: Arc<ManualClock>) -> CapsuleApi<SqliteCapsuleStore<'_>> {
    let store = SqliteCapsuleStore::try_new(conn).expect("store should open on migrated db");
    let media = media_config();
    let deps = ApiDeps {
        verifier: Arc::new(
            StaticTokenVerifier::new()
                .with_token("owner-token", PrincipalId::new("owner"))
                .with_token("stranger-token", PrincipalId::new("stranger")),
        ),
        clock,
        objects: Arc::new(MemoryObjectStore::new(
            media.public_base_url.clone(),
            media.signing_secret.clone().into_bytes(),
        )),
        scorer: Arc::new(LexiconScorer::default()),
    };
    CapsuleApi::new(store, deps, &media)
}

fn new_capsule() -> NewCapsule {
    NewCapsule {
        title: "Graduation".to_string(),
        description: Some("Open in the fall".to_string()),
        unlock_at: UNLOCK_AT,
        is_communal: Some(true),
    }
}

#[test]
fn create_returns_message_and_camel_case_capsule() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));

    let created = api.create_capsule(OWNER, new_capsule()).unwrap();
    let body = serde_json::to_value(&created).unwrap();

    assert_eq!(body["message"], "Time capsule created successfully.");
    assert_eq!(body["capsule"]["title"], "Graduation");
    assert_eq!(body["capsule"]["creatorId"], "owner");
    assert_eq!(body["capsule"]["unlockAt"], UNLOCK_AT);
    assert_eq!(body["capsule"]["isCommunal"], true);
    assert_eq!(body["capsule"]["createdAt"], T0);
}

#[test]
fn every_operation_requires_a_valid_bearer_token() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));

    let missing = api.list_owned_capsules(None).unwrap_err();
    assert_eq!(missing.kind, ErrorKind::Auth);
    assert_eq!(
        missing.message,
        "Access denied. No token provided or malformed token."
    );

    let malformed = api.create_capsule(Some("Token abc"), new_capsule()).unwrap_err();
    assert_eq!(malformed.kind, ErrorKind::Auth);

    let invalid = api
        .signed_media_url(Some("Bearer nope"), "k.png")
        .unwrap_err();
    assert_eq!(invalid.kind, ErrorKind::Auth);
    assert_eq!(invalid.message, "Invalid or expired token.");

    assert!(api.list_owned_capsules(OWNER).unwrap().capsules.is_empty());
}

#[test]
fn locked_detail_envelope_hides_contents() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));
    let capsule_id = api
        .create_capsule(OWNER, new_capsule())
        .expect("capsule should be created")
        .capsule
        .id
        .to_string();
    api.add_content(OWNER, &capsule_id, ContentSubmission::text("I love this"))
        .expect("content should be added while locked");

    let detail = api.get_capsule_detail(OWNER, &capsule_id).unwrap();
    assert_eq!(detail.status, LockState::Locked);
    let body = serde_json::to_value(&detail).unwrap();
    assert_eq!(body["status"], "LOCKED");
    assert_eq!(body["message"], "This capsule is locked until Wed Oct 21 2026");
    assert_eq!(body["contents"], json!([]));
    assert_eq!(body["title"], "Graduation");
    assert!(body.get("moodSummary").is_none());
    assert!(body.get("totalSentimentScore").is_none());
}

#[test]
fn unlocked_detail_envelope_carries_sentiment_summary() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let clock = Arc::new(ManualClock::new(T0));
    let api = build_api(&conn, clock.clone());
    let capsule_id = api
        .create_capsule(OWNER, new_capsule())
        .expect("capsule should be created")
        .capsule
        .id
        .to_string();
    for text in ["I love this", "I am not happy", "so good"] {
        clock.advance(1);
        let added = api
            .add_content(OWNER, &capsule_id, ContentSubmission::text(text))
            .expect("content should be added while locked");
        assert_eq!(added.message, "Content successfully added to capsule.");
    }

    clock.set(UNLOCK_AT);
    let body = serde_json::to_value(api.get_capsule_detail(OWNER, &capsule_id).unwrap()).unwrap();
    assert_eq!(body["status"], "UNLOCKED");
    assert!(body.get("message").is_none());
    assert_eq!(body["contents"].as_array().unwrap().len(), 3);
    assert_eq!(body["contents"][0]["contentType"], "text");
    assert_eq!(body["contents"][0]["text"], "I love this");
    assert_eq!(body["totalSentimentScore"], 3.0);
    assert_eq!(body["averageSentimentScore"], 1.0);
    assert_eq!(body["moodSummary"], "Very Positive");
}

#[test]
fn update_and_delete_envelopes() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));
    let capsule_id = api
        .create_capsule(OWNER, new_capsule())
        .expect("capsule should be created")
        .capsule
        .id
        .to_string();

    let patch: CapsulePatch = serde_json::from_value(json!({ "description": null })).unwrap();
    let updated = api.update_capsule(OWNER, &capsule_id, patch).unwrap();
    assert_eq!(updated.message, "Time capsule updated successfully.");
    assert_eq!(updated.capsule.description, None);

    let empty: CapsulePatch = serde_json::from_value(json!({})).unwrap();
    let failure = api.update_capsule(OWNER, &capsule_id, empty).unwrap_err();
    assert_eq!(failure.kind, ErrorKind::Validation);
    assert_eq!(
        failure.message,
        "At least one field (title, description, or isCommunal) is required for update."
    );

    let forbidden = api.delete_capsule(STRANGER, &capsule_id).unwrap_err();
    assert_eq!(forbidden.kind, ErrorKind::Auth);
    assert_eq!(
        forbidden.message,
        "Forbidden. You do not have access to this capsule."
    );

    let deleted = api.delete_capsule(OWNER, &capsule_id).unwrap();
    assert_eq!(
        serde_json::to_value(&deleted).unwrap(),
        json!({ "message": "Time capsule deleted successfully." })
    );

    let gone = api.get_capsule_detail(OWNER, &capsule_id).unwrap_err();
    assert_eq!(gone.kind, ErrorKind::NotFound);
    assert_eq!(gone.message, "Capsule not found.");
}

#[test]
fn malformed_capsule_id_is_not_found() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));

    let failure = api.get_capsule_detail(OWNER, "not-a-uuid").unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NotFound);
    let failure = api
        .add_content(OWNER, "42", ContentSubmission::text("hello"))
        .unwrap_err();
    assert_eq!(failure.kind, ErrorKind::NotFound);
}

#[test]
fn signed_media_url_is_available_to_any_principal() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));
    let capsule_id = api
        .create_capsule(OWNER, new_capsule())
        .expect("capsule should be created")
        .capsule
        .id
        .to_string();
    let key = api
        .add_content(
            OWNER,
            &capsule_id,
            ContentSubmission::file(vec![1, 2, 3], "image/png", "me.png"),
        )
        .expect("content should be added while locked")
        .content
        .storage_key
        .expect("binary content should carry a storage key");

    let signed = api.signed_media_url(STRANGER, &key).unwrap();
    assert!(signed.url.starts_with("https://media.test/blobs/"));
    let ttl_ms = 30 * 60 * 1000;
    assert_eq!(
        verify_signed_url(&signed.url, b"secret", T0 + ttl_ms - 1).as_deref(),
        Some(key.as_str())
    );
    assert_eq!(verify_signed_url(&signed.url, b"secret", T0 + ttl_ms), None);

    let unknown = api.signed_media_url(OWNER, "missing.png").unwrap_err();
    assert_eq!(unknown.kind, ErrorKind::Storage);
    assert_eq!(unknown.message, "Storage failure. Please retry later.");
}

#[test]
fn failure_envelope_serializes_kind_and_message_only() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let api = build_api(&conn, Arc::new(ManualClock::new(T0)));
    let capsule_id = api
        .create_capsule(OWNER, new_capsule())
        .expect("capsule should be created")
        .capsule
        .id
        .to_string();

    let failure = api
        .add_content(STRANGER, &capsule_id, ContentSubmission::text("hi"))
        .unwrap_err();
    assert_eq!(
        serde_json::to_value(&failure).unwrap(),
        json!({ "kind": "not_found", "message": "Capsule not found." })
    );
}
