//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `capsule_core` linkage.
//! - Walk one capsule through create, contribute and view, against an
//!   in-memory database unless the config names `db_path`.
//!
//! Usage: `capsule_cli [config.json]`

use capsule_core::db::{open_db, open_db_in_memory};
use capsule_core::{
    ApiDeps, CapsuleApi, ContentSubmission, CoreConfig, FsObjectStore, LexiconScorer, ManualClock,
    MemoryObjectStore, NewCapsule, ObjectStore, PrincipalId, SqliteCapsuleStore,
    StaticTokenVerifier,
};
use std::sync::Arc;

const DEMO_TOKEN: &str = "demo-token";
const DEMO_NOW_MS: i64 = 1_767_225_600_000;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

fn main() {
    println!("capsule_core ping={}", capsule_core::ping());
    println!("capsule_core version={}", capsule_core::core_version());

    if let Err(err) = run(std::env::args().nth(1)) {
        eprintln!("capsule_cli error: {err}");
        std::process::exit(1);
    }
}

fn run(config_path: Option<String>) -> Result<(), String> {
    let (config, objects) = match config_path {
        Some(path) => {
            let config = CoreConfig::load(&path).map_err(|err| err.to_string())?;
            let objects: Arc<dyn ObjectStore> = Arc::new(
                FsObjectStore::from_config(&config.media).map_err(|err| err.to_string())?,
            );
            (config, objects)
        }
        None => {
            let mut config = CoreConfig::default();
            config.media.signing_secret = "demo-secret".to_string();
            let objects: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new(
                config.media.public_base_url.clone(),
                config.media.signing_secret.clone().into_bytes(),
            ));
            (config, objects)
        }
    };
    capsule_core::init_logging(&config.logging)?;

    let conn = match config.db_path.as_deref() {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let store = SqliteCapsuleStore::try_new(&conn).map_err(|err| err.to_string())?;
    let clock = Arc::new(ManualClock::new(DEMO_NOW_MS));
    let deps = ApiDeps {
        verifier: Arc::new(
            StaticTokenVerifier::new().with_token(DEMO_TOKEN, PrincipalId::new("demo-user")),
        ),
        clock: clock.clone(),
        objects,
        scorer: Arc::new(LexiconScorer::default()),
    };
    let api = CapsuleApi::new(store, deps, &config.media);
    let header = format!("Bearer {DEMO_TOKEN}");
    let auth = Some(header.as_str());

    let created = api
        .create_capsule(
            auth,
            NewCapsule {
                title: "Class of 2026".to_string(),
                description: Some("Open after graduation".to_string()),
                unlock_at: DEMO_NOW_MS + DAY_MS,
                is_communal: None,
            },
        )
        .map_err(|failure| failure.message)?;
    let capsule_id = created.capsule.id.to_string();
    api.add_content(
        auth,
        &capsule_id,
        ContentSubmission::text("I love this class and I am happy"),
    )
    .map_err(|failure| failure.message)?;

    let locked = api
        .get_capsule_detail(auth, &capsule_id)
        .map_err(|failure| failure.message)?;
    println!("capsule {} status={}", capsule_id, locked.status.as_str());

    clock.advance(DAY_MS);
    let unlocked = api
        .get_capsule_detail(auth, &capsule_id)
        .map_err(|failure| failure.message)?;
    println!(
        "capsule {} status={} contents={} mood={}",
        capsule_id,
        unlocked.status.as_str(),
        unlocked.contents.len(),
        unlocked
            .mood_summary
            .map(|mood| mood.label())
            .unwrap_or("n/a")
    );
    log::info!("event=cli_demo module=cli status=ok capsule_id={capsule_id}");
    Ok(())
}
