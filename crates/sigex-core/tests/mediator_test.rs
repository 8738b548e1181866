//! End-to-end collab editing: schema -> surface -> edit set -> store

use serde_json::{json, Value};
use sigex_core::command::{resolve, CommandSurface};
use sigex_core::extension::ExtensionCatalog;
use sigex_core::registry::builtin::{FbThreatExchangeCollab, FB_THREATEXCHANGE, LOCAL_FILE, NCMEC};
use sigex_core::storage::{CollabStore, Database};
use sigex_core::{ApplyOutcome, CollabMediator, Settings, SigexError, SigexResult};

fn surface(settings: &Settings<'_>, api: &str) -> CommandSurface {
    settings
        .apis()
        .surfaces()
        .unwrap()
        .into_iter()
        .find(|s| s.api == api)
        .unwrap()
}

/// Parse `argv` against the api's surface and apply it
fn run(settings: &Settings<'_>, api: &str, argv: &[&str]) -> SigexResult<ApplyOutcome> {
    let surface = surface(settings, api);
    let matches = surface
        .command
        .clone()
        .try_get_matches_from(std::iter::once(api).chain(argv.iter().copied()))
        .map_err(|e| SigexError::UserInput(e.to_string()))?;
    let args = surface.edit_args(&matches)?;
    let resolved = resolve(api, &surface.descriptors, &args)?;

    let registered = settings.apis().get(api).unwrap();
    let store = settings.collab_store();
    CollabMediator::new(&store).apply(&registered.schema, &resolved)
}

fn snapshot(settings: &Settings<'_>) -> Vec<Value> {
    settings
        .collab_store()
        .list()
        .unwrap()
        .iter()
        .map(|c| serde_json::to_value(c).unwrap())
        .collect()
}

#[test]
fn test_round_trip_preserves_values() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    run(
        &settings,
        NCMEC,
        &["ncmec-prod", "--create", "--environment", "Exploitative", "--only-esp-ids", "1,22,333"],
    )
    .unwrap();

    let stored = settings.collab_store().find("ncmec-prod").unwrap().unwrap();
    assert_eq!(stored.api, NCMEC);
    assert!(stored.enabled);
    assert_eq!(stored.attribute("environment"), Some(&json!("Exploitative")));
    assert_eq!(stored.attribute("only_esp_ids"), Some(&json!([1, 22, 333])));
}

#[test]
fn test_typed_attributes() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    run(&settings, FB_THREATEXCHANGE, &["te", "-C", "--privacy-group", "1012"]).unwrap();

    let stored = settings.collab_store().find("te").unwrap().unwrap();
    let typed: FbThreatExchangeCollab = stored.attributes_as().unwrap();
    assert_eq!(
        typed,
        FbThreatExchangeCollab {
            privacy_group: 1012,
            app_token_override: None,
        }
    );
}

#[test]
fn test_duplicate_create_leaves_store_unchanged() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    run(&settings, LOCAL_FILE, &["foo", "--create", "--filename", "a.txt"]).unwrap();
    let before = snapshot(&settings);

    let err = run(&settings, LOCAL_FILE, &["foo", "--create", "--filename", "b.txt"]).unwrap_err();
    assert!(matches!(err, SigexError::DuplicateCollab(ref n) if n == "foo"));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(snapshot(&settings), before);
}

#[test]
fn test_cross_api_edit_leaves_store_unchanged() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    run(&settings, LOCAL_FILE, &["foo", "--create", "--filename", "a.txt"]).unwrap();
    let before = snapshot(&settings);

    let err = run(&settings, FB_THREATEXCHANGE, &["foo", "--privacy-group", "5"]).unwrap_err();
    assert!(matches!(err, SigexError::CrossApi { ref existing, .. } if existing == LOCAL_FILE));
    assert!(err.to_string().contains("delete that one first"));
    assert_eq!(snapshot(&settings), before);
}

#[test]
fn test_cross_api_via_json_payload() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    run(&settings, LOCAL_FILE, &["foo", "--create", "--filename", "a.txt"]).unwrap();
    let err = run(
        &settings,
        LOCAL_FILE,
        &["--json", r#"{"name": "foo", "api": "ncmec"}"#],
    )
    .unwrap_err();
    assert!(matches!(err, SigexError::CrossApi { .. }));
}

#[test]
fn test_edit_only_touches_supplied_fields() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    run(
        &settings,
        LOCAL_FILE,
        &["foo", "--create", "--filename", "a.txt", "--signal-type", "pdq"],
    )
    .unwrap();
    run(&settings, LOCAL_FILE, &["foo", "--disable"]).unwrap();

    let stored = settings.collab_store().find("foo").unwrap().unwrap();
    assert!(!stored.enabled);
    assert_eq!(stored.attribute("filename"), Some(&json!("a.txt")));
    assert_eq!(stored.attribute("signal_type"), Some(&json!("pdq")));

    run(&settings, LOCAL_FILE, &["foo", "--enable"]).unwrap();
    assert!(settings.collab_store().find("foo").unwrap().unwrap().enabled);
}

#[test]
fn test_create_missing_required_field() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    let err = run(&settings, FB_THREATEXCHANGE, &["te", "--create"]).unwrap_err();
    assert_eq!(err.to_string(), "Missing required field: --privacy-group");
    assert_eq!(err.exit_code(), 2);
    assert!(snapshot(&settings).is_empty());
}

#[test]
fn test_enum_rejects_non_member() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    let err = run(&settings, NCMEC, &["n", "--create", "--environment", "Staging"]).unwrap_err();
    assert!(matches!(err, SigexError::UserInput(_)));
}

#[test]
fn test_create_with_json_payload() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();

    let outcome = run(
        &settings,
        FB_THREATEXCHANGE,
        &[
            "--create",
            "--json",
            r#"{"name": "bulk", "enabled": false, "privacy_group": 3}"#,
            "--privacy-group",
            "4",
        ],
    )
    .unwrap();

    let config = outcome.config();
    assert_eq!(config.name, "bulk");
    assert!(config.enabled);
    assert_eq!(config.attribute("privacy_group"), Some(&json!(4)));
}

#[test]
fn test_delete() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();
    let store = settings.collab_store();
    let mediator = CollabMediator::new(&store);

    run(&settings, LOCAL_FILE, &["foo", "-C", "--filename", "a.txt"]).unwrap();
    run(&settings, LOCAL_FILE, &["bar", "-C", "--filename", "b.txt"]).unwrap();

    let err = mediator.delete("baz").unwrap_err();
    assert!(matches!(err, SigexError::CollabNotFound(_)));
    assert_eq!(mediator.list().unwrap().len(), 2);

    mediator.delete("foo").unwrap();
    let names: Vec<_> = mediator.list().unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["bar"]);
}

#[test]
fn test_import_creates_once() {
    let db = Database::in_memory().unwrap();
    let settings = Settings::load(&db, ExtensionCatalog::builtin()).unwrap();
    let store = settings.collab_store();
    let mediator = CollabMediator::new(&store);
    let schema = &settings.apis().get(FB_THREATEXCHANGE).unwrap().schema;

    let mut fields = sigex_core::command::EditSet::new();
    fields.set("privacy_group", json!(77));

    let created = mediator.import("Remote Group", schema, fields.clone()).unwrap();
    assert_eq!(created.name, "Remote Group");
    assert!(created.enabled);

    let err = mediator.import("Remote Group", schema, fields).unwrap_err();
    assert!(matches!(err, SigexError::DuplicateCollab(_)));
    assert_eq!(mediator.list().unwrap().len(), 1);
}
