// Tests for the file-backed ledger: allocation, persistence, lookup and the
// auth cache.

use chrono::{Duration, Utc};
use partmark::candidate::{DatasheetLinks, LabelRecord, ProviderKind};
use partmark::error::PartmarkError;
use partmark::ledger::LedgerStore;
use tempfile::TempDir;

fn record(number: &str, model: &str) -> LabelRecord {
    LabelRecord {
        inventory_number: number.to_string(),
        model: model.to_string(),
        description: format!("{model} description"),
        properties: vec![("Voltage".to_string(), "5V".to_string())],
        datasheet: Some(DatasheetLinks::One("https://ds.example/a.pdf".to_string())),
        provider: ProviderKind::Lcsc,
        source_url: "https://example.com/a".to_string(),
    }
}

fn temp_store() -> (TempDir, LedgerStore) {
    let dir = TempDir::new().unwrap();
    let store = LedgerStore::load(dir.path().join("ledger.json")).unwrap();
    (dir, store)
}

#[test]
fn missing_file_starts_an_empty_ledger() {
    let (dir, store) = temp_store();
    assert!(store.is_empty());
    assert_eq!(store.next_inventory_number(), "000001");
    // The empty ledger was written out immediately.
    assert!(dir.path().join("ledger.json").exists());
}

#[test]
fn malformed_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = LedgerStore::load(&path).map(|_| ()).unwrap_err();
    assert!(
        matches!(err, PartmarkError::Persistence { .. }),
        "expected persistence error, got {err:?}"
    );
}

#[test]
fn consecutive_assignments_have_no_gaps() {
    let (_dir, store) = temp_store();

    for expected in 1..=5u64 {
        let number = store.next_inventory_number();
        assert_eq!(number, format!("{expected:06}"));
        store.assign(record(&number, &format!("PART-{expected}"))).unwrap();
    }

    assert_eq!(store.len(), 5);
    assert_eq!(store.next_inventory_number(), "000006");
}

#[test]
fn assignments_survive_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");

    {
        let store = LedgerStore::load(&path).unwrap();
        store.assign(record("000123", "LM358N")).unwrap();
    }

    let store = LedgerStore::load(&path).unwrap();
    assert_eq!(store.next_inventory_number(), "000124");
    let stored = store.get("000123").expect("record persisted");
    assert_eq!(stored.model, "LM358N");
    assert_eq!(
        stored.datasheet,
        Some(DatasheetLinks::One("https://ds.example/a.pdf".to_string()))
    );

    // The rewrite is rename-based; no temp file may linger.
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn get_unknown_number_mutates_nothing() {
    let (_dir, store) = temp_store();
    store.assign(record("000001", "LM358N")).unwrap();

    assert!(store.get("999999").is_none());
    assert_eq!(store.len(), 1);
    assert_eq!(store.next_inventory_number(), "000002");
}

#[test]
fn find_by_model_matches_both_directions_case_insensitively() {
    let (_dir, store) = temp_store();
    store.assign(record("000001", "LM358N")).unwrap();
    store.assign(record("000002", "NE555")).unwrap();

    // Stored model contains the query.
    let hits = store.find_by_model("lm358");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].inventory_number, "000001");

    // Query contains the stored model.
    let hits = store.find_by_model("ne555 timer dip-8");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].inventory_number, "000002");

    assert!(store.find_by_model("bc547").is_empty());
}

#[test]
fn auth_cache_round_trips_through_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    let expires_at = Utc::now() + Duration::hours(1);

    {
        let store = LedgerStore::load(&path).unwrap();
        assert!(store.cached_auth().is_none());
        store.refresh_auth("tok-abc".to_string(), expires_at).unwrap();
    }

    let store = LedgerStore::load(&path).unwrap();
    let cached = store.cached_auth().expect("auth cache persisted");
    assert_eq!(cached.token, "tok-abc");
    assert_eq!(cached.expires_at, expires_at);
}

#[test]
fn ledger_file_uses_the_documented_field_names() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    let store = LedgerStore::load(&path).unwrap();
    store.assign(record("000007", "BC547")).unwrap();
    store
        .refresh_auth("tok".to_string(), Utc::now() + Duration::hours(1))
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["latestInventoryNumber"], 7);
    assert_eq!(raw["items"]["000007"]["inventoryNumber"], "000007");
    assert_eq!(raw["items"]["000007"]["model"], "BC547");
    // Single datasheet link serializes as a bare string.
    assert_eq!(raw["items"]["000007"]["datasheet"], "https://ds.example/a.pdf");
    assert!(raw["authCache"]["expiresAt"].is_string());
}
