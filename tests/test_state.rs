use tempfile::TempDir;
use xmt_mutator::Error;
use xmt_mutator::mutants::{MutationDescriptor, WorkItem, WorkResult, WorkerOutcome};
use xmt_mutator::state::{self, JsonWorkStore, Session, WorkStore};
use xmt_mutator::syntax::Position;

fn work_item(job_id: &str) -> WorkItem {
    WorkItem {
        job_id: job_id.into(),
        mutations: vec![MutationDescriptor {
            operator_name: "cr_xmt/xmt/function-return".into(),
            occurrence: 0,
            module_path: "src/target.py".into(),
            start_pos: Position::new(2, 4),
            end_pos: Position::new(3, 12),
        }],
    }
}

fn skipped() -> WorkResult {
    WorkResult {
        output: "Filtered no covered.".into(),
        worker_outcome: WorkerOutcome::Skipped,
    }
}

#[test]
fn work_item_serializes_positions_as_pairs() {
    let json = serde_json::to_string(&work_item("j1")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["job_id"], "j1");
    let m = &parsed["mutations"][0];
    assert_eq!(m["operator_name"], "cr_xmt/xmt/function-return");
    assert_eq!(m["occurrence"], 0);
    assert_eq!(m["module_path"], "src/target.py");
    assert_eq!(m["start_pos"], serde_json::json!([2, 4]));
    assert_eq!(m["end_pos"], serde_json::json!([3, 12]));
}

#[test]
fn work_result_outcome_is_lowercase() {
    let json = serde_json::to_string(&skipped()).unwrap();
    assert!(json.contains("\"worker_outcome\":\"skipped\""));
}

#[test]
fn create_add_and_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let mut store = JsonWorkStore::open_or_create(&path).unwrap();
    assert!(store.pending_work_items().unwrap().is_empty());
    store.add_work_items(vec![work_item("j1"), work_item("j2")]).unwrap();
    assert!(path.exists(), "session file should be written");

    let reopened = JsonWorkStore::open(&path).unwrap();
    let pending: Vec<_> = reopened
        .pending_work_items()
        .unwrap()
        .into_iter()
        .map(|i| i.job_id)
        .collect();
    assert_eq!(pending, ["j1", "j2"]);
}

#[test]
fn results_are_persisted_and_hide_items_from_pending() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let mut store = JsonWorkStore::open_or_create(&path).unwrap();
    store
        .add_work_items(vec![work_item("j1"), work_item("j2"), work_item("j3")])
        .unwrap();
    store
        .set_multiple_results(&["j1".to_string(), "j3".to_string()], &skipped())
        .unwrap();

    let reopened = JsonWorkStore::open(&path).unwrap();
    assert_eq!(reopened.result("j1"), Some(&skipped()));
    assert_eq!(reopened.result("j3"), Some(&skipped()));
    assert_eq!(reopened.result("j2"), None);
    let pending = reopened.pending_work_items().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].job_id, "j2");
    assert_eq!(reopened.session().work_items.len(), 3);
}

#[test]
fn no_temporary_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let mut store = JsonWorkStore::open_or_create(&path).unwrap();
    store.add_work_items(vec![work_item("j1")]).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["session.json"]);
}

#[test]
fn failed_add_leaves_session_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing_dir").join("session.json");

    let mut store = JsonWorkStore::open_or_create(&path).unwrap();
    let err = store.add_work_items(vec![work_item("j1")]).unwrap_err();
    assert!(matches!(err, Error::Write { .. }));
    assert!(store.pending_work_items().unwrap().is_empty());
    assert!(store.session().work_items.is_empty());
    assert!(!path.exists());
}

#[test]
fn failed_result_write_leaves_session_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let mut store = JsonWorkStore::open_or_create(&path).unwrap();
    store.add_work_items(vec![work_item("j1")]).unwrap();

    // A directory where the temporary file should go makes the write fail.
    std::fs::create_dir(dir.path().join("session.json.tmp")).unwrap();
    let err = store
        .set_multiple_results(&["j1".to_string()], &skipped())
        .unwrap_err();
    assert!(matches!(err, Error::Write { .. }));
    assert_eq!(store.result("j1"), None);
    assert_eq!(store.pending_work_items().unwrap().len(), 1);
}

#[test]
fn open_missing_session_fails() {
    let err = JsonWorkStore::open(std::path::Path::new("/nonexistent/session.json")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn open_invalid_session_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not valid json").unwrap();
    assert!(matches!(JsonWorkStore::open(&path), Err(Error::Json { .. })));
}

#[test]
fn session_file_without_results_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"work_items": []}"#).unwrap();
    let session: Session = state::load_from_path(&path).unwrap();
    assert!(session.results.is_empty());
}
