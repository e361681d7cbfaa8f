use storage::repository::{LocalStore, Storage};
use storage::sqlite::SqliteRepository;
use tenses_core::model::{PackId, ProgressSnapshot};
use tenses_core::time::fixed_now;

#[tokio::test]
async fn sqlite_kv_overwrites_and_reads_back() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get("progress").await.unwrap(), None);
    repo.set("progress", "{\"a\":1}").await.unwrap();
    repo.set("progress", "{\"a\":2}").await.unwrap();
    assert_eq!(
        repo.get("progress").await.unwrap().as_deref(),
        Some("{\"a\":2}")
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");
    repo.set("k", "v").await.unwrap();
}

#[tokio::test]
async fn snapshot_survives_reopen_of_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("progress.sqlite3").display());

    let mut snapshot = ProgressSnapshot::new();
    snapshot.record_attempt(&PackId::new("present-simple-1"), 2, false, fixed_now());
    snapshot.complete_pack(&PackId::new("present-simple-1"));

    {
        let storage = Storage::sqlite(&url).await.expect("open");
        storage
            .local
            .set("progress", &snapshot.to_json().unwrap())
            .await
            .unwrap();
    }

    let storage = Storage::sqlite(&url).await.expect("reopen");
    let raw = storage.local.get("progress").await.unwrap().expect("stored");
    assert_eq!(ProgressSnapshot::from_json(&raw).unwrap(), snapshot);
}
