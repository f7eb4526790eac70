//! Watcher integration tests against a real temp directory.

use kalycs_catalog::{texts_to_json, Catalog, FileRecord, Project, Rule, RuleKind};
use kalycs_classifier::Classifier;
use kalycs_watcher::{DownloadsWatcher, WatchError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn setup(watch_dir: &Path) -> (Catalog, Arc<Classifier>, DownloadsWatcher) {
    let catalog = Catalog::open_in_memory().await.unwrap();
    let classifier = Arc::new(Classifier::new(catalog.clone()));
    classifier.load_incoming_project().await.unwrap();
    classifier.reload().await.unwrap();

    let token = CancellationToken::new();
    let watcher = DownloadsWatcher::new(&token, watch_dir, Arc::clone(&classifier)).unwrap();

    (catalog, classifier, watcher)
}

async fn wait_for_file(catalog: &Catalog, path: &Path) -> Option<FileRecord> {
    let key = path.to_string_lossy().into_owned();
    for _ in 0..100 {
        if let Some(file) = catalog.get_file_by_path(&key).await.unwrap() {
            return Some(file);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    None
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropped_file_is_classified() {
    let tmp = TempDir::new().unwrap();
    let (catalog, classifier, mut watcher) = setup(tmp.path()).await;
    watcher.start();

    let path = tmp.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    let file = wait_for_file(&catalog, &path)
        .await
        .expect("file should be classified");
    assert_eq!(file.name, "notes.txt");
    assert_eq!(file.ext, "txt");
    assert_eq!(file.project_id.as_deref(), classifier.incoming_project_id());

    watcher.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn matching_rule_assigns_the_project() {
    let tmp = TempDir::new().unwrap();
    let (catalog, classifier, mut watcher) = setup(tmp.path()).await;

    let mut project = Project::new("Logs");
    catalog.create_project(&mut project).await.unwrap();
    let mut rule = Rule::new(&project.id, "log files", RuleKind::Extension, texts_to_json(&["log"]));
    catalog.create_rule(&mut rule).await.unwrap();
    classifier.reload().await.unwrap();

    watcher.start();

    let path = tmp.path().join("server.log");
    std::fs::write(&path, "boot").unwrap();

    let file = wait_for_file(&catalog, &path)
        .await
        .expect("file should be classified");
    assert_eq!(file.project_id.as_deref(), Some(project.id.as_str()));

    watcher.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_renamed_into_the_watched_dir_is_classified() {
    let tmp = TempDir::new().unwrap();
    let outside = tmp.path().join("outside");
    let watched = tmp.path().join("watched");
    std::fs::create_dir(&outside).unwrap();
    std::fs::create_dir(&watched).unwrap();

    let (catalog, classifier, mut watcher) = setup(&watched).await;

    let mut project = Project::new("Logs");
    catalog.create_project(&mut project).await.unwrap();
    let mut rule = Rule::new(&project.id, "log files", RuleKind::Extension, texts_to_json(&["log"]));
    catalog.create_rule(&mut rule).await.unwrap();
    classifier.reload().await.unwrap();

    watcher.start();

    let source = outside.join("a.tmp");
    std::fs::write(&source, "payload").unwrap();
    let target = watched.join("server.log");
    std::fs::rename(&source, &target).unwrap();

    let file = wait_for_file(&catalog, &target)
        .await
        .expect("renamed file should be classified");
    assert_eq!(file.name, "server.log");
    assert_eq!(file.project_id.as_deref(), Some(project.id.as_str()));

    watcher.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rename_within_the_watched_dir_reclassifies_the_new_path() {
    let tmp = TempDir::new().unwrap();
    let (catalog, _classifier, mut watcher) = setup(tmp.path()).await;
    watcher.start();

    let original = tmp.path().join("draft.txt");
    std::fs::write(&original, "v1").unwrap();
    wait_for_file(&catalog, &original)
        .await
        .expect("original file should be classified");

    let renamed = tmp.path().join("final.txt");
    std::fs::rename(&original, &renamed).unwrap();

    let file = wait_for_file(&catalog, &renamed)
        .await
        .expect("renamed file should be classified at its new path");
    assert_eq!(file.name, "final.txt");

    // Cleanup of the old row is out of scope; it stays behind.
    let stale = catalog
        .get_file_by_path(&original.to_string_lossy())
        .await
        .unwrap();
    assert!(stale.is_some());

    watcher.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn directory_creation_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let (catalog, _classifier, mut watcher) = setup(tmp.path()).await;
    watcher.start();

    let subdir = tmp.path().join("archive");
    std::fs::create_dir(&subdir).unwrap();

    // A marker file proves events flowed; the directory itself must not.
    let marker = tmp.path().join("marker.txt");
    std::fs::write(&marker, "x").unwrap();
    wait_for_file(&catalog, &marker)
        .await
        .expect("marker file should be classified");

    let dir_row = catalog
        .get_file_by_path(&subdir.to_string_lossy())
        .await
        .unwrap();
    assert!(dir_row.is_none());

    watcher.stop();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_is_idempotent_and_halts_classification() {
    let tmp = TempDir::new().unwrap();
    let (catalog, _classifier, mut watcher) = setup(tmp.path()).await;
    watcher.start();

    watcher.stop();
    watcher.stop();

    // Give the loop time to observe cancellation and release the watch.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let path = tmp.path().join("late.txt");
    std::fs::write(&path, "too late").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let row = catalog
        .get_file_by_path(&path.to_string_lossy())
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn construction_fails_for_missing_directories() {
    let tmp = TempDir::new().unwrap();
    let catalog = Catalog::open_in_memory().await.unwrap();
    let classifier = Arc::new(Classifier::new(catalog));

    let missing = tmp.path().join("nope");
    let token = CancellationToken::new();
    let err = DownloadsWatcher::new(&token, &missing, classifier).unwrap_err();
    assert!(matches!(err, WatchError::NotADirectory(_)));
}
