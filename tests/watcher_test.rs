mod common;

use common::{create_test_log, json_line, plain_line};
use loganalyzer::{LogEntry, LogLevel, LogWatcher, WatchConfig, WatchState};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
}

fn padded_content(len: usize) -> String {
    // newline-terminated free-text lines summing to exactly `len` bytes
    const HEAD: &str = "[2024-01-20 10:00:00] INFO: ";
    let mut content = String::new();
    while content.len() + 40 <= len {
        content.push_str(HEAD);
        content.push_str(&"a".repeat(39 - HEAD.len()));
        content.push('\n');
    }
    let rest = len - content.len();
    if rest > 0 {
        content.push_str(&"b".repeat(rest - 1));
        content.push('\n');
    }
    content
}

#[test]
fn test_appended_record_after_seek_to_end() {
    let dir = TempDir::new().unwrap();
    let content = padded_content(100);
    assert_eq!(content.len(), 100);
    let path = create_test_log(dir.path(), "app.log", &content).unwrap();

    let mut watcher = LogWatcher::new(WatchConfig::new(&path), Vec::<LogEntry>::new());
    watcher.open().unwrap();
    assert_eq!(watcher.offset(), 100);
    assert_eq!(watcher.read_new_lines().unwrap(), 0);

    let appended = "{\"level\":\"INFO\",\"message\":\"x\"}\n";
    append(&path, appended);

    assert_eq!(watcher.read_new_lines().unwrap(), 1);
    assert_eq!(watcher.offset(), 100 + appended.len() as u64);

    let emitted = watcher.sink();
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].level(), LogLevel::Info);
    assert_eq!(emitted[0].message(), "x");
}

#[test]
fn test_truncation_resets_offset_and_rereads() {
    let dir = TempDir::new().unwrap();
    let path = create_test_log(dir.path(), "app.log", &padded_content(500)).unwrap();

    let mut watcher = LogWatcher::new(WatchConfig::new(&path), Vec::<LogEntry>::new());
    watcher.open().unwrap();
    assert_eq!(watcher.offset(), 500);

    let mut shrunk = String::new();
    shrunk.push_str(&plain_line("2024-01-20 10:00:00", "WARN", "after rotation"));
    while shrunk.len() < 49 {
        shrunk.insert(0, ' ');
    }
    shrunk.insert(0, '\n');
    assert_eq!(shrunk.len(), 50);
    fs::write(&path, &shrunk).unwrap();

    assert_eq!(watcher.read_new_lines().unwrap(), 1);
    assert_eq!(watcher.offset(), 50);
    assert_eq!(watcher.sink()[0].message(), "after rotation");
    assert_eq!(watcher.sink()[0].level(), LogLevel::Warn);
}

#[test]
fn test_rotation_to_new_file_at_same_path() {
    let dir = TempDir::new().unwrap();
    let path = create_test_log(dir.path(), "app.log", &padded_content(200)).unwrap();

    let mut watcher = LogWatcher::new(WatchConfig::new(&path), Vec::<LogEntry>::new());
    watcher.open().unwrap();

    fs::rename(&path, dir.path().join("app.log.1")).unwrap();
    fs::write(&path, plain_line("2024-01-20 11:00:00", "ERROR", "fresh file")).unwrap();

    assert_eq!(watcher.read_new_lines().unwrap(), 1);
    assert_eq!(watcher.sink()[0].message(), "fresh file");
}

#[test]
fn test_rotation_to_larger_file_is_followed() {
    let dir = TempDir::new().unwrap();
    let path = create_test_log(dir.path(), "app.log", &padded_content(40)).unwrap();

    let mut watcher = LogWatcher::new(WatchConfig::new(&path), Vec::<LogEntry>::new());
    watcher.open().unwrap();
    assert_eq!(watcher.offset(), 40);

    fs::rename(&path, dir.path().join("app.log.1")).unwrap();
    let mut fresh = plain_line("2024-01-20 11:00:00", "INFO", "first in new file");
    fresh.push_str(&plain_line("2024-01-20 11:00:01", "INFO", "second in new file"));
    assert!(fresh.len() > 40);
    fs::write(&path, &fresh).unwrap();

    assert_eq!(watcher.read_new_lines().unwrap(), 2);
    assert_eq!(watcher.offset(), fresh.len() as u64);

    let appended = plain_line("2024-01-20 11:00:02", "ERROR", "appended after rotation");
    append(&path, &appended);
    assert_eq!(watcher.read_new_lines().unwrap(), 1);

    append(&path, &plain_line("2024-01-20 11:00:03", "WARN", "and another"));
    assert_eq!(watcher.read_new_lines().unwrap(), 1);

    let messages: Vec<&str> = watcher.sink().iter().map(|e| e.message()).collect();
    assert_eq!(
        messages,
        vec![
            "first in new file",
            "second in new file",
            "appended after rotation",
            "and another"
        ]
    );
    assert_eq!(
        watcher.offset(),
        fs::metadata(&path).unwrap().len()
    );
}

#[test]
fn test_truncated_in_place_keeps_following() {
    let dir = TempDir::new().unwrap();
    let path = create_test_log(dir.path(), "app.log", &padded_content(200)).unwrap();

    let mut watcher = LogWatcher::new(WatchConfig::new(&path), Vec::<LogEntry>::new());
    watcher.open().unwrap();

    // same inode, shorter contents
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(0).unwrap();
    drop(file);
    append(&path, &plain_line("2024-01-20 12:00:00", "INFO", "after truncate"));

    assert_eq!(watcher.read_new_lines().unwrap(), 1);
    assert_eq!(watcher.sink()[0].message(), "after truncate");
}

#[test]
fn test_filters_and_statistics() {
    let dir = TempDir::new().unwrap();
    let path = create_test_log(dir.path(), "app.log", "").unwrap();

    let mut config = WatchConfig::new(&path);
    config.min_level = Some(LogLevel::Warn);
    config.pattern = Some("disk".to_string());
    let mut watcher = LogWatcher::new(config, Vec::<LogEntry>::new());
    watcher.open().unwrap();

    append(&path, &plain_line("2024-01-20 10:00:00", "ERROR", "disk full"));
    append(&path, &plain_line("2024-01-20 10:00:01", "INFO", "disk ok"));
    append(&path, &plain_line("2024-01-20 10:00:02", "ERROR", "network down"));
    append(&path, &plain_line("2024-01-20 10:00:03", "WARN", "disk slow"));

    assert_eq!(watcher.read_new_lines().unwrap(), 2);
    assert_eq!(watcher.statistics().total_entries, 2);
    assert_eq!(watcher.statistics().level_count(LogLevel::Error), 1);
    assert_eq!(watcher.statistics().level_count(LogLevel::Warn), 1);
}

#[tokio::test]
async fn test_watch_delivers_appends_until_shutdown() {
    let dir = TempDir::new().unwrap();
    let path = create_test_log(dir.path(), "live.log", &padded_content(80)).unwrap();

    let (entry_tx, mut entry_rx) = mpsc::unbounded_channel::<LogEntry>();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let mut config = WatchConfig::new(&path);
    config.poll_interval = Duration::from_millis(50);
    let handle = tokio::spawn(async move {
        let mut watcher = LogWatcher::new(config, entry_tx);
        watcher.open().unwrap();
        let result = watcher
            .watch(async {
                let _ = stop_rx.await;
            })
            .await;
        (result, watcher.state())
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    append(&path, &json_line("2024-01-20T10:00:00Z", "ERROR", "live one"));

    let received = tokio::time::timeout(Duration::from_secs(5), entry_rx.recv())
        .await
        .expect("no entry within timeout")
        .expect("channel closed");
    assert_eq!(received.message(), "live one");

    stop_tx.send(()).unwrap();
    let (result, state) = handle.await.unwrap();
    assert!(result.is_ok());
    assert_eq!(state, WatchState::Stopped);
}
