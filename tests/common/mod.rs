#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub fn create_test_log(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

pub fn json_line(timestamp: &str, level: &str, message: &str) -> String {
    format!(
        "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":\"{}\"}}\n",
        timestamp, level, message
    )
}

pub fn plain_line(timestamp: &str, level: &str, message: &str) -> String {
    format!("[{}] {}: {}\n", timestamp, level, message)
}

/// A file mixing both formats with a known level distribution:
/// `count` lines cycling INFO, WARN, ERROR, DEBUG.
pub fn mixed_content(count: usize, seed: usize) -> String {
    const LEVELS: [&str; 4] = ["INFO", "WARN", "ERROR", "DEBUG"];
    let mut content = String::new();
    for i in 0..count {
        let level = LEVELS[(i + seed) % LEVELS.len()];
        let timestamp = format!("2024-01-20 {:02}:{:02}:{:02}", (i / 3600) % 24, (i / 60) % 60, i % 60);
        let message = format!("event {} from set {}", i, seed);
        if i % 2 == 0 {
            content.push_str(&json_line(&timestamp, level, &message));
        } else {
            content.push_str(&plain_line(&timestamp, level, &message));
        }
    }
    content
}
