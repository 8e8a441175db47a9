use crate::error::{AnalyzerError, Result};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Enumerates log files under a directory tree.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    extension: String,
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new("log")
    }
}

impl FileDiscovery {
    /// `extension` may be given with or without the leading dot.
    pub fn new(extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// All regular files below `dir` (recursively) with the configured
    /// extension, sorted by path. An empty result is not an error here.
    pub fn find_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(AnalyzerError::file_access(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let pattern = dir.join("**").join(format!("*.{}", self.extension));
        let paths = glob(&pattern.to_string_lossy())
            .map_err(|e| AnalyzerError::Discovery(e.to_string()))?;

        let mut files = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                // unreadable subdirectories are skipped, not fatal
                Err(e) => warn!(path = %e.path().display(), error = %e, "Skipping unreadable path"),
            }
        }
        files.sort();

        debug!(dir = %dir.display(), count = files.len(), extension = %self.extension, "Discovered log files");
        Ok(files)
    }
}
