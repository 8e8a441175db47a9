use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no .{extension} files found in {}", dir.display())]
    NoFilesFound { dir: PathBuf, extension: String },

    #[error("file discovery failed: {0}")]
    Discovery(String),

    #[error("file notification failed: {0}")]
    Notification(#[from] notify::Error),

    #[error("encountered {} errors during processing", failures.len())]
    PartialFailure { failures: Vec<WorkerFailure> },

    #[error("analysis worker {worker} stopped unexpectedly")]
    WorkerPanicked { worker: usize },
}

impl AnalyzerError {
    pub fn file_access(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AnalyzerError::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Per-file failures when this is a partial result, else empty.
    pub fn failures(&self) -> &[WorkerFailure] {
        match self {
            AnalyzerError::PartialFailure { failures } => failures,
            _ => &[],
        }
    }
}

/// One file that a worker could not process.
#[derive(Debug)]
pub struct WorkerFailure {
    pub worker: usize,
    pub path: PathBuf,
    pub error: AnalyzerError,
}

impl fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker {} on {}: {}", self.worker, self.path.display(), self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_message() {
        let failures = (0..3)
            .map(|i| WorkerFailure {
                worker: i,
                path: PathBuf::from(format!("f{i}.log")),
                error: AnalyzerError::file_access(
                    format!("f{i}.log"),
                    io::Error::new(io::ErrorKind::NotFound, "gone"),
                ),
            })
            .collect();
        let err = AnalyzerError::PartialFailure { failures };

        assert_eq!(err.to_string(), "encountered 3 errors during processing");
        assert_eq!(err.failures().len(), 3);
        assert!(err.failures()[1].to_string().starts_with("worker 1 on f1.log"));
    }

    #[test]
    fn test_no_files_message() {
        let err = AnalyzerError::NoFilesFound {
            dir: PathBuf::from("/var/log/app"),
            extension: "log".into(),
        };
        assert_eq!(err.to_string(), "no .log files found in /var/log/app");
        assert!(err.failures().is_empty());
    }
}
