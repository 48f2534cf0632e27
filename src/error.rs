use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort a pipeline run.
///
/// Each variant maps to a process exit code so the binary can report *why* a
/// run stopped without parsing the message:
///
/// - `2`: bad input location or options
/// - `3`: nothing usable survived ingestion
/// - `4`: output could not be produced
#[derive(Debug, Error)]
pub enum AppError {
    /// The input directory is missing, not a directory, or has no CSV files.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Every input file was skipped, failed, or contained no usable rows.
    #[error("No valid data: {files} file(s) scanned, none produced usable `timestamp`/`kwh` rows")]
    NoValidData { files: usize },

    /// An output artifact could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dashboard could not be drawn.
    #[error("Failed to render dashboard: {0}")]
    Render(String),

    /// Synthetic input data could not be generated.
    #[error("Failed to generate sample data: {0}")]
    Sample(String),
}

impl AppError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Configuration(_) => 2,
            AppError::NoValidData { .. } => 3,
            AppError::Write { .. } | AppError::Render(_) | AppError::Sample(_) => 4,
        }
    }
}
