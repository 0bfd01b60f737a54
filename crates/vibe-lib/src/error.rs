use std::path::PathBuf;
use thiserror::Error;

/// Failures the merger distinguishes from plain I/O trouble.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    /// No header in the table contains the target token.
    #[error("no time column matching '{target}' in {file}")]
    MissingTimeColumn { file: String, target: String },

    /// The root directory does not exist or is not a directory.
    #[error("root path does not exist or is not a directory: {}", path.display())]
    MissingRoot { path: PathBuf },

    /// A class folder produced no readable tables.
    #[error("no readable tables in class '{class}'")]
    EmptyClass { class: String },

    /// A time cell that does not parse as a float; `row` is 1-based.
    #[error("time value '{value}' in {file} (row {row}) is not numeric")]
    NonNumericTime {
        file: String,
        row: usize,
        value: String,
    },
}
