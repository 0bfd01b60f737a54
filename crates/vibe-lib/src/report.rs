use crate::merge::SegmentReport;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One input file that was read successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub name: String,
    pub ordinal: Option<u64>,
    pub rows: usize,
    pub columns: usize,
}

impl FileReport {
    /// `Ex<n>` for numbered files, `Unknown` otherwise.
    pub fn label(&self) -> String {
        match self.ordinal {
            Some(n) => format!("Ex{}", n),
            None => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Merged,
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub class: String,
    pub status: ClassStatus,
    pub files: Vec<FileReport>,
    /// Readable files left out of the merge for lack of a time column.
    pub skipped: Vec<String>,
    pub segments: Vec<SegmentReport>,
    pub input_rows: usize,
    pub output_rows: usize,
    pub output_columns: usize,
    pub output_path: Option<PathBuf>,
}

impl ClassReport {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            status: ClassStatus::Empty,
            files: Vec::new(),
            skipped: Vec::new(),
            segments: Vec::new(),
            input_rows: 0,
            output_rows: 0,
            output_columns: 0,
            output_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub classes: Vec<ClassReport>,
}

impl RunSummary {
    pub fn merged_classes(&self) -> usize {
        self.classes
            .iter()
            .filter(|c| c.status == ClassStatus::Merged)
            .count()
    }

    /// Log a per-class audit block: files read, rows in and out, columns.
    pub fn log_summary(&self) {
        info!("");
        info!("{}", "=".repeat(60));
        info!("SUMMARY");
        info!("{}", "=".repeat(60));
        for class in &self.classes {
            info!("");
            info!("Class: {}", class.class);
            match &class.status {
                ClassStatus::Merged => {}
                ClassStatus::Empty => info!("   Status: no readable tables, nothing written"),
                ClassStatus::Failed(reason) => info!("   Status: failed ({})", reason),
            }
            info!("   Files processed: {}", class.files.len());
            info!("   Total rows: {}", class.output_rows);
            info!("   Total columns: {}", class.output_columns);
            if let Some(path) = &class.output_path {
                info!("   Output file: {}", path.display());
            }
            if !class.files.is_empty() {
                info!("   Individual file details:");
                for file in &class.files {
                    info!(
                        "     - {}: {} ({} rows, {} cols)",
                        file.label(),
                        file.name,
                        file.rows,
                        file.columns
                    );
                }
                for name in &class.skipped {
                    info!("     - skipped (no time column): {}", name);
                }
                info!("   Input rows total: {}", class.input_rows);
                info!("   Output rows: {}", class.output_rows);
            }
        }
    }
}
