//! Directory-level driver: one merge per class folder under a root.

use crate::config::MergeConfig;
use crate::error::MergeError;
use crate::io::csv::{read_table, write_table};
use crate::merge::offset::merge_tables;
use crate::merge::order::{extract_ex_number, file_name_of, natural_sort};
use crate::report::{ClassReport, ClassStatus, FileReport, RunSummary};
use crate::table::SourceTable;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Immediate subdirectories of `root`, sorted by path.
pub fn class_folders(root: &Path) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("listing {}", root.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            folders.push(path);
        }
    }
    folders.sort();
    Ok(folders)
}

/// Files directly inside `folder` with the given extension, in natural order.
pub fn class_files(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder).with_context(|| format!("listing {}", folder.display()))? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(natural_sort(files))
}

/// Read every file, logging and dropping the ones that fail to parse.
fn read_sources(files: &[PathBuf], report: &mut ClassReport) -> Vec<SourceTable> {
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let name = file_name_of(path);
        let mut file = FileReport {
            name: name.clone(),
            ordinal: extract_ex_number(&name),
            rows: 0,
            columns: 0,
        };
        info!("  {}: {}", file.label(), name);
        match read_table(path) {
            Ok(table) => {
                file.rows = table.len();
                file.columns = table.width();
                report.files.push(file);
                report.input_rows += table.len();
                sources.push(SourceTable::new(name, table));
            }
            Err(err) => warn!("  Error reading {}: {:#}", name, err),
        }
    }
    sources
}

/// Merge one class folder and write `<output_base>/<class>/<class>_merged.<ext>`.
///
/// Never fails: problems are logged and recorded in the returned report.
pub fn process_class(folder: &Path, output_base: &Path, config: &MergeConfig) -> ClassReport {
    let class = file_name_of(folder);
    let mut report = ClassReport::new(class.clone());
    info!("");
    info!("{}", "=".repeat(60));
    info!("Processing Class: {}", class);
    info!("{}", "=".repeat(60));

    let files = match class_files(folder, &config.extension) {
        Ok(files) => files,
        Err(err) => {
            warn!("  Could not list {}: {:#}", folder.display(), err);
            report.status = ClassStatus::Failed(format!("{:#}", err));
            return report;
        }
    };
    if files.is_empty() {
        warn!("  No {} files found in {}", config.extension, class);
        return report;
    }
    info!("Found {} file(s):", files.len());

    let sources = read_sources(&files, &mut report);
    if sources.is_empty() {
        warn!("  {}", MergeError::EmptyClass { class });
        return report;
    }

    info!("");
    info!("  Merging {} file(s) vertically...", sources.len());
    let outcome = match merge_tables(&sources, &config.target_column) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("  Merge failed: {}", err);
            report.status = ClassStatus::Failed(err.to_string());
            return report;
        }
    };
    report.skipped = outcome.skipped;
    report.segments = outcome.segments;
    report.output_rows = outcome.table.len();
    report.output_columns = outcome.table.width();
    info!(
        "  Merged table: {} rows x {} columns",
        report.output_rows, report.output_columns
    );

    let output_path = output_base
        .join(&class)
        .join(format!("{}_merged.{}", class, config.extension));
    match write_table(&output_path, &outcome.table) {
        Ok(()) => {
            info!("  Saved: {}", output_path.display());
            report.status = ClassStatus::Merged;
            report.output_path = Some(output_path);
        }
        Err(err) => {
            warn!("  Could not save {}: {:#}", output_path.display(), err);
            report.status = ClassStatus::Failed(format!("{:#}", err));
        }
    }
    report
}

/// Merge every class folder under `root` into `config.output_dir`.
///
/// Only a missing root or an unlistable root aborts the run.
pub fn run(root: &Path, config: &MergeConfig) -> Result<RunSummary> {
    if !root.is_dir() {
        return Err(MergeError::MissingRoot {
            path: root.to_path_buf(),
        }
        .into());
    }
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;

    info!("");
    info!("Starting CSV Merger");
    info!("Root Directory: {}", root.display());
    info!("Output Directory: {}", config.output_dir.display());

    let folders = class_folders(root)?;
    let mut summary = RunSummary {
        root: root.to_path_buf(),
        output_dir: config.output_dir.clone(),
        classes: Vec::with_capacity(folders.len()),
    };
    if folders.is_empty() {
        warn!("No class folders found!");
        return Ok(summary);
    }
    let names: Vec<String> = folders.iter().map(|f| file_name_of(f)).collect();
    info!("");
    info!("Found {} class(es): {:?}", folders.len(), names);

    for folder in &folders {
        summary
            .classes
            .push(process_class(folder, &config.output_dir, config));
    }
    summary.log_summary();
    Ok(summary)
}
