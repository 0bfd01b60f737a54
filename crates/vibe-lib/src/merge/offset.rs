use crate::error::MergeError;
use crate::merge::column::find_matching_column;
use crate::merge::order::{ex_label, extract_ex_number};
use crate::table::{SourceTable, Table};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Per-source timing as it landed in the merged table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub label: String,
    pub file: String,
    pub rows: usize,
    pub first_time: f64,
    pub last_time: f64,
    pub interval: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub table: Table,
    pub time_column: String,
    pub segments: Vec<SegmentReport>,
    /// Files left out because no header matched the target token.
    pub skipped: Vec<String>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Where each output column's cell comes from for one appended source.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellSource {
    Time,
    Column(usize),
    Missing,
}

/// Stitch `sources` into one table with a continuous time column.
///
/// The first source seeds the result and fixes the output header. Every
/// later source is shifted so its first timestamp lands one sampling
/// interval after the previous source's last one; its internal spacing is
/// untouched. Sources are consumed in the order given.
pub fn merge_tables(sources: &[SourceTable], target: &str) -> Result<MergeOutcome, MergeError> {
    let Some(seed) = sources.first() else {
        return Ok(MergeOutcome::default());
    };
    let seed_time_idx = find_matching_column(target, &seed.table.headers)
        .filter(|_| !seed.table.is_empty())
        .ok_or_else(|| MergeError::MissingTimeColumn {
            file: seed.name.clone(),
            target: target.to_string(),
        })?;
    let time_column = seed.table.headers[seed_time_idx].clone();
    info!("  Time column identified: '{}'", time_column);

    let seed_times = parse_times(seed, seed_time_idx)?;
    let n = seed_times.len();
    // A lone row stands in as its own interval.
    let mut interval = if n >= 2 {
        seed_times[n - 1] - seed_times[n - 2]
    } else {
        seed_times[n - 1]
    };
    let mut offset = seed_times[n - 1] + interval;

    let seed_segment = segment(
        seed,
        ex_label(extract_ex_number(&seed.name), 1),
        &seed_times,
        interval,
    );
    log_segment(&seed_segment);
    let mut segments = vec![seed_segment];
    let mut skipped = Vec::new();
    let mut result = seed.table.clone();

    for (pos, source) in sources.iter().enumerate().skip(1) {
        let label = ex_label(extract_ex_number(&source.name), pos + 1);
        let time_idx = match find_matching_column(target, &source.table.headers) {
            Some(idx) if !source.table.is_empty() => idx,
            _ => {
                warn!(
                    "  No time column in {}, skipping...",
                    source.name
                );
                skipped.push(source.name.clone());
                continue;
            }
        };

        let times = parse_times(source, time_idx)?;
        let first = times[0];
        let rebased: Vec<f64> = times.iter().map(|t| t - first + offset).collect();
        let n = rebased.len();
        if n >= 2 {
            interval = rebased[n - 1] - rebased[n - 2];
        }
        offset = rebased[n - 1] + interval;

        let seg = segment(source, label, &rebased, interval);
        log_segment(&seg);
        segments.push(seg);

        let layout = align_columns(&seed.table.headers, seed_time_idx, source, time_idx);
        for (row, t) in source.table.rows.iter().zip(&rebased) {
            result.rows.push(
                layout
                    .iter()
                    .map(|cell| match cell {
                        CellSource::Time => t.to_string(),
                        CellSource::Column(idx) => row.get(*idx).cloned().unwrap_or_default(),
                        CellSource::Missing => String::new(),
                    })
                    .collect(),
            );
        }
    }

    Ok(MergeOutcome {
        table: result,
        time_column,
        segments,
        skipped,
    })
}

fn parse_times(source: &SourceTable, idx: usize) -> Result<Vec<f64>, MergeError> {
    source
        .table
        .column(idx)
        .enumerate()
        .map(|(row, cell)| {
            cell.trim()
                .parse::<f64>()
                .map_err(|_| MergeError::NonNumericTime {
                    file: source.name.clone(),
                    row: row + 1,
                    value: cell.to_string(),
                })
        })
        .collect()
}

fn segment(source: &SourceTable, label: String, times: &[f64], interval: f64) -> SegmentReport {
    SegmentReport {
        label,
        file: source.name.clone(),
        rows: times.len(),
        first_time: times.first().copied().unwrap_or_default(),
        last_time: times.last().copied().unwrap_or_default(),
        interval,
    }
}

fn log_segment(seg: &SegmentReport) {
    info!(
        "  {}: {} rows, time range: {:.6} to {:.6}, sampling interval: {:.6}",
        seg.label, seg.rows, seg.first_time, seg.last_time, seg.interval
    );
}

/// Map the seed header onto `source`'s columns by name.
///
/// The source's time column is renamed onto the seed's time column; seed
/// columns the source lacks come out empty and source-only columns are
/// dropped.
fn align_columns(
    seed_headers: &[String],
    seed_time_idx: usize,
    source: &SourceTable,
    time_idx: usize,
) -> Vec<CellSource> {
    let headers = &source.table.headers;
    if headers[time_idx] != seed_headers[seed_time_idx] {
        debug!(
            "  {}: renaming '{}' to '{}'",
            source.name, headers[time_idx], seed_headers[seed_time_idx]
        );
    }

    let mut used = vec![false; headers.len()];
    used[time_idx] = true;
    let layout: Vec<CellSource> = seed_headers
        .iter()
        .enumerate()
        .map(|(j, name)| {
            if j == seed_time_idx {
                return CellSource::Time;
            }
            match headers
                .iter()
                .enumerate()
                .position(|(i, h)| i != time_idx && !used[i] && h == name)
            {
                Some(i) => {
                    used[i] = true;
                    CellSource::Column(i)
                }
                None => {
                    warn!("  {}: missing column '{}', left empty", source.name, name);
                    CellSource::Missing
                }
            }
        })
        .collect();

    let dropped: Vec<&str> = headers
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(h, _)| h.as_str())
        .collect();
    if !dropped.is_empty() {
        warn!(
            "  {}: dropping columns not in the first file: {:?}",
            source.name, dropped
        );
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str, headers: &[&str], rows: &[&[&str]]) -> SourceTable {
        SourceTable::new(
            name,
            Table {
                headers: headers.iter().map(|s| s.to_string()).collect(),
                rows: rows
                    .iter()
                    .map(|r| r.iter().map(|s| s.to_string()).collect())
                    .collect(),
            },
        )
    }

    fn timed(name: &str, header: &str, times: &[f64]) -> SourceTable {
        let rows: Vec<Vec<String>> = times
            .iter()
            .enumerate()
            .map(|(i, t)| vec![t.to_string(), format!("v{}", i)])
            .collect();
        SourceTable::new(
            name,
            Table {
                headers: vec![header.to_string(), "X".to_string()],
                rows,
            },
        )
    }

    fn times_of(outcome: &MergeOutcome) -> Vec<f64> {
        let idx = outcome
            .table
            .column_index(&outcome.time_column)
            .expect("time column");
        outcome
            .table
            .column(idx)
            .map(|c| c.parse::<f64>().unwrap())
            .collect()
    }

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "expected {expected}, got {actual} (diff {diff} > tol {tol})"
        );
    }

    #[test]
    fn rebases_second_table_after_seed() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 0.1, 0.2]);
        let b = timed("Ex2.csv", "Channel", &[5.0, 5.2, 5.4]);
        let outcome = merge_tables(&[a, b], "channel").unwrap();
        let expected = [0.0, 0.1, 0.2, 0.3, 0.5, 0.7];
        let actual = times_of(&outcome);
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_close(*a, e, 1e-9);
        }
        assert_eq!(outcome.segments.len(), 2);
        assert_close(outcome.segments[1].interval, 0.2, 1e-9);
    }

    #[test]
    fn single_table_is_returned_unchanged() {
        let a = source(
            "Ex1.csv",
            &["Channel A", "x", "label"],
            &[&["0.000", "1.5", "idle"], &["0.010", "-2", "run"]],
        );
        let outcome = merge_tables(std::slice::from_ref(&a), "channel").unwrap();
        assert_eq!(outcome.table, a.table);
        assert_eq!(outcome.time_column, "Channel A");
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn boundary_gap_equals_previous_interval() {
        let a = timed("Ex1.csv", "channel", &[10.0, 10.25, 10.5, 10.75]);
        let b = timed("Ex2.csv", "channel", &[-3.0, -2.9]);
        let outcome = merge_tables(&[a, b], "channel").unwrap();
        let times = times_of(&outcome);
        assert!(times.windows(2).all(|w| w[1] >= w[0]));
        assert_close(times[4] - times[3], 0.25, 1e-12);
        assert_close(times[5] - times[4], 0.1, 1e-9);
    }

    #[test]
    fn offsets_accumulate_across_many_tables() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 1.0]);
        let b = timed("Ex2.csv", "Channel", &[100.0, 102.0, 104.0]);
        let c = timed("Ex3.csv", "Channel", &[7.0, 7.5]);
        let outcome = merge_tables(&[a, b, c], "channel").unwrap();
        let times = times_of(&outcome);
        let expected = [0.0, 1.0, 2.0, 4.0, 6.0, 8.0, 8.5];
        for (a, e) in times.iter().zip(expected) {
            assert_close(*a, e, 1e-9);
        }
    }

    #[test]
    fn table_without_time_column_is_skipped_without_moving_offset() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 0.1, 0.2]);
        let bad = source("Ex2.csv", &["x", "y"], &[&["1", "2"]]);
        let c = timed("Ex3.csv", "Channel", &[5.0, 5.2, 5.4]);
        let outcome = merge_tables(&[a, bad, c], "channel").unwrap();
        assert_eq!(outcome.skipped, vec!["Ex2.csv".to_string()]);
        assert_eq!(outcome.table.len(), 6);
        let times = times_of(&outcome);
        assert_close(times[3], 0.3, 1e-9);
        assert_close(times[5], 0.7, 1e-9);
    }

    #[test]
    fn empty_later_table_is_skipped() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 0.1]);
        let empty = source("Ex2.csv", &["Channel", "X"], &[]);
        let outcome = merge_tables(&[a, empty], "channel").unwrap();
        assert_eq!(outcome.skipped, vec!["Ex2.csv".to_string()]);
        assert_eq!(outcome.table.len(), 2);
    }

    #[test]
    fn row_count_is_sum_of_qualifying_tables() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 0.1, 0.2]);
        let b = timed("Ex2.csv", "channel", &[1.0]);
        let c = source("Ex3.csv", &["time"], &[&["0"], &["1"]]);
        let d = timed("Ex4.csv", "CHANNEL", &[3.0, 4.0, 5.0, 6.0]);
        let outcome = merge_tables(&[a, b, c, d], "channel").unwrap();
        assert_eq!(outcome.table.len(), 3 + 1 + 4);
    }

    #[test]
    fn single_row_table_reuses_previous_interval() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 0.5]);
        let b = timed("Ex2.csv", "Channel", &[42.0]);
        let c = timed("Ex3.csv", "Channel", &[9.0, 9.1]);
        let outcome = merge_tables(&[a, b, c], "channel").unwrap();
        let times = times_of(&outcome);
        assert_close(times[2], 1.0, 1e-12);
        assert_close(times[3], 1.5, 1e-12);
        assert_close(outcome.segments[1].interval, 0.5, 1e-12);
    }

    #[test]
    fn single_row_seed_uses_its_value_as_interval() {
        let a = timed("Ex1.csv", "Channel", &[2.0]);
        let b = timed("Ex2.csv", "Channel", &[0.0, 1.0]);
        let outcome = merge_tables(&[a, b], "channel").unwrap();
        let times = times_of(&outcome);
        assert_close(times[1], 4.0, 1e-12);
        assert_close(outcome.segments[0].interval, 2.0, 1e-12);
    }

    #[test]
    fn seed_without_time_column_fails() {
        let a = source("Ex1.csv", &["x"], &[&["1"]]);
        let b = timed("Ex2.csv", "Channel", &[0.0, 1.0]);
        let err = merge_tables(&[a, b], "channel").unwrap_err();
        assert_eq!(
            err,
            MergeError::MissingTimeColumn {
                file: "Ex1.csv".into(),
                target: "channel".into()
            }
        );
    }

    #[test]
    fn empty_seed_fails() {
        let a = source("Ex1.csv", &["Channel"], &[]);
        let err = merge_tables(&[a], "channel").unwrap_err();
        assert!(matches!(err, MergeError::MissingTimeColumn { .. }));
    }

    #[test]
    fn no_sources_gives_empty_outcome() {
        let outcome = merge_tables(&[], "channel").unwrap();
        assert!(outcome.is_empty());
        assert!(outcome.segments.is_empty());
    }

    #[test]
    fn non_numeric_time_is_reported() {
        let a = timed("Ex1.csv", "Channel", &[0.0, 0.1]);
        let b = source("Ex2.csv", &["Channel", "X"], &[&["1.0", "a"], &["oops", "b"]]);
        let err = merge_tables(&[a, b], "channel").unwrap_err();
        assert_eq!(
            err,
            MergeError::NonNumericTime {
                file: "Ex2.csv".into(),
                row: 2,
                value: "oops".into()
            }
        );
    }

    #[test]
    fn later_time_column_is_renamed_and_realigned() {
        let a = source(
            "Ex1.csv",
            &["Channel A", "x", "y"],
            &[&["0", "1", "2"], &["1", "3", "4"]],
        );
        let b = source(
            "Ex2.csv",
            &["y", "  channelA ", "x", "extra"],
            &[&["40", "9", "30", "e"]],
        );
        let outcome = merge_tables(&[a, b], "channel").unwrap();
        assert_eq!(outcome.table.headers, vec!["Channel A", "x", "y"]);
        assert_eq!(outcome.table.rows[2], vec!["2", "30", "40"]);
    }

    #[test]
    fn missing_data_column_is_left_empty() {
        let a = source("Ex1.csv", &["Channel", "x", "y"], &[&["0", "1", "2"]]);
        let b = source("Ex2.csv", &["Channel", "x"], &[&["7", "5"]]);
        let outcome = merge_tables(&[a, b], "channel").unwrap();
        assert_eq!(outcome.table.rows[1], vec!["0", "5", ""]);
    }

    #[test]
    fn non_time_cells_are_untouched() {
        let a = source("Ex1.csv", &["Channel", "x"], &[&["0", "1.000"], &["1", "2.50"]]);
        let b = source("Ex2.csv", &["Channel", "x"], &[&["3", " 0007 "], &["4", "n/a"]]);
        let outcome = merge_tables(&[a, b], "channel").unwrap();
        let x: Vec<&str> = outcome.table.column(1).collect();
        assert_eq!(x, vec!["1.000", "2.50", " 0007 ", "n/a"]);
    }

    #[test]
    fn configurable_target_token() {
        let a = timed("Ex1.csv", "Time (s)", &[0.0, 0.01]);
        let b = timed("Ex2.csv", "time(S)", &[3.0, 3.01]);
        let outcome = merge_tables(&[a, b], "time").unwrap();
        assert_eq!(outcome.time_column, "Time (s)");
        assert_eq!(outcome.table.len(), 4);
    }
}
