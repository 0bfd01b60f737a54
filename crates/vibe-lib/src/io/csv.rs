use crate::table::Table;
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

/// Parse a headered, comma-separated table.
///
/// Short records (a truncated last line from an interrupted logger) are
/// padded with empty cells; records wider than the header are rejected.
pub fn parse_table<R: Read>(reader: R) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading header")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        bail!("no columns to parse");
    }
    let width = headers.len();
    let mut table = Table::new(headers);
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("reading record {}", idx + 1))?;
        if record.len() > width {
            bail!(
                "record {} has {} fields, header has {}",
                idx + 1,
                record.len(),
                width
            );
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        table.rows.push(row);
    }
    Ok(table)
}

/// Read a table from disk.
pub fn read_table(path: &Path) -> Result<Table> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_table(file).with_context(|| format!("parsing {}", path.display()))
}

pub fn write_table_to<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer
        .write_record(&table.headers)
        .context("writing header")?;
    for row in &table.rows {
        writer.write_record(row).context("writing record")?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a table to `path`, creating parent directories as needed.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_table_to(file, table).with_context(|| format!("writing {}", path.display()))
}
