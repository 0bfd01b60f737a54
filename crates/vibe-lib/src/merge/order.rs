use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::OnceLock;

fn ordinal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)ex(\d+)").expect("ordinal pattern is valid"))
}

/// Exercise ordinal embedded in a file name, e.g. `"DO200B_B_Ex10.csv"` -> 10.
///
/// Only the first `ex<digits>` occurrence counts. A numeral too large for
/// `u64` is treated as no ordinal.
pub fn extract_ex_number(file_name: &str) -> Option<u64> {
    ordinal_pattern()
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Sort key: numbered files first by ordinal, the rest by lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NaturalKey {
    Ordinal(u64),
    Name(String),
}

pub fn natural_sort_key(file_name: &str) -> NaturalKey {
    match extract_ex_number(file_name) {
        Some(n) => NaturalKey::Ordinal(n),
        None => NaturalKey::Name(file_name.to_lowercase()),
    }
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}

/// Stable sort of paths by [`natural_sort_key`] of their file names.
pub fn natural_sort<P: AsRef<Path>>(mut files: Vec<P>) -> Vec<P> {
    files.sort_by_cached_key(|p| natural_sort_key(&file_name_of(p.as_ref())));
    files
}

/// Label used in progress lines: `Ex<ordinal>`, or `Ex<position>` when the
/// name carries none.
pub fn ex_label(ordinal: Option<u64>, position: usize) -> String {
    match ordinal {
        Some(n) => format!("Ex{}", n),
        None => format!("Ex{}", position),
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
