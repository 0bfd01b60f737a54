/// Lowercase a header and strip every whitespace character.
///
/// `"Channel Name"` becomes `"channelname"`, `"  X "` becomes `"x"`.
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the first column (in declared order) whose normalized name
/// contains the normalized `target`.
pub fn find_matching_column<S: AsRef<str>>(target: &str, columns: &[S]) -> Option<usize> {
    let target = normalize_column_name(target);
    columns
        .iter()
        .position(|col| normalize_column_name(col.as_ref()).contains(&target))
}
