//! Codec for the `image_file_names` column.
//!
//! The ordered filename list of an entry is stored as a single comma-joined
//! text value. Whitespace around the separators is tolerated on read.

const SEPARATOR: char = ',';

pub(crate) fn join_file_names<S: AsRef<str>>(file_names: &[S]) -> String {
    file_names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn split_file_names(raw: &str) -> Vec<String> {
    raw.split(SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}
