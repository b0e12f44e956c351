use std::path::{Path, PathBuf};

/// Split a path into its parent directory and file name
///
/// A bare file name has an empty directory, matching a path relative to the working directory.
pub fn split_path(path: &Path) -> (PathBuf, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    (dir, filename)
}

/// Append `suffix` to the final component of `path` (`data/train.tsv` -> `data/train.tsv_x`)
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut joined = path.as_os_str().to_owned();
    joined.push(suffix);

    PathBuf::from(joined)
}
