use std::fs;
use std::io::Write;

use camino::Utf8Path;

use crate::error::KiraError;

/// Replaces `dest` with `bytes` via a temp file in the same directory, so a
/// failed write never leaves a truncated output behind.
pub fn write_atomic(dest: &Utf8Path, bytes: &[u8]) -> Result<(), KiraError> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("create {parent}: {err}")))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".kira-tr-")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    temp.write_all(bytes)
        .map_err(|err| KiraError::Filesystem(format!("write {dest}: {err}")))?;
    temp.flush()
        .map_err(|err| KiraError::Filesystem(format!("write {dest}: {err}")))?;
    temp.persist(dest.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("persist {dest}: {err}")))?;
    Ok(())
}
