//! Shared filesystem helpers.

use std::fs;
use std::io;
use std::path::Path;

/// Write `contents` atomically: temp file in the same directory, then
/// rename over the target, so a crash mid-write never leaves a corrupt
/// or partial file.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
