//! Atomic file replacement
//!
//! Content is written to a temporary file in the destination directory and
//! renamed over the target, so readers see either the old or the new file,
//! never a partial one. The replacement keeps the permissions of the file it
//! replaces; a new file gets the same mode `fs::write` would give it.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    // tempfile defaults to 0600; 0666 is narrowed by the umask like any
    // other newly created file
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Atomically replace `path` with `content`, creating parent directories
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = temp_file_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    match fs::metadata(path) {
        Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
