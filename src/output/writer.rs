//! Atomic document writer.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::OutputError;
use crate::render::Document;
use crate::watcher::filter::{temp_prefix, TEMP_SUFFIX};
use crate::Result;

/// Write `document` to `output_path`, replacing any previous content.
///
/// The text goes to a temporary file beside the target which is then
/// renamed over it. The temporary file is removed if anything fails.
/// Existing permissions of the target are kept.
///
/// # Errors
///
/// Returns [`OutputError::WriteFailed`] if the temporary file cannot be
/// created or written, or the rename fails.
pub fn write_document(document: &Document, output_path: &Path) -> Result<()> {
    let dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = output_path
        .file_name()
        .ok_or_else(|| OutputError::write_failed(output_path, "output path has no file name"))?
        .to_string_lossy();

    let mut tmp = tempfile::Builder::new()
        .prefix(&temp_prefix(&name))
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| OutputError::write_failed(output_path, e))?;

    tmp.write_all(document.to_text().as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| OutputError::write_failed(output_path, e))?;

    if let Some(perms) = target_permissions(output_path) {
        fs::set_permissions(tmp.path(), perms)
            .map_err(|e| OutputError::write_failed(output_path, e))?;
    }

    tmp.persist(output_path)
        .map_err(|e| OutputError::write_failed(output_path, e.error))?;

    tracing::debug!(
        path = %output_path.display(),
        lines = document.lines().len(),
        "Document written"
    );
    Ok(())
}

/// Permissions the written file should end up with.
fn target_permissions(output_path: &Path) -> Option<fs::Permissions> {
    fs::metadata(output_path)
        .map(|m| m.permissions())
        .ok()
        .or_else(default_permissions)
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
const fn default_permissions() -> Option<fs::Permissions> {
    None
}
