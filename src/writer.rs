use crate::errors::HarvestError;
use std::fs;
use std::path::Path;

/// Write rendered playlist text as UTF-8, creating parent directories.
pub fn write_playlist(path: &Path, content: &str) -> Result<(), HarvestError> {
    let to_error = |source| HarvestError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, content).map_err(to_error)
}
