//! Reading and writing the persisted settings file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::store::{Settings, StoreError};

/// File name of the persisted settings inside the home directory.
pub const FILE_NAME: &str = ".config-service.json";

/// Default location of the persisted settings file.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(FILE_NAME))
}

/// Read the persisted layer. A missing file reads as empty.
pub fn read(path: &Path) -> Result<Settings, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Settings::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let value: Value = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            path: path.display().to_string(),
        }),
    }
}

/// Replace the persisted layer.
///
/// Content goes to a sibling temp file first and is renamed into place, so
/// readers see either the old or the new document.
pub fn write(path: &Path, settings: &Settings) -> Result<(), StoreError> {
    let mut content = serde_json::to_string_pretty(settings)?;
    content.push('\n');

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| FILE_NAME.to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let write_err = |source| StoreError::Write {
        path: path.display().to_string(),
        source,
    };

    if let Err(e) = fs::write(&tmp, content) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }

    tracing::debug!(path = %path.display(), keys = settings.len(), "Settings file written");
    Ok(())
}
