//! Key file persistence.
//!
//! Files are written to a fresh temporary file in the target directory,
//! synced, and renamed into place so a crash never leaves a truncated key
//! file behind. The temporary file is created exclusively with owner-only
//! permissions. [`write_new`] refuses to touch an existing path, and the
//! final rename fails rather than replacing a file that appeared meanwhile.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::error::KeyError;

/// Indent used when none is configured.
pub const DEFAULT_INDENT: &str = "  ";

/// Write `bytes` to `path` unless something already exists there.
pub fn write_new(path: &Path, bytes: &[u8]) -> Result<(), KeyError> {
    if path.try_exists()? {
        return Err(refused(path));
    }
    let temp = write_temp(path, bytes)?;
    temp.persist_noclobber(path).map_err(|e| match e.error.kind() {
        ErrorKind::AlreadyExists => refused(path),
        _ => KeyError::Io(e.error),
    })?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote key file");
    Ok(())
}

/// Replace the contents of `path`, creating it if needed.
pub fn overwrite(path: &Path, bytes: &[u8]) -> Result<(), KeyError> {
    let temp = write_temp(path, bytes)?;
    temp.persist(path).map_err(|e| KeyError::Io(e.error))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "replaced key file");
    Ok(())
}

/// Read the full contents of `path`.
pub fn read(path: &Path) -> Result<Vec<u8>, KeyError> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => KeyError::NotFound {
            path: path.to_path_buf(),
        },
        _ => KeyError::Io(e),
    })
}

fn refused(path: &Path) -> KeyError {
    tracing::warn!(path = %path.display(), "refusing to overwrite existing file");
    KeyError::AlreadyExists {
        path: path.to_path_buf(),
    }
}

/// Write `bytes` to a new temporary file beside `path`. The file is removed
/// when dropped unless persisted.
fn write_temp(path: &Path, bytes: &[u8]) -> Result<NamedTempFile, KeyError> {
    if path.file_name().is_none() {
        return Err(KeyError::Io(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("not a file path: {}", path.display()),
        )));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;

    // Key files hold private keys in plaintext
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// A value stored as an indented JSON document.
pub trait KeyDocument: Serialize + DeserializeOwned {
    /// Encode as JSON using `indent` for each nesting level.
    fn to_json(&self, indent: &str) -> Result<String, KeyError> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| KeyError::Encoding(e.to_string()))
    }

    /// Decode and validate a JSON document.
    fn from_json(json: &str) -> Result<Self, KeyError>;

    /// Write to a new file. Fails with [`KeyError::AlreadyExists`] if `path`
    /// is occupied, leaving the existing file untouched.
    fn write_file(&self, path: &Path, indent: &str) -> Result<(), KeyError> {
        let json = self.to_json(indent)?;
        write_new(path, format!("{json}\n").as_bytes())
    }

    /// Write to `path`, replacing any existing file.
    fn overwrite_file(&self, path: &Path, indent: &str) -> Result<(), KeyError> {
        let json = self.to_json(indent)?;
        overwrite(path, format!("{json}\n").as_bytes())
    }

    /// Load from a file written by [`KeyDocument::write_file`].
    fn read_file(path: &Path) -> Result<Self, KeyError> {
        let bytes = read(path)?;
        let json = String::from_utf8(bytes).map_err(|e| KeyError::Encoding(e.to_string()))?;
        Self::from_json(&json)
    }
}
