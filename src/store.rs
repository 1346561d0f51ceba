// Small JSON-file helper shared by the session and context stores.
// Reading is "parse or absent": a missing, unreadable or corrupt file is
// reported as `None` so callers fall back to logging in / resolving again.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file, or `None` if there is nothing usable.
    pub fn load<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read file, ignoring it");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt file, ignoring it");
                None
            }
        }
    }

    /// Write pretty JSON, creating parent directories. The content goes to
    /// a sibling `<name>.next` file created owner-only, which is then renamed
    /// over the target, so readers see either the old or the new file.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(value)?;
        let next = self.next_path();
        if let Err(e) = write_owner_only(&next, body.as_bytes()) {
            let _ = fs::remove_file(&next);
            return Err(e.into());
        }
        fs::rename(&next, &self.path)?;
        Ok(())
    }

    fn next_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".next");
        self.path.with_file_name(name)
    }

    /// Remove the file. Missing is fine.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Create `path` afresh with mode 0600 (on Unix) and write `body` to disk.
fn write_owner_only(path: &Path, body: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(body)?;
    file.sync_all()
}
