use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::warn;

use oliver_core::credentials::CredentialStore;

/// Session tokens persisted as a small JSON object in the data directory.
///
/// The file is rewritten on every change and kept readable by the owner only.
pub struct FileCredentialStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileCredentialStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read credentials: {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).with_context(|| {
                    format!("Credentials file is corrupt: {}", path.display())
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
        })
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove credentials file")?;
            }
            return Ok(());
        }

        let json = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, json).context("Failed to write credentials file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set credentials file permissions")?;
        }
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>) -> bool) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if !change(&mut values) {
            return;
        }
        if let Err(e) = self.persist(&values) {
            let error = format!("{e:#}");
            warn!(path = %self.path.display(), %error, "failed to save credentials");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        });
    }

    fn remove(&self, key: &str) {
        self.update(|values| values.remove(key).is_some());
    }
}
