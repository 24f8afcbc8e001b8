//! Published artifact storage.
//!
//! Invoices are written under a storage root and served back to operators at
//! `<public_base_url>/storage/<path>`. Writes go to a temporary file that is
//! synced and renamed into place, so a reader never sees a partial document.

use std::{
    fmt,
    fs::{self, File},
    io::Write,
    path::{Component, Path, PathBuf},
};

use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, warn};

use crate::error::{AdminError, Result};

/// Length of the random token in invoice file names.
pub const INVOICE_TOKEN_LEN: usize = 10;

/// Returns a fresh `invoices/invoice_<token>.pdf` path.
///
/// # Examples
///
/// ```
/// use gym_admin::artifacts::invoice_artifact_path;
///
/// let path = invoice_artifact_path();
/// assert!(path.starts_with("invoices/invoice_"));
/// assert_eq!(path.len(), "invoices/invoice_".len() + 10 + ".pdf".len());
/// ```
#[must_use]
pub fn invoice_artifact_path() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVOICE_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("invoices/invoice_{token}.pdf")
}

/// Durable storage for generated files.
pub trait ArtifactStore: Send + Sync + fmt::Debug {
    /// Stores `bytes` at `path` and returns the public locator.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Storage`] on write failure, or
    /// [`AdminError::Internal`] for a path outside the store.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<String>;

    /// Removes the artifact at `path`; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Storage`] on delete failure.
    fn remove(&self, path: &str) -> Result<()>;

    /// Public locator of `path`.
    fn locator(&self, path: &str) -> String;
}

/// Artifact store on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalArtifactStore {
    /// Creates a store rooted at `root`; locators are prefixed with
    /// `public_base_url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_owned();
        Self { root: root.into(), public_base_url }
    }

    /// Storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AdminError::Internal(format!("artifact path '{path}' escapes the store")));
        }
        Ok(self.root.join(relative))
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn discard_temp(tmp: &Path) {
    match fs::remove_file(tmp) {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %tmp.display(), error = %error, "temporary artifact not removed"),
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = target.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(error) = write_and_sync(&tmp, bytes) {
            discard_temp(&tmp);
            return Err(error);
        }
        if let Err(error) = fs::rename(&tmp, &target) {
            discard_temp(&tmp);
            return Err(error.into());
        }
        debug!(path, bytes = bytes.len(), "artifact stored");
        Ok(self.locator(path))
    }

    fn remove(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn locator(&self, path: &str) -> String {
        format!("{}/storage/{path}", self.public_base_url)
    }
}
