//! Organization settings and their process-wide cache.
//!
//! Settings are stored as key/value rows. [`SettingsCache::refresh`] loads
//! them, together with the logo bytes, into an immutable [`OrgSettings`]
//! snapshot that handlers pass to the invoice generator.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{AdminError, Result},
    store::Store,
};

/// Organization name printed when none is configured.
pub const DEFAULT_NAME: &str = "Your Gym Name";
/// Address printed when none is configured.
pub const DEFAULT_ADDRESS: &str = "123 Gym Street, City";
/// Email printed when none is configured.
pub const DEFAULT_EMAIL: &str = "info@gym.com";
/// Phone printed when none is configured.
pub const DEFAULT_PHONE: &str = "+123456789";
/// Currency symbol used when none is configured.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

const KEY_NAME: &str = "app_name";
const KEY_LOGO: &str = "logo";
const KEY_ADDRESS: &str = "address";
const KEY_EMAIL: &str = "email";
const KEY_PHONE: &str = "phone";
const KEY_CURRENCY: &str = "currency_icon";

/// Logo image loaded from the assets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    /// Path relative to the assets root.
    pub path: String,
    /// Raw file contents.
    pub bytes: Arc<[u8]>,
}

/// Organization settings snapshot.
///
/// Every field is optional; the getters fall back to fixed defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSettings {
    /// Organization name.
    #[serde(default)]
    pub name: Option<String>,
    /// Logo path relative to the assets root.
    #[serde(default)]
    pub logo_path: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Currency symbol prefixed to amounts.
    #[serde(default)]
    pub currency_symbol: Option<String>,
    /// Logo contents, loaded by the cache.
    #[serde(skip)]
    pub logo: Option<LogoImage>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl OrgSettings {
    /// Organization name or [`DEFAULT_NAME`].
    #[must_use]
    pub fn name(&self) -> &str {
        non_empty(self.name.as_ref()).unwrap_or(DEFAULT_NAME)
    }

    /// Address or [`DEFAULT_ADDRESS`].
    #[must_use]
    pub fn address(&self) -> &str {
        non_empty(self.address.as_ref()).unwrap_or(DEFAULT_ADDRESS)
    }

    /// Email or [`DEFAULT_EMAIL`].
    #[must_use]
    pub fn email(&self) -> &str {
        non_empty(self.email.as_ref()).unwrap_or(DEFAULT_EMAIL)
    }

    /// Phone or [`DEFAULT_PHONE`].
    #[must_use]
    pub fn phone(&self) -> &str {
        non_empty(self.phone.as_ref()).unwrap_or(DEFAULT_PHONE)
    }

    /// Currency symbol or [`DEFAULT_CURRENCY_SYMBOL`].
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        non_empty(self.currency_symbol.as_ref()).unwrap_or(DEFAULT_CURRENCY_SYMBOL)
    }

    /// Key/value pairs for the fields that are set.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            (KEY_NAME, &self.name),
            (KEY_LOGO, &self.logo_path),
            (KEY_ADDRESS, &self.address),
            (KEY_EMAIL, &self.email),
            (KEY_PHONE, &self.phone),
            (KEY_CURRENCY, &self.currency_symbol),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }

    /// Builds settings from stored key/value pairs; unknown keys are ignored.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned();
        Self {
            name: get(KEY_NAME),
            logo_path: get(KEY_LOGO),
            address: get(KEY_ADDRESS),
            email: get(KEY_EMAIL),
            phone: get(KEY_PHONE),
            currency_symbol: get(KEY_CURRENCY),
            logo: None,
        }
    }
}

/// Cached settings snapshot shared by all request handlers.
#[derive(Debug)]
pub struct SettingsCache {
    assets_root: PathBuf,
    current: RwLock<Arc<OrgSettings>>,
}

impl SettingsCache {
    /// Creates an empty cache; every getter returns its default until the
    /// first refresh.
    #[must_use]
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self { assets_root: assets_root.into(), current: RwLock::new(Arc::default()) }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<OrgSettings> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the snapshot.
    pub fn replace(&self, settings: OrgSettings) {
        let next = Arc::new(settings);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Reloads settings from the store.
    ///
    /// A logo that cannot be read is logged and left out; the rest of the
    /// snapshot is still replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] if the settings cannot be loaded.
    pub fn refresh(&self, store: &Store) -> Result<Arc<OrgSettings>> {
        let map = store.read(|tx| tx.settings_map())?;
        let mut settings = OrgSettings::from_map(&map);
        if let Some(path) = non_empty(settings.logo_path.as_ref()).map(str::to_owned) {
            match self.load_logo(&path) {
                Ok(bytes) => settings.logo = Some(LogoImage { path, bytes: bytes.into() }),
                Err(error) => warn!(logo = %path, error = %error, "logo not loaded"),
            }
        }
        self.replace(settings);
        debug!(keys = map.len(), "settings refreshed");
        Ok(self.snapshot())
    }

    fn load_logo(&self, relative: &str) -> Result<Vec<u8>> {
        let relative = Path::new(relative);
        if relative.is_absolute()
            || relative.components().any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AdminError::Config(format!(
                "logo path '{}' must stay inside the assets directory",
                relative.display()
            )));
        }
        Ok(std::fs::read(self.assets_root.join(relative))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let settings = OrgSettings::default();
        assert_eq!(settings.name(), "Your Gym Name");
        assert_eq!(settings.address(), "123 Gym Street, City");
        assert_eq!(settings.email(), "info@gym.com");
        assert_eq!(settings.phone(), "+123456789");
        assert_eq!(settings.currency_symbol(), "$");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let settings = OrgSettings { name: Some("  ".into()), ..OrgSettings::default() };
        assert_eq!(settings.name(), DEFAULT_NAME);
    }

    #[test]
    fn test_pairs_roundtrip_through_map() {
        let settings = OrgSettings {
            name: Some("Iron Temple".into()),
            currency_symbol: Some("€".into()),
            ..OrgSettings::default()
        };
        let map: BTreeMap<String, String> = settings
            .to_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        assert_eq!(map.len(), 2);
        assert_eq!(OrgSettings::from_map(&map), settings);
    }

    #[test]
    fn test_refresh_loads_logo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logo.png"), b"not really a png").unwrap();
        let store = Store::open_in_memory().unwrap();
        store
            .transaction(|tx| tx.seed_settings([("app_name", "Iron Temple"), ("logo", "logo.png")]))
            .unwrap();

        let cache = SettingsCache::new(dir.path());
        assert_eq!(cache.snapshot().name(), DEFAULT_NAME);

        let snapshot = cache.refresh(&store).unwrap();
        assert_eq!(snapshot.name(), "Iron Temple");
        let logo = snapshot.logo.as_ref().unwrap();
        assert_eq!(&*logo.bytes, b"not really a png");
    }

    #[test]
    fn test_refresh_skips_missing_or_escaping_logo() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_in_memory().unwrap();
        store.transaction(|tx| tx.put_setting("logo", "../secret.png")).unwrap();
        let cache = SettingsCache::new(dir.path());
        assert!(cache.refresh(&store).unwrap().logo.is_none());

        store.transaction(|tx| tx.put_setting("logo", "missing.png")).unwrap();
        assert!(cache.refresh(&store).unwrap().logo.is_none());
    }
}
