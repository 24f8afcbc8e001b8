//! Organization settings key/value rows.

use std::collections::BTreeMap;

use rusqlite::params;

use super::StoreTx;
use crate::error::Result;

impl StoreTx<'_> {
    /// Inserts each pair whose key is not stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`](crate::error::AdminError::Database) on write failure.
    pub fn seed_settings<'k>(
        &self,
        pairs: impl IntoIterator<Item = (&'k str, &'k str)>,
    ) -> Result<()> {
        let mut stmt =
            self.conn.prepare("INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)")?;
        for (key, value) in pairs {
            stmt.execute(params![key, value])?;
        }
        Ok(())
    }

    /// Stores a setting, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`](crate::error::AdminError::Database) on write failure.
    pub fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Loads all settings.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`](crate::error::AdminError::Database) on query failure.
    pub fn settings_map(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(pairs)
    }
}
