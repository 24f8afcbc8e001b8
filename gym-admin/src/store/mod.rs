//! Persistent member, locker, subscription and settings store using `SQLite`.
//!
//! A single connection is shared behind a mutex. Every admin operation runs
//! inside [`Store::transaction`]: the closure receives a [`StoreTx`] whose
//! methods (spread over the submodules) read and write rows, and the
//! transaction commits only when the closure returns `Ok`.
//!
//! # Schema
//!
//! - `users`: profile rows owned by members.
//! - `members`: public member id, status, locker, current subscription
//!   pointer and soft-delete marker.
//! - `lockers`: locker number, availability and holder.
//! - `subscriptions`: subscription records with their invoice path.
//! - `settings`: organization key/value pairs.

mod columns;
mod lockers;
mod members;
mod settings;
mod subscriptions;

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::{AdminError, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    address TEXT,
    image TEXT,
    date_of_birth TEXT
);
CREATE TABLE IF NOT EXISTS members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id TEXT NOT NULL UNIQUE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    status TEXT NOT NULL,
    locker_no INTEGER,
    subscription_id INTEGER,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);
CREATE TABLE IF NOT EXISTS lockers (
    number INTEGER PRIMARY KEY,
    available INTEGER NOT NULL DEFAULT 1,
    member_id TEXT
);
CREATE TABLE IF NOT EXISTS subscriptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    member_id TEXT NOT NULL,
    plan_id TEXT NOT NULL,
    plan_name TEXT NOT NULL,
    plan_price TEXT NOT NULL,
    subscription_type TEXT NOT NULL,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    renewal_date TEXT NOT NULL,
    status TEXT NOT NULL,
    payment_method TEXT NOT NULL,
    payment_status TEXT NOT NULL,
    transaction_ref TEXT,
    adjustments TEXT NOT NULL DEFAULT '[]',
    total_amount TEXT NOT NULL,
    cancellation_reason TEXT,
    invoice_pdf TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_subscriptions_member ON subscriptions(member_id);
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Handle to the `SQLite` database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) the database file at `path` and applies the schema.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] if the file cannot be opened or the
    /// schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        debug!("database schema ready");
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(poisoned) => {
                warn!("database lock poisoned by a panicking caller, recovering");
                self.conn.clear_poison();
                poisoned.into_inner()
            }
        };
        if !conn.is_autocommit() {
            warn!("connection left inside a transaction, rolling back");
            if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                warn!(error = %rollback, "rollback failed");
            }
        }
        conn
    }

    /// Runs `f` inside an immediate transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back and returns the error
    /// otherwise, so a failure at any step leaves no partial rows behind.
    /// A panic inside `f` also rolls back before the lock is released.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or [`AdminError::Database`] if the
    /// transaction cannot be opened or committed.
    pub fn transaction<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        let mut guard = RollbackGuard { conn: &conn, armed: true };
        let value = f(&StoreTx { conn: &conn })?;
        guard.armed = false;

        if let Err(commit) = conn.execute_batch("COMMIT;") {
            warn!(error = %commit, "commit failed, rolling back");
            if let Err(rollback) = conn.execute_batch("ROLLBACK;") {
                return Err(AdminError::Internal(format!(
                    "commit failed ({commit}) and rollback failed ({rollback})"
                )));
            }
            return Err(commit.into());
        }
        Ok(value)
    }

    /// Runs read-only `f` against the connection without opening a transaction.
    ///
    /// # Errors
    ///
    /// Returns the closure's error.
    pub fn read<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        f(&StoreTx { conn: &conn })
    }

    /// Checks that the database answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Database`] if the query fails.
    pub fn ping(&self) -> Result<()> {
        let conn = self.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// Rolls back the open transaction when dropped while armed, including on unwind.
struct RollbackGuard<'c> {
    conn: &'c Connection,
    armed: bool,
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(rollback) = self.conn.execute_batch("ROLLBACK;") {
                warn!(error = %rollback, "rollback failed");
            }
        }
    }
}

/// Borrowed connection scoped to one [`Store::transaction`] or [`Store::read`] call.
#[derive(Debug)]
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;

    #[test]
    fn test_open_in_memory_and_ping() {
        let store = Store::open_in_memory().unwrap();
        store.ping().unwrap();
    }

    #[test]
    fn test_open_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gym.sqlite");
        Store::open(&path).unwrap();
        let store = Store::open(&path).unwrap();
        store.ping().unwrap();
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<()> = store.transaction(|tx| {
            tx.put_setting("app_name", "Iron Temple")?;
            Err(AdminError::Internal("boom".into()))
        });
        assert!(result.is_err());

        let settings = store.read(|tx| tx.settings_map()).unwrap();
        assert!(settings.is_empty());
    }

    #[test]
    fn test_panic_inside_transaction_leaves_store_usable() {
        let store = Store::open_in_memory().unwrap();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            store.transaction(|tx| -> Result<()> {
                tx.put_setting("app_name", "Iron Temple")?;
                panic!("handler bug");
            })
        }));
        assert!(outcome.is_err());

        store.ping().unwrap();
        store.transaction(|tx| tx.put_setting("currency_symbol", "€")).unwrap();
        let settings = store.read(|tx| tx.settings_map()).unwrap();
        assert!(!settings.contains_key("app_name"));
        assert_eq!(settings.get("currency_symbol").map(String::as_str), Some("€"));
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<()> = store.transaction(|tx| {
            tx.conn.execute_batch(
                "PRAGMA defer_foreign_keys = ON;
                 INSERT INTO members (member_id, user_id, status, created_at)
                 VALUES ('MEM-000001', 999, 'active', '2024-01-01');",
            )?;
            Ok(())
        });
        assert!(matches!(result, Err(AdminError::Database(_))));

        store.transaction(|tx| tx.put_setting("app_name", "Iron Temple")).unwrap();
        let members: i64 = store
            .read(|tx| Ok(tx.conn.query_row("SELECT COUNT(*) FROM members", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(members, 0);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let store = Store::open_in_memory().unwrap();
        store.transaction(|tx| tx.put_setting("app_name", "Iron Temple")).unwrap();
        let settings = store.read(|tx| tx.settings_map()).unwrap();
        assert_eq!(settings.get("app_name").map(String::as_str), Some("Iron Temple"));
    }
}
