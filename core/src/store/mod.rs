//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The router calls store methods; it never executes SQL directly.
//!
//! One `BotStore` is shared by every handler thread. Each public method
//! holds the connection lock for exactly one statement or transaction,
//! so every method is atomic with respect to the others.

mod command_log;
mod document;

pub use document::UpsertOutcome;

use crate::error::BotResult;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct BotStore {
    conn: Mutex<Connection>,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl BotStore {
    pub fn open(path: &str) -> BotResult<Self> {
        if path == ":memory:" {
            return Self::in_memory();
        }
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        log::info!("Opened store at {path}");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> BotResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Open an in-memory store with the schema applied.
    pub fn in_memory_migrated() -> BotResult<Self> {
        let store = Self::in_memory()?;
        store.migrate()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> BotResult<()> {
        let conn = self.lock();
        conn.execute_batch(include_str!("../../../migrations/001_documents.sql"))?;
        conn.execute_batch(include_str!("../../../migrations/002_command_log.sql"))?;
        Ok(())
    }

    /// Lock poisoning is ignored: no statement spans a handler panic.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
