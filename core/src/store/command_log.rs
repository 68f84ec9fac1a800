//! Store methods for the command log.

use super::BotStore;
use crate::{error::BotResult, event::CommandLogEntry};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Row};

impl BotStore {
    pub fn append_command(&self, entry: &CommandLogEntry) -> BotResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO command_log
                (command_id, received_at, author_id, channel_id, command, outcome, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.command_id,
                entry.received_at.to_rfc3339(),
                entry.author_id,
                entry.channel_id,
                entry.command,
                entry.outcome,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    /// Commands issued by one author, oldest first.
    pub fn commands_for_author(&self, author_id: &str) -> BotResult<Vec<CommandLogEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, command_id, received_at, author_id, channel_id, command, outcome, payload
             FROM command_log WHERE author_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![author_id], log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// The most recent `limit` commands, newest first.
    pub fn recent_commands(&self, limit: usize) -> BotResult<Vec<CommandLogEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, command_id, received_at, author_id, channel_id, command, outcome, payload
             FROM command_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Number of logged commands with the given outcome (`handled` | `rejected`).
    pub fn command_count(&self, outcome: &str) -> BotResult<i64> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM command_log WHERE outcome = ?1",
            params![outcome],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn log_entry_from_row(row: &Row<'_>) -> rusqlite::Result<CommandLogEntry> {
    let received_at: String = row.get(2)?;
    let received_at = DateTime::parse_from_rfc3339(&received_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    Ok(CommandLogEntry {
        id:          Some(row.get(0)?),
        command_id:  row.get(1)?,
        received_at,
        author_id:   row.get(3)?,
        channel_id:  row.get(4)?,
        command:     row.get(5)?,
        outcome:     row.get(6)?,
        payload:     row.get(7)?,
    })
}
