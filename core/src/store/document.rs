//! Document collections: generic upsert, lookup and id allocation.

use super::BotStore;
use crate::{
    entity::{Document, Numbered},
    error::BotResult,
    types::ItemId,
};
use rusqlite::{params, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl BotStore {
    // ── Upsert ─────────────────────────────────────────────────

    /// Insert `doc`, or overwrite the fields of the existing document
    /// with the same key. The stored `id` is never rewritten.
    pub fn upsert<D: Document>(&self, doc: &D) -> BotResult<UpsertOutcome> {
        let key = doc.key();
        let mut fields = serde_json::to_value(doc)?;
        let full_body = fields.to_string();
        if let Some(map) = fields.as_object_mut() {
            map.remove("id");
        }
        let update_body = fields.to_string();

        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existed = tx
            .query_row(
                "SELECT 1 FROM document WHERE collection = ?1 AND doc_key = ?2",
                params![D::COLLECTION, key],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        tx.execute(
            "INSERT INTO document (collection, doc_key, body) VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, doc_key)
             DO UPDATE SET body = json_patch(document.body, ?4)",
            params![D::COLLECTION, key, full_body, update_body],
        )?;
        tx.commit()?;

        let outcome = if existed { UpsertOutcome::Updated } else { UpsertOutcome::Inserted };
        log::debug!("{} {key}: {outcome:?}", D::COLLECTION);
        Ok(outcome)
    }

    // ── Lookup ─────────────────────────────────────────────────

    pub fn find<D: Document>(&self, key: &str) -> BotResult<Option<D>> {
        let conn = self.lock();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM document WHERE collection = ?1 AND doc_key = ?2",
                params![D::COLLECTION, key],
                |row| row.get(0),
            )
            .optional()?;
        match body {
            Some(body) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Every document in the collection, in insertion order.
    pub fn all<D: Document>(&self) -> BotResult<Vec<D>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT body FROM document WHERE collection = ?1 ORDER BY rowid ASC",
        )?;
        let bodies = stmt
            .query_map(params![D::COLLECTION], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(Into::into))
            .collect()
    }

    pub fn count<D: Document>(&self) -> BotResult<i64> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM document WHERE collection = ?1",
            params![D::COLLECTION],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ── Id allocation ──────────────────────────────────────────

    /// One past the highest id in the collection, or 1 when empty.
    /// Read-only: a concurrent insert may claim the same id before the
    /// caller uses it. Use `insert_numbered` to allocate and insert.
    pub fn next_id<D: Numbered>(&self) -> BotResult<ItemId> {
        let conn = self.lock();
        let highest: Option<i64> = conn
            .query_row(
                "SELECT json_extract(body, '$.id') FROM document
                 WHERE collection = ?1
                 ORDER BY json_extract(body, '$.id') DESC LIMIT 1",
                params![D::COLLECTION],
                |row| row.get(0),
            )
            .optional()?;
        Ok(highest.map_or(1, |id| id + 1))
    }

    /// Allocate the next id and insert `doc` under it in one statement.
    /// The assigned id is written back into `doc` and returned.
    pub fn insert_numbered<D: Numbered>(&self, doc: &mut D) -> BotResult<ItemId> {
        let body = serde_json::to_string(&*doc)?;
        let conn = self.lock();
        let id: i64 = conn.query_row(
            "INSERT INTO document (collection, doc_key, body)
             SELECT ?1, CAST(next_id AS TEXT), json_set(?2, '$.id', next_id)
             FROM (
                 SELECT COALESCE(MAX(json_extract(body, '$.id')), 0) + 1 AS next_id
                 FROM document WHERE collection = ?1
             )
             RETURNING json_extract(body, '$.id')",
            params![D::COLLECTION, body],
            |row| row.get(0),
        )?;
        doc.set_id(id);
        log::debug!("{} allocated id {id}", D::COLLECTION);
        Ok(id)
    }
}
