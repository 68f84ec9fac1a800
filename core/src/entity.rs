//! Persisted entities and the `Document` contract the store works against.
//!
//! Field names are the document keys on disk; do not rename them.

use crate::types::{ItemId, UserId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub const STARTING_GOLD: i64 = 100;

/// An entity stored as one JSON document in a named collection.
///
/// The document's `id` field is its identifier. The store keys documents
/// by `key()` and never rewrites `id` on update.
pub trait Document: Serialize + DeserializeOwned + Send {
    const COLLECTION: &'static str;

    /// The identifier rendered as the collection key.
    fn key(&self) -> String;
}

/// A document whose identifier the store assigns (max + 1).
pub trait Numbered: Document {
    fn set_id(&mut self, id: ItemId);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: UserId,
    pub charname: String,
    pub gold: i64,
    /// Owned item ids. Duplicates allowed, order not significant.
    pub items: Vec<ItemId>,
}

impl Player {
    /// A fresh player: starting gold, no items.
    pub fn new(id: impl Into<UserId>, charname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            charname: charname.into(),
            gold: STARTING_GOLD,
            items: Vec::new(),
        }
    }
}

impl Document for Player {
    const COLLECTION: &'static str = "BathtubPlayers";

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub desc: String,
    pub cost: i64,
    pub sell: i64,
}

impl Item {
    /// An item awaiting an id from the store.
    pub fn unnumbered(
        name: impl Into<String>,
        desc: impl Into<String>,
        cost: i64,
        sell: i64,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            desc: desc.into(),
            cost,
            sell,
        }
    }
}

impl Document for Item {
    const COLLECTION: &'static str = "BathtubItems";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Numbered for Item {
    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }
}

/// A shop stocking items. Part of the persisted schema; no command
/// creates or changes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: ItemId,
    pub name: String,
    pub inv: Vec<ItemId>,
}

impl Document for Store {
    const COLLECTION: &'static str = "BathtubStores";

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Numbered for Store {
    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }
}
