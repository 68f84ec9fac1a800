//! Command events: the structured record of what each command did.
//!
//! RULE: Every recognized command produces exactly one event,
//! persisted to the command log. Ignored messages produce none.

use crate::{
    dice::DiceExpression,
    store::UpsertOutcome,
    types::{ChannelId, CommandId, ItemId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotEvent {
    PingAnswered,

    DiceRolled {
        expression: DiceExpression,
        /// RNG stream index, for replaying the roll under the same seed.
        stream: u64,
        rolls: Vec<u32>,
        total: u64,
    },

    PlayerUpserted {
        player_id: UserId,
        charname: String,
        outcome: UpsertOutcome,
    },

    ItemCreated {
        item_id: ItemId,
        name: String,
    },

    CommandRejected {
        kind: String,
        reason: String,
    },
}

impl BotEvent {
    /// `handled` or `rejected`, for the command_log outcome column.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::CommandRejected { .. } => "rejected",
            _ => "handled",
        }
    }
}

/// The command log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandLogEntry {
    pub id: Option<i64>,
    pub command_id: CommandId,
    pub received_at: DateTime<Utc>,
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub command: String,
    pub outcome: String,
    pub payload: String, // JSON-serialized BotEvent
}

impl CommandLogEntry {
    pub fn new(
        author_id: &str,
        channel_id: &str,
        command: &str,
        event: &BotEvent,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            command_id: uuid::Uuid::new_v4().to_string(),
            received_at: Utc::now(),
            author_id: author_id.to_string(),
            channel_id: channel_id.to_string(),
            command: command.to_string(),
            outcome: event.outcome_label().to_string(),
            payload: serde_json::to_string(event)?,
        })
    }

    pub fn event(&self) -> serde_json::Result<BotEvent> {
        serde_json::from_str(&self.payload)
    }
}
