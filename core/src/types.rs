//! Shared primitive types used across the bot.

/// A platform identity (message author, privileged actor, player id).
pub type UserId = String;

/// The channel a message arrived on and replies are sent to.
pub type ChannelId = String;

/// A system-assigned, auto-numbered entity identifier (items, stores).
pub type ItemId = i64;

/// A per-command correlation id written to the command log.
pub type CommandId = String;
