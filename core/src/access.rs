//! Who may run which commands.

use crate::{config::BotConfig, types::UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// `newplayer` and `newitem`.
    CreateEntities,
}

pub trait AccessPolicy: Send + Sync {
    fn permits(&self, actor: &str, capability: Capability) -> bool;
}

/// Config-backed policy: a fixed set of privileged identities holds every
/// capability. An empty set grants everything to everyone.
#[derive(Debug, Clone, Default)]
pub struct PrivilegedUsers {
    users: HashSet<UserId>,
}

impl PrivilegedUsers {
    pub fn new<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        Self { users: users.into_iter().map(Into::into).collect() }
    }

    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(config.privileged_users.iter().cloned())
    }

    pub fn is_open(&self) -> bool {
        self.users.is_empty()
    }
}

impl AccessPolicy for PrivilegedUsers {
    fn permits(&self, actor: &str, _capability: Capability) -> bool {
        self.is_open() || self.users.contains(actor)
    }
}
