//! The command router: one inbound message in, one `Outcome` out.
//!
//! ORDER (fixed):
//!   1. Drop the bot's own messages.
//!   2. Drop messages without the configured prefix.
//!   3. Parse the command line; unknown commands are dropped.
//!   4. Check capabilities for entity-creation commands.
//!   5. Execute, then write one command-log row.
//!
//! RULES:
//!   - The router holds no per-message state; handlers may run concurrently.
//!   - Failures never reach the chat. They come back as `Outcome::Rejected`,
//!     a `warn!` line and a `rejected` command-log row.
//!   - Ignored messages never touch the store.

use crate::{
    access::{AccessPolicy, Capability, PrivilegedUsers},
    command::{BotCommand, ParseError},
    config::BotConfig,
    dispatch::InboundMessage,
    entity::{Item, Player},
    error::{BotError, BotResult},
    event::{BotEvent, CommandLogEntry},
    rng::RngBank,
    store::BotStore,
};
use std::sync::Arc;

pub const PONG_REPLY: &str = "Pong!";
pub const ITEM_ADDED_REPLY: &str = "New item added successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OwnMessage,
    NotACommand,
    UnknownCommand,
}

#[derive(Debug)]
pub enum Outcome {
    Ignored(IgnoreReason),
    /// Handled; send this text back to the channel.
    Replied(String),
    /// Handled; nothing to send.
    Completed,
    Rejected(BotError),
}

impl Outcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            Self::Replied(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

pub struct CommandRouter {
    config: BotConfig,
    store: Arc<BotStore>,
    policy: Box<dyn AccessPolicy>,
    rng_bank: RngBank,
}

impl CommandRouter {
    pub fn new(config: BotConfig, store: Arc<BotStore>, policy: Box<dyn AccessPolicy>) -> Self {
        let rng_bank = RngBank::from_optional_seed(config.dice_seed);
        Self { config, store, policy, rng_bank }
    }

    /// Router with the config's privileged users as the access policy.
    pub fn build(config: BotConfig, store: Arc<BotStore>) -> Self {
        let policy = PrivilegedUsers::from_config(&config);
        if policy.is_open() {
            log::warn!("No privileged users configured: anyone may create players and items");
        }
        Self::new(config, store, Box::new(policy))
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn store(&self) -> &BotStore {
        &self.store
    }

    pub fn handle(&self, msg: &InboundMessage) -> Outcome {
        log::trace!("{} in {}: {:?}", msg.author_id, msg.channel_id, msg.content);
        if self.config.bot_user_id.as_deref() == Some(msg.author_id.as_str()) {
            return Outcome::Ignored(IgnoreReason::OwnMessage);
        }
        let Some(line) = msg.content.strip_prefix(self.config.prefix.as_str()) else {
            return Outcome::Ignored(IgnoreReason::NotACommand);
        };
        log::debug!("{} in {}: {line:?}", msg.author_id, msg.channel_id);

        let command = match BotCommand::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                log::debug!("Ignoring unknown command {line:?}");
                return Outcome::Ignored(IgnoreReason::UnknownCommand);
            }
            Err(e) => return self.reject(msg, BotCommand::name_of_line(line), e.into()),
        };

        match self.execute(msg, &command) {
            Ok((event, reply)) => {
                log::info!("{} by {}: {:?}", command.name(), msg.author_id, event);
                self.record(msg, command.name(), &event);
                match reply {
                    Some(text) => Outcome::Replied(text),
                    None => Outcome::Completed,
                }
            }
            Err(e) => self.reject(msg, command.name(), e),
        }
    }

    fn execute(
        &self,
        msg: &InboundMessage,
        command: &BotCommand,
    ) -> BotResult<(BotEvent, Option<String>)> {
        match command {
            BotCommand::Ping => Ok((BotEvent::PingAnswered, Some(PONG_REPLY.to_string()))),

            BotCommand::Roll { expression } => {
                let mut rng = self.rng_bank.next_rng();
                let roll = expression
                    .roll_within(self.config.max_dice, &mut rng)
                    .map_err(ParseError::from)?;
                let reply = roll.to_reply();
                let event = BotEvent::DiceRolled {
                    expression: roll.expression,
                    stream: rng.stream,
                    rolls: roll.rolls,
                    total: roll.total,
                };
                Ok((event, Some(reply)))
            }

            BotCommand::NewPlayer { player_id, charname } => {
                self.authorize(&msg.author_id, Capability::CreateEntities)?;
                let player = Player::new(player_id.as_str(), charname.as_str());
                let outcome = self.store.upsert(&player)?;
                let event = BotEvent::PlayerUpserted {
                    player_id: player.id,
                    charname: player.charname,
                    outcome,
                };
                Ok((event, None))
            }

            BotCommand::NewItem { name, desc, cost, sell } => {
                self.authorize(&msg.author_id, Capability::CreateEntities)?;
                let mut item = Item::unnumbered(name.as_str(), desc.as_str(), *cost, *sell);
                let item_id = self.store.insert_numbered(&mut item)?;
                let event = BotEvent::ItemCreated { item_id, name: item.name };
                Ok((event, Some(ITEM_ADDED_REPLY.to_string())))
            }
        }
    }

    fn authorize(&self, actor: &str, capability: Capability) -> BotResult<()> {
        if self.policy.permits(actor, capability) {
            Ok(())
        } else {
            Err(BotError::Unauthorized {
                actor: actor.to_string(),
                capability,
            })
        }
    }

    fn reject(&self, msg: &InboundMessage, command: &str, error: BotError) -> Outcome {
        log::warn!(
            "Rejected {command} from {} in {}: {error}",
            msg.author_id,
            msg.channel_id
        );
        let event = BotEvent::CommandRejected {
            kind: error.kind().to_string(),
            reason: error.to_string(),
        };
        self.record(msg, command, &event);
        Outcome::Rejected(error)
    }

    /// Write the command-log row. A failure here is logged, never raised.
    fn record(&self, msg: &InboundMessage, command: &str, event: &BotEvent) {
        let result = CommandLogEntry::new(&msg.author_id, &msg.channel_id, command, event)
            .map_err(BotError::from)
            .and_then(|entry| self.store.append_command(&entry));
        if let Err(e) = result {
            log::error!("Could not log {command} from {}: {e}", msg.author_id);
        }
    }
}
