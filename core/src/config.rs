use crate::types::UserId;
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_DB_PATH: &str = "bathtub.db";
pub const DEFAULT_MAX_DICE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Text a message must start with to be treated as a command.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// The bot's own platform identity; its messages are never handled.
    #[serde(default)]
    pub bot_user_id: Option<UserId>,

    /// Identities allowed to run entity-creation commands.
    /// Empty means the gate is open. Older config files name a single
    /// `privileged_user` instead.
    #[serde(default, alias = "privileged_user", deserialize_with = "one_or_many")]
    pub privileged_users: Vec<UserId>,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Upper bound on `<count>` in a dice expression.
    #[serde(default = "default_max_dice")]
    pub max_dice: u32,

    /// Fixes the dice streams for reproducible runs. Random when unset.
    #[serde(default)]
    pub dice_seed: Option<u64>,
}

fn default_prefix() -> String { DEFAULT_PREFIX.into() }
fn default_db_path() -> String { DEFAULT_DB_PATH.into() }
fn default_max_dice() -> u32 { DEFAULT_MAX_DICE }

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(UserId),
    Many(Vec<UserId>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<UserId>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(user) => vec![user],
        OneOrMany::Many(users) => users,
    })
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix:           default_prefix(),
            bot_user_id:      None,
            privileged_users: Vec::new(),
            db_path:          default_db_path(),
            max_dice:         DEFAULT_MAX_DICE,
            dice_seed:        None,
        }
    }
}

impl BotConfig {
    /// Load from a JSON config file.
    /// In tests, use BotConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::info!(
            "Config loaded: prefix={:?} db_path={} privileged_users={}",
            config.prefix,
            config.db_path,
            config.privileged_users.len(),
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: BotConfig = serde_json::from_str(content)?;
        if config.prefix.is_empty() {
            anyhow::bail!("prefix must not be empty");
        }
        Ok(config)
    }

    /// Config with hardcoded values for use in unit tests.
    /// `admin` is the only privileged user; dice are seeded.
    pub fn default_test() -> Self {
        Self {
            bot_user_id:      Some("bot".into()),
            privileged_users: vec!["admin".into()],
            db_path:          ":memory:".into(),
            dice_seed:        Some(0x5EED_D1CE),
            ..Self::default()
        }
    }
}
