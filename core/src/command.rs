use crate::{
    dice::{DiceError, DiceExpression},
    types::UserId,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error("{command}: expected {expected} arguments, got {actual}")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{command}: malformed payload {payload:?} (expected {usage})")]
    MalformedPayload {
        command: &'static str,
        payload: String,
        usage: &'static str,
    },

    #[error("{field}: {value:?} is not an integer")]
    InvalidInteger { field: &'static str, value: String },
}

/// Every command the router understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Ping,
    Roll { expression: DiceExpression },
    NewPlayer { player_id: UserId, charname: String },
    NewItem { name: String, desc: String, cost: i64, sell: i64 },
}

impl BotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping           => "ping",
            Self::Roll { .. }    => "roll",
            Self::NewPlayer { .. } => "newplayer",
            Self::NewItem { .. } => "newitem",
        }
    }

    /// Parse a command line (prefix already stripped).
    ///
    /// `Ok(None)` means the line names no known command. Arguments of a
    /// known command that fail to parse give `Err`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        if line == "ping" {
            return Ok(Some(Self::Ping));
        }
        if let Some(rest) = line.strip_prefix("roll ") {
            let expression = DiceExpression::parse(rest)?;
            return Ok(Some(Self::Roll { expression }));
        }
        if let Some(rest) = line.strip_prefix("newplayer ") {
            return parse_new_player(rest).map(Some);
        }
        if let Some(rest) = line.strip_prefix("newitem ") {
            return parse_new_item(rest).map(Some);
        }
        Ok(None)
    }

    /// The command name for a line that failed to parse, for logging.
    pub fn name_of_line(line: &str) -> &str {
        line.split_whitespace().next().unwrap_or("")
    }
}

fn parse_new_player(args: &str) -> Result<BotCommand, ParseError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(ParseError::ArgumentCount {
            command: "newplayer",
            expected: 2,
            actual: tokens.len(),
        });
    }
    Ok(BotCommand::NewPlayer {
        player_id: normalize_user_id(tokens[0]).to_string(),
        charname: tokens[1].to_string(),
    })
}

const NEW_ITEM_USAGE: &str = "<name><desc><cost><sell>";

fn parse_new_item(args: &str) -> Result<BotCommand, ParseError> {
    let payload = args.trim();
    let malformed = || ParseError::MalformedPayload {
        command: "newitem",
        payload: payload.to_string(),
        usage: NEW_ITEM_USAGE,
    };
    let inner = payload
        .strip_prefix('<')
        .and_then(|p| p.strip_suffix('>'))
        .ok_or_else(malformed)?;

    let fields: Vec<&str> = inner.split("><").collect();
    if fields.len() != 4 {
        return Err(ParseError::ArgumentCount {
            command: "newitem",
            expected: 4,
            actual: fields.len(),
        });
    }

    Ok(BotCommand::NewItem {
        name: fields[0].to_string(),
        desc: fields[1].to_string(),
        cost: parse_int("cost", fields[2])?,
        sell: parse_int("sell", fields[3])?,
    })
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

/// Accept a platform mention (`<@123>`, `<@!123>`) in place of a raw id.
fn normalize_user_id(token: &str) -> &str {
    token
        .strip_prefix("<@")
        .and_then(|t| t.strip_suffix('>'))
        .map(|t| t.strip_prefix('!').unwrap_or(t))
        .unwrap_or(token)
}
