//! Dice rolling for the `roll` command.
//!
//! Notation is exactly `<count>d<sides>`, e.g. `3d6`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: {0:?} (expected <count>d<sides>)")]
    InvalidNotation(String),
    #[error("Invalid number of dice: {0:?}")]
    InvalidCount(String),
    #[error("Invalid number of sides: {0:?}")]
    InvalidSides(String),
    #[error("A die needs at least one side")]
    ZeroSides,
    #[error("Cannot roll {count} dice at once (limit {max})")]
    TooManyDice { count: u32, max: u32 },
}

/// A parsed `<count>d<sides>` expression. Only `parse` builds one, so
/// `sides` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpression {
    count: u32,
    sides: u32,
}

impl DiceExpression {
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim();
        let mut parts = notation.split('d');
        let (count_str, sides_str) = match (parts.next(), parts.next(), parts.next()) {
            (Some(count), Some(sides), None) => (count, sides),
            _ => return Err(DiceError::InvalidNotation(notation.to_string())),
        };

        let count: u32 = count_str
            .parse()
            .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?;
        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;
        if sides == 0 {
            return Err(DiceError::ZeroSides);
        }

        Ok(Self { count, sides })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    /// Roll with `rng`, refusing expressions asking for more than `max` dice.
    /// Nothing is drawn when the limit is exceeded.
    pub fn roll_within<R: Rng>(&self, max: u32, rng: &mut R) -> Result<DiceRoll, DiceError> {
        if self.count > max {
            return Err(DiceError::TooManyDice { count: self.count, max });
        }
        Ok(self.roll_with_rng(rng))
    }

    fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> DiceRoll {
        let rolls: Vec<u32> = (0..self.count)
            .map(|_| rng.gen_range(1..=self.sides))
            .collect();
        let total = rolls.iter().map(|&r| u64::from(r)).sum();
        DiceRoll { expression: *self, rolls, total }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DiceExpression {
    type Error = DiceError;

    fn try_from(notation: String) -> Result<Self, Self::Error> {
        Self::parse(&notation)
    }
}

impl From<DiceExpression> for String {
    fn from(expression: DiceExpression) -> Self {
        expression.to_string()
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

/// Rolled values in draw order plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub total: u64,
}

impl DiceRoll {
    /// The chat reply: each roll followed by a space, then the total line.
    pub fn to_reply(&self) -> String {
        let mut reply = String::from("Rolls: ");
        for r in &self.rolls {
            reply.push_str(&r.to_string());
            reply.push(' ');
        }
        reply.push_str(&format!("\nTotal: {}", self.total));
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn parses_count_and_sides() {
        assert_eq!(
            DiceExpression::parse("3d6").unwrap(),
            DiceExpression { count: 3, sides: 6 }
        );
        assert_eq!(
            " 10d20\n".parse::<DiceExpression>().unwrap(),
            DiceExpression { count: 10, sides: 20 }
        );
    }

    #[test]
    fn rejects_malformed_notation() {
        assert!(matches!(DiceExpression::parse("36"), Err(DiceError::InvalidNotation(_))));
        assert!(matches!(DiceExpression::parse("3d6d2"), Err(DiceError::InvalidNotation(_))));
        assert!(matches!(DiceExpression::parse("d6"), Err(DiceError::InvalidCount(_))));
        assert!(matches!(DiceExpression::parse("3d"), Err(DiceError::InvalidSides(_))));
        assert!(matches!(DiceExpression::parse("xd6"), Err(DiceError::InvalidCount(_))));
        assert!(matches!(DiceExpression::parse("3dx"), Err(DiceError::InvalidSides(_))));
        assert!(matches!(DiceExpression::parse("3 d6"), Err(DiceError::InvalidCount(_))));
        assert!(matches!(DiceExpression::parse("3D6"), Err(DiceError::InvalidNotation(_))));
    }

    #[test]
    fn rejects_negative_and_zero() {
        assert!(matches!(DiceExpression::parse("-1d6"), Err(DiceError::InvalidCount(_))));
        assert!(matches!(DiceExpression::parse("2d-6"), Err(DiceError::InvalidSides(_))));
        assert_eq!(DiceExpression::parse("2d0"), Err(DiceError::ZeroSides));
    }

    #[test]
    fn zero_dice_roll_is_empty() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let roll = DiceExpression::parse("0d6").unwrap().roll_within(100, &mut rng).unwrap();
        assert!(roll.rolls.is_empty());
        assert_eq!(roll.total, 0);
        assert_eq!(roll.to_reply(), "Rolls: \nTotal: 0");
    }

    #[test]
    fn limit_is_enforced_before_rolling() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let huge = DiceExpression::parse("4000000000d6").unwrap();
        assert_eq!(
            huge.roll_within(100, &mut rng),
            Err(DiceError::TooManyDice { count: 4_000_000_000, max: 100 })
        );
        let roll = DiceExpression::parse("100d6").unwrap().roll_within(100, &mut rng).unwrap();
        assert_eq!(roll.rolls.len(), 100);
    }

    #[test]
    fn serde_goes_through_parse() {
        let expr: DiceExpression = serde_json::from_str(r#""3d6""#).unwrap();
        assert_eq!((expr.count(), expr.sides()), (3, 6));
        assert_eq!(serde_json::to_string(&expr).unwrap(), r#""3d6""#);
        assert!(serde_json::from_str::<DiceExpression>(r#""1d0""#).is_err());
        assert!(serde_json::from_str::<DiceExpression>(r#"{"count":1,"sides":0}"#).is_err());
    }

    #[test]
    fn rolls_stay_in_range_and_sum_to_total() {
        let mut rng = Pcg64Mcg::seed_from_u64(7);
        for sides in [1u32, 2, 6, 20, 100] {
            for count in [0u32, 1, 5, 50] {
                let roll = DiceExpression { count, sides }.roll_with_rng(&mut rng);
                assert_eq!(roll.rolls.len(), count as usize);
                assert!(roll.rolls.iter().all(|&r| (1..=sides).contains(&r)));
                assert_eq!(roll.total, roll.rolls.iter().map(|&r| r as u64).sum::<u64>());
            }
        }
    }

    #[test]
    fn reply_lists_rolls_then_total() {
        let roll = DiceRoll {
            expression: DiceExpression { count: 3, sides: 6 },
            rolls: vec![2, 5, 6],
            total: 13,
        };
        assert_eq!(roll.to_reply(), "Rolls: 2 5 6 \nTotal: 13");
    }

    #[test]
    fn same_seed_same_rolls() {
        let expr = DiceExpression { count: 8, sides: 12 };
        let a = expr.roll_with_rng(&mut Pcg64Mcg::seed_from_u64(99));
        let b = expr.roll_with_rng(&mut Pcg64Mcg::seed_from_u64(99));
        assert_eq!(a, b);
    }
}
