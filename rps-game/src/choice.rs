use crate::{GameError, Result};
use rps_core::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A move as enumerated by the game contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Choice {
    #[default]
    None,
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    pub const MOVES: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// Contract enumeration value. This is the only place the numbering lives.
    pub fn encode(self) -> u8 {
        match self {
            Choice::None => 0,
            Choice::Rock => 1,
            Choice::Paper => 2,
            Choice::Scissors => 3,
        }
    }

    pub fn decode(value: u64) -> Result<Self> {
        match value {
            0 => Ok(Choice::None),
            1 => Ok(Choice::Rock),
            2 => Ok(Choice::Paper),
            3 => Ok(Choice::Scissors),
            other => Err(GameError::UnknownChoice(other)),
        }
    }

    /// Decode an ABI word, as found in event payloads.
    pub fn decode_word(word: U256) -> Result<Self> {
        if word > U256::from(u8::MAX) {
            return Err(GameError::UnknownChoice(word.low_u64()));
        }
        Self::decode(word.low_u64())
    }

    pub fn is_move(self) -> bool {
        self != Choice::None
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Choice::None => "None",
            Choice::Rock => "Rock",
            Choice::Paper => "Paper",
            Choice::Scissors => "Scissors",
        };
        f.write_str(name)
    }
}

impl FromStr for Choice {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" => Ok(Choice::Rock),
            "paper" | "p" => Ok(Choice::Paper),
            "scissors" | "s" => Ok(Choice::Scissors),
            other => Err(GameError::validation(format!(
                "'{}' is not one of rock, paper, scissors",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_moves_round_trip() {
        for choice in Choice::MOVES {
            assert_eq!(Choice::decode(choice.encode() as u64).unwrap(), choice);
        }
    }

    #[test]
    fn test_enumeration_values() {
        assert_eq!(Choice::None.encode(), 0);
        assert_eq!(Choice::Rock.encode(), 1);
        assert_eq!(Choice::Paper.encode(), 2);
        assert_eq!(Choice::Scissors.encode(), 3);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Rock".parse::<Choice>().unwrap(), Choice::Rock);
        assert_eq!(" paper ".parse::<Choice>().unwrap(), Choice::Paper);
        assert_eq!("S".parse::<Choice>().unwrap(), Choice::Scissors);
        assert!(matches!("none".parse::<Choice>(), Err(GameError::Validation(_))));
        assert!(matches!("lizard".parse::<Choice>(), Err(GameError::Validation(_))));
    }

    #[test]
    fn test_decode_word() {
        assert_eq!(Choice::decode_word(U256::from(2)).unwrap(), Choice::Paper);
        assert!(matches!(
            Choice::decode_word(U256::from(256)),
            Err(GameError::UnknownChoice(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_out_of_range_values_rejected(value in 4u64..) {
            prop_assert!(matches!(Choice::decode(value), Err(GameError::UnknownChoice(v)) if v == value));
        }
    }
}
