use crate::{Choice, GameError, Result};
use rps_core::{Address, U256};
use serde::{Deserialize, Serialize};

/// Ledger-assigned game identifier.
pub type GameId = u64;

/// Parse a user-supplied game id.
pub fn parse_game_id(input: &str) -> Result<GameId> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GameError::validation("game id is required"));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(GameError::validation(format!(
            "'{}' is not a valid game id",
            trimmed
        )));
    }
    trimmed
        .parse()
        .map_err(|_| GameError::validation(format!("game id '{}' is out of range", trimmed)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingOpponent,
    AwaitingMoves,
    AwaitingResolution,
    Resolved,
    TimedOut,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Resolved | Phase::TimedOut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Winner(Address),
    Draw,
}

/// A confirmed ledger fact about one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Created { creator: Address, stake: U256 },
    Joined { opponent: Address },
    Played { player: Address, choice: Choice },
    Resolved { outcome: Outcome },
    TimedOut,
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Created { .. } => "Created",
            GameEvent::Joined { .. } => "Joined",
            GameEvent::Played { .. } => "Played",
            GameEvent::Resolved { .. } => "Resolved",
            GameEvent::TimedOut => "TimedOut",
        }
    }

    pub fn same_kind(&self, other: &GameEvent) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Local view of one game, built only from confirmed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    id: GameId,
    creator: Address,
    opponent: Option<Address>,
    stake: U256,
    phase: Phase,
    creator_move: Choice,
    opponent_move: Choice,
    outcome: Option<Outcome>,
}

impl Game {
    pub fn created(id: GameId, creator: Address, stake: U256) -> Self {
        Self {
            id,
            creator,
            opponent: None,
            stake,
            phase: Phase::AwaitingOpponent,
            creator_move: Choice::None,
            opponent_move: Choice::None,
            outcome: None,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn opponent(&self) -> Option<Address> {
        self.opponent
    }

    pub fn stake(&self) -> U256 {
        self.stake
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_participant(&self, account: Address) -> bool {
        account == self.creator || self.opponent == Some(account)
    }

    /// Confirmed move of `participant`, `Choice::None` until one is observed.
    pub fn move_of(&self, participant: Address) -> Choice {
        if participant == self.creator {
            self.creator_move
        } else if self.opponent == Some(participant) {
            self.opponent_move
        } else {
            Choice::None
        }
    }

    fn reject(&self, event: &GameEvent, detail: &str) -> GameError {
        GameError::invalid_transition(
            self.id,
            Some(self.phase),
            format!("{} ({})", event.name(), detail),
        )
    }

    /// Advance the phase machine. On error the record is left untouched.
    pub fn apply(&mut self, event: &GameEvent) -> Result<()> {
        match (self.phase, event) {
            (_, GameEvent::Created { .. }) => Err(self.reject(event, "game already exists")),

            (Phase::AwaitingOpponent, GameEvent::Joined { opponent }) => {
                if *opponent == self.creator {
                    return Err(self.reject(event, "creator cannot join own game"));
                }
                self.opponent = Some(*opponent);
                self.phase = Phase::AwaitingMoves;
                tracing::info!("Game {} joined by {:?}", self.id, opponent);
                Ok(())
            }

            (Phase::AwaitingMoves, GameEvent::Played { player, choice }) => {
                if !choice.is_move() {
                    return Err(self.reject(event, "no choice"));
                }
                let slot = if *player == self.creator {
                    &mut self.creator_move
                } else if self.opponent == Some(*player) {
                    &mut self.opponent_move
                } else {
                    return Err(self.reject(event, "not a participant"));
                };
                if slot.is_move() {
                    return Err(self.reject(event, "move already recorded"));
                }
                *slot = *choice;

                if self.creator_move.is_move() && self.opponent_move.is_move() {
                    self.phase = Phase::AwaitingResolution;
                }
                tracing::info!("Game {} move by {:?} recorded", self.id, player);
                Ok(())
            }

            // the deciding move and the resolution can land in one transaction
            // whose sibling move was never observed locally
            (Phase::AwaitingMoves | Phase::AwaitingResolution, GameEvent::Resolved { outcome }) => {
                if let Outcome::Winner(winner) = outcome {
                    if !self.is_participant(*winner) {
                        return Err(self.reject(event, "winner is not a participant"));
                    }
                }
                self.outcome = Some(*outcome);
                self.phase = Phase::Resolved;
                tracing::info!("Game {} resolved: {:?}", self.id, outcome);
                Ok(())
            }

            (phase, GameEvent::TimedOut) if !phase.is_terminal() => {
                self.phase = Phase::TimedOut;
                tracing::info!("Game {} timed out from {:?}", self.id, phase);
                Ok(())
            }

            _ => Err(self.reject(event, "not allowed in this phase")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> Address {
        Address::repeat_byte(0x01)
    }

    fn opponent() -> Address {
        Address::repeat_byte(0x02)
    }

    fn joined_game() -> Game {
        let mut game = Game::created(3, creator(), U256::from(100));
        game.apply(&GameEvent::Joined { opponent: opponent() }).unwrap();
        game
    }

    #[test]
    fn test_parse_game_id() {
        assert_eq!(parse_game_id("7").unwrap(), 7);
        assert_eq!(parse_game_id(" 42 ").unwrap(), 42);
        for input in ["", "  ", "-1", "0x10", "1.5", "abc", "99999999999999999999999"] {
            assert!(
                matches!(parse_game_id(input), Err(GameError::Validation(_))),
                "expected validation error for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut game = joined_game();
        assert_eq!(game.phase(), Phase::AwaitingMoves);
        assert_eq!(game.opponent(), Some(opponent()));

        game.apply(&GameEvent::Played {
            player: creator(),
            choice: Choice::Rock,
        })
        .unwrap();
        assert_eq!(game.phase(), Phase::AwaitingMoves);
        assert_eq!(game.move_of(creator()), Choice::Rock);
        assert_eq!(game.move_of(opponent()), Choice::None);

        game.apply(&GameEvent::Played {
            player: opponent(),
            choice: Choice::Paper,
        })
        .unwrap();
        assert_eq!(game.phase(), Phase::AwaitingResolution);

        game.apply(&GameEvent::Resolved {
            outcome: Outcome::Winner(opponent()),
        })
        .unwrap();
        assert_eq!(game.phase(), Phase::Resolved);
        assert_eq!(game.outcome(), Some(Outcome::Winner(opponent())));
    }

    #[test]
    fn test_rejects_out_of_phase_events() {
        let mut game = Game::created(1, creator(), U256::from(5));
        let played = GameEvent::Played {
            player: creator(),
            choice: Choice::Rock,
        };
        assert!(matches!(
            game.apply(&played),
            Err(GameError::InvalidTransition { game_id: 1, .. })
        ));
        assert!(game
            .apply(&GameEvent::Resolved {
                outcome: Outcome::Draw
            })
            .is_err());
        assert!(game
            .apply(&GameEvent::Created {
                creator: creator(),
                stake: U256::from(5)
            })
            .is_err());
        assert_eq!(game, Game::created(1, creator(), U256::from(5)));
    }

    #[test]
    fn test_rejects_bad_moves() {
        let mut game = joined_game();
        let stranger = Address::repeat_byte(0x09);

        assert!(game
            .apply(&GameEvent::Played {
                player: stranger,
                choice: Choice::Rock
            })
            .is_err());
        assert!(game
            .apply(&GameEvent::Played {
                player: creator(),
                choice: Choice::None
            })
            .is_err());

        game.apply(&GameEvent::Played {
            player: creator(),
            choice: Choice::Rock,
        })
        .unwrap();
        assert!(game
            .apply(&GameEvent::Played {
                player: creator(),
                choice: Choice::Scissors
            })
            .is_err());
        assert_eq!(game.move_of(creator()), Choice::Rock);
    }

    #[test]
    fn test_creator_cannot_join_own_game() {
        let mut game = Game::created(1, creator(), U256::from(5));
        assert!(game.apply(&GameEvent::Joined { opponent: creator() }).is_err());
        assert_eq!(game.phase(), Phase::AwaitingOpponent);
    }

    #[test]
    fn test_timeout_from_any_open_phase() {
        let mut waiting = Game::created(1, creator(), U256::from(5));
        waiting.apply(&GameEvent::TimedOut).unwrap();
        assert_eq!(waiting.phase(), Phase::TimedOut);

        let mut playing = joined_game();
        playing
            .apply(&GameEvent::Played {
                player: opponent(),
                choice: Choice::Scissors,
            })
            .unwrap();
        playing.apply(&GameEvent::TimedOut).unwrap();
        assert_eq!(playing.phase(), Phase::TimedOut);

        // terminal phases stay put
        assert!(playing.apply(&GameEvent::TimedOut).is_err());
        assert!(playing
            .apply(&GameEvent::Joined {
                opponent: opponent()
            })
            .is_err());
    }

    #[test]
    fn test_resolution_may_skip_unobserved_move() {
        let mut game = joined_game();
        game.apply(&GameEvent::Played {
            player: creator(),
            choice: Choice::Paper,
        })
        .unwrap();
        game.apply(&GameEvent::Resolved {
            outcome: Outcome::Draw,
        })
        .unwrap();
        assert_eq!(game.phase(), Phase::Resolved);
    }
}
