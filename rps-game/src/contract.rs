//! Binding to the game contract: callable functions, emitted events and their
//! topic layout.

use crate::game::{GameEvent, GameId, Outcome};
use crate::{Choice, GameError, Result};
use rps_core::{Address, Bytes, CoreError, EventRecord, OperationRequest, H256, U256};

pub const CREATE_GAME: &str = "createGame()";
pub const JOIN_GAME: &str = "joinGame(uint256)";
pub const PLAY: &str = "play(uint256,uint8)";
pub const HANDLE_TIMEOUT: &str = "handleTimeout(uint256)";
pub const GAME_COUNTER: &str = "gameCounter()";

pub const GAME_JOINED_EVENT: &str = "GameJoined(uint256,address)";
pub const MOVE_PLAYED_EVENT: &str = "MovePlayed(uint256,address,uint8)";
pub const GAME_RESOLVED_EVENT: &str = "GameResolved(uint256,address)";
pub const GAME_TIMED_OUT_EVENT: &str = "GameTimedOut(uint256)";

pub fn id_topic(id: GameId) -> H256 {
    H256::from_low_u64_be(id)
}

pub fn address_topic(address: Address) -> H256 {
    let mut topic = H256::zero();
    topic.0[12..].copy_from_slice(address.as_bytes());
    topic
}

/// Game id carried in an indexed field; `None` if it does not fit a `GameId`.
pub fn topic_to_id(topic: H256) -> Option<GameId> {
    let value = U256::from_big_endian(topic.as_bytes());
    (value <= U256::from(u64::MAX)).then(|| value.low_u64())
}

pub fn topic_to_address(topic: H256) -> Address {
    Address::from_slice(&topic.as_bytes()[12..])
}

fn signature_topic(signature: &str) -> H256 {
    H256::from(rps_core::keccak256(signature))
}

/// View request for the contract's monotonic game counter.
pub fn counter_view(contract: Address) -> OperationRequest {
    OperationRequest::new(contract, GAME_COUNTER, Vec::new())
}

pub fn decode_counter(output: &Bytes) -> Result<U256> {
    if output.len() != 32 {
        return Err(CoreError::internal(format!(
            "counter view returned {} bytes, expected 32",
            output.len()
        ))
        .into());
    }
    Ok(U256::from_big_endian(output))
}

/// Topic 0 of every event the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTopics {
    pub created: H256,
    pub joined: H256,
    pub played: H256,
    pub resolved: H256,
    pub timed_out: H256,
}

impl EventTopics {
    /// `created` comes from configuration; the rest follow from the event
    /// signatures.
    pub fn new(created: H256) -> Self {
        Self {
            created,
            joined: signature_topic(GAME_JOINED_EVENT),
            played: signature_topic(MOVE_PLAYED_EVENT),
            resolved: signature_topic(GAME_RESOLVED_EVENT),
            timed_out: signature_topic(GAME_TIMED_OUT_EVENT),
        }
    }

    pub fn all(&self) -> [H256; 5] {
        [
            self.created,
            self.joined,
            self.played,
            self.resolved,
            self.timed_out,
        ]
    }

    /// Decode one record. `Ok(None)` for events this client does not track.
    pub fn decode(&self, record: &EventRecord) -> Result<Option<(GameId, GameEvent)>> {
        let Some(signature) = record.signature() else {
            return Ok(None);
        };
        if !self.all().contains(&signature) {
            return Ok(None);
        }

        let malformed = |what: &str| {
            GameError::event_not_found(format!(
                "event {:?} is missing its {}",
                signature, what
            ))
        };
        let indexed = |index: usize, what: &str| {
            record.topics.get(index).copied().ok_or_else(|| malformed(what))
        };

        let id = topic_to_id(indexed(1, "game id")?).ok_or_else(|| malformed("in-range game id"))?;

        let event = if signature == self.created {
            GameEvent::Created {
                creator: topic_to_address(indexed(2, "creator")?),
                stake: record.data_word(0).ok_or_else(|| malformed("stake"))?,
            }
        } else if signature == self.joined {
            GameEvent::Joined {
                opponent: topic_to_address(indexed(2, "opponent")?),
            }
        } else if signature == self.played {
            GameEvent::Played {
                player: topic_to_address(indexed(2, "player")?),
                choice: Choice::decode_word(record.data_word(0).ok_or_else(|| malformed("choice"))?)?,
            }
        } else if signature == self.resolved {
            let winner = topic_to_address(indexed(2, "winner")?);
            GameEvent::Resolved {
                outcome: if winner.is_zero() {
                    Outcome::Draw
                } else {
                    Outcome::Winner(winner)
                },
            }
        } else {
            GameEvent::TimedOut
        };

        Ok(Some((id, event)))
    }

    /// Events for `game_id` emitted by `contract`, in ledger order.
    pub fn decode_for_game(
        &self,
        contract: Address,
        game_id: GameId,
        records: &[EventRecord],
    ) -> Result<Vec<GameEvent>> {
        let mut events = Vec::new();
        for record in records.iter().filter(|r| r.address == contract) {
            if let Some((id, event)) = self.decode(record)? {
                if id == game_id {
                    events.push(event);
                }
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn word(value: u64) -> Vec<u8> {
        let mut word = vec![0u8; 32];
        U256::from(value).to_big_endian(&mut word);
        word
    }

    pub fn created(topics: &EventTopics, contract: Address, id: GameId, creator: Address, stake: u64) -> EventRecord {
        EventRecord::new(
            contract,
            vec![topics.created, id_topic(id), address_topic(creator)],
            word(stake),
        )
    }

    pub fn joined(topics: &EventTopics, contract: Address, id: GameId, opponent: Address) -> EventRecord {
        EventRecord::new(
            contract,
            vec![topics.joined, id_topic(id), address_topic(opponent)],
            Vec::new(),
        )
    }

    pub fn played(topics: &EventTopics, contract: Address, id: GameId, player: Address, choice: Choice) -> EventRecord {
        EventRecord::new(
            contract,
            vec![topics.played, id_topic(id), address_topic(player)],
            word(choice.encode() as u64),
        )
    }

    pub fn resolved(topics: &EventTopics, contract: Address, id: GameId, winner: Address) -> EventRecord {
        EventRecord::new(
            contract,
            vec![topics.resolved, id_topic(id), address_topic(winner)],
            Vec::new(),
        )
    }
}
