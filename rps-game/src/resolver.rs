use crate::contract::topic_to_id;
use crate::game::GameId;
use crate::{GameError, Result};
use rps_core::{Address, Receipt, H256};

/// Derives a new game's id from the creation receipt it was confirmed in.
///
/// The id always comes from the receipt's own "game created" event. The
/// contract's shared counter is never consulted: other participants'
/// creations can be confirmed in between and make any counter read stale.
#[derive(Debug, Clone, Copy)]
pub struct GameIdResolver {
    contract: Address,
    created_topic: H256,
}

impl GameIdResolver {
    pub fn new(contract: Address, created_topic: H256) -> Self {
        Self {
            contract,
            created_topic,
        }
    }

    pub fn resolve(&self, receipt: &Receipt) -> Result<GameId> {
        let mut matches = receipt
            .events
            .iter()
            .filter(|e| e.address == self.contract && e.signature() == Some(self.created_topic));

        let Some(event) = matches.next() else {
            return Err(GameError::event_not_found(format!(
                "receipt {:#x} carries no game created event",
                receipt.tx_hash
            )));
        };
        if matches.next().is_some() {
            return Err(GameError::event_not_found(format!(
                "receipt {:#x} carries more than one game created event",
                receipt.tx_hash
            )));
        }

        let topic = event.topics.get(1).copied().ok_or_else(|| {
            GameError::event_not_found("game created event has no indexed game id")
        })?;
        let id = topic_to_id(topic).ok_or_else(|| {
            GameError::event_not_found(format!("game id {:?} is out of range", topic))
        })?;

        tracing::debug!("Resolved game id {} from {:#x}", id, receipt.tx_hash);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{address_topic, id_topic};
    use rps_core::config::DEFAULT_GAME_CREATED_TOPIC;
    use rps_core::{EventRecord, TxHash};

    fn contract() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn resolver() -> GameIdResolver {
        GameIdResolver::new(contract(), DEFAULT_GAME_CREATED_TOPIC)
    }

    fn receipt(events: Vec<EventRecord>) -> Receipt {
        Receipt {
            tx_hash: TxHash::repeat_byte(0x0f),
            from: Address::repeat_byte(0x01),
            block_number: Some(1),
            success: true,
            events,
        }
    }

    fn creation(address: Address, id: GameId) -> EventRecord {
        EventRecord::new(
            address,
            vec![
                DEFAULT_GAME_CREATED_TOPIC,
                id_topic(id),
                address_topic(Address::repeat_byte(0x01)),
            ],
            vec![0u8; 32],
        )
    }

    #[test]
    fn test_second_event_is_creation() {
        let other = EventRecord::new(contract(), vec![H256::repeat_byte(0x44)], Vec::new());
        let id = resolver()
            .resolve(&receipt(vec![other, creation(contract(), 7)]))
            .unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn test_independent_of_other_receipts() {
        // two creations confirmed in reverse submission order
        let later = receipt(vec![creation(contract(), 11)]);
        let earlier = receipt(vec![creation(contract(), 12)]);
        assert_eq!(resolver().resolve(&earlier).unwrap(), 12);
        assert_eq!(resolver().resolve(&later).unwrap(), 11);
    }

    #[test]
    fn test_ignores_same_topic_from_other_contracts() {
        let foreign = creation(Address::repeat_byte(0xbb), 99);
        let id = resolver()
            .resolve(&receipt(vec![foreign, creation(contract(), 3)]))
            .unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn test_missing_or_ambiguous_event() {
        assert!(matches!(
            resolver().resolve(&receipt(Vec::new())),
            Err(GameError::EventNotFound(_))
        ));
        assert!(matches!(
            resolver().resolve(&receipt(vec![creation(contract(), 1), creation(contract(), 2)])),
            Err(GameError::EventNotFound(_))
        ));

        let no_id = EventRecord::new(contract(), vec![DEFAULT_GAME_CREATED_TOPIC], Vec::new());
        assert!(matches!(
            resolver().resolve(&receipt(vec![no_id])),
            Err(GameError::EventNotFound(_))
        ));
    }
}
