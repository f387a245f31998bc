//! Ledger reads that need no signing identity.

use crate::contract::{counter_view, decode_counter, id_topic, EventTopics};
use crate::game::{GameEvent, GameId};
use crate::Result;
use rps_core::{Address, EventQuery, LedgerQuery, U256};

/// Every confirmed event of `game_id` at or after `from_block`, oldest first.
pub async fn fetch_game_events(
    ledger: &dyn LedgerQuery,
    contract: Address,
    topics: &EventTopics,
    game_id: GameId,
    from_block: u64,
) -> Result<Vec<GameEvent>> {
    let query = EventQuery::new(contract)
        .signatures(topics.all())
        .topic1(id_topic(game_id))
        .from_block(from_block);
    let records = ledger.events(&query).await?;
    tracing::debug!("Fetched {} records for game {}", records.len(), game_id);
    topics.decode_for_game(contract, game_id, &records)
}

/// The contract's monotonic game counter. Informational only: it says nothing
/// about which id a particular creation received.
pub async fn read_game_counter(ledger: &dyn LedgerQuery, contract: Address) -> Result<U256> {
    let output = ledger.read(&counter_view(contract)).await?;
    decode_counter(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::fixtures::*;
    use rps_core::config::DEFAULT_GAME_CREATED_TOPIC;
    use rps_core::testing::ScriptedLedger;

    #[tokio::test]
    async fn test_fetch_only_the_requested_game() {
        let ledger = ScriptedLedger::new();
        let topics = EventTopics::new(DEFAULT_GAME_CREATED_TOPIC);
        let contract = Address::repeat_byte(0xaa);
        let creator = Address::repeat_byte(0x01);

        ledger.record_history(vec![
            created(&topics, contract, 1, creator, 10),
            created(&topics, contract, 2, creator, 10),
        ]);
        ledger.record_history(vec![joined(&topics, contract, 1, Address::repeat_byte(0x02))]);

        let events = fetch_game_events(&*ledger, contract, &topics, 1, 0)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name(), "Joined");
    }

    #[tokio::test]
    async fn test_fetch_starts_at_deployment_block() {
        let ledger = ScriptedLedger::new();
        let topics = EventTopics::new(DEFAULT_GAME_CREATED_TOPIC);
        let contract = Address::repeat_byte(0xaa);
        let creator = Address::repeat_byte(0x01);

        // an earlier deployment reused the id at block 1
        ledger.record_history(vec![created(&topics, contract, 1, creator, 10)]);
        ledger.record_history(vec![created(&topics, contract, 1, creator, 20)]);

        let events = fetch_game_events(&*ledger, contract, &topics, 1, 2)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            GameEvent::Created {
                creator,
                stake: U256::from(20)
            }
        );
    }

    #[tokio::test]
    async fn test_counter_read() {
        let ledger = ScriptedLedger::new();
        ledger.set_counter(41);

        let counter = read_game_counter(&*ledger, Address::repeat_byte(0xaa))
            .await
            .unwrap();
        assert_eq!(counter, U256::from(41));
        assert_eq!(ledger.reads(), 1);
    }
}
