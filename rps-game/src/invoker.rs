use crate::contract::{CREATE_GAME, HANDLE_TIMEOUT, JOIN_GAME, PLAY};
use crate::game::{GameEvent, GameId};
use crate::{Choice, GameError, Result};
use rps_core::{Address, OperationRequest, Token, TxHash, WalletAdapter, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A user action against the game contract, already parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Create { stake: U256 },
    Join { game_id: GameId, stake: U256 },
    Play { game_id: GameId, choice: Choice },
    HandleTimeout { game_id: GameId },
}

impl Intent {
    pub fn game_id(&self) -> Option<GameId> {
        match self {
            Intent::Create { .. } => None,
            Intent::Join { game_id, .. }
            | Intent::Play { game_id, .. }
            | Intent::HandleTimeout { game_id } => Some(*game_id),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Intent::Create { .. } => "create",
            Intent::Join { .. } => "join",
            Intent::Play { .. } => "play",
            Intent::HandleTimeout { .. } => "handle-timeout",
        }
    }

    /// Tracker event implied by this intent's confirmed inclusion, signed by
    /// `account`.
    pub fn confirmed_event(&self, account: Address) -> GameEvent {
        match self {
            Intent::Create { stake } => GameEvent::Created {
                creator: account,
                stake: *stake,
            },
            Intent::Join { .. } => GameEvent::Joined { opponent: account },
            Intent::Play { choice, .. } => GameEvent::Played {
                player: account,
                choice: *choice,
            },
            Intent::HandleTimeout { .. } => GameEvent::TimedOut,
        }
    }
}

/// Checks intents locally, encodes them and hands them to the wallet.
pub struct ContractInvoker {
    wallet: Arc<dyn WalletAdapter>,
    contract: Address,
}

impl ContractInvoker {
    pub fn new(wallet: Arc<dyn WalletAdapter>, contract: Address) -> Self {
        Self { wallet, contract }
    }

    pub fn account(&self) -> Address {
        self.wallet.account()
    }

    /// Validate `intent` and build its request. Nothing touches the network.
    pub fn request(&self, intent: &Intent) -> Result<OperationRequest> {
        let request = match intent {
            Intent::Create { stake } => {
                require_stake(*stake)?;
                OperationRequest::new(self.contract, CREATE_GAME, Vec::new()).with_stake(*stake)
            }
            Intent::Join { game_id, stake } => {
                require_stake(*stake)?;
                OperationRequest::new(self.contract, JOIN_GAME, vec![id_token(*game_id)])
                    .with_stake(*stake)
            }
            Intent::Play { game_id, choice } => {
                if !choice.is_move() {
                    return Err(GameError::validation("a move must be chosen"));
                }
                OperationRequest::new(
                    self.contract,
                    PLAY,
                    vec![id_token(*game_id), Token::Uint(U256::from(choice.encode()))],
                )
            }
            Intent::HandleTimeout { game_id } => {
                OperationRequest::new(self.contract, HANDLE_TIMEOUT, vec![id_token(*game_id)])
            }
        };
        Ok(request)
    }

    pub async fn submit(&self, intent: &Intent) -> Result<TxHash> {
        let request = self.request(intent)?;
        let tx_hash = self.wallet.submit(&request).await?;
        tracing::info!("{} submitted as {:#x}", intent.name(), tx_hash);
        Ok(tx_hash)
    }
}

fn require_stake(stake: U256) -> Result<()> {
    if stake.is_zero() {
        return Err(GameError::validation("stake must be greater than zero"));
    }
    Ok(())
}

fn id_token(game_id: GameId) -> Token {
    Token::Uint(U256::from(game_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_core::testing::{ScriptedLedger, ScriptedWallet};
    use rps_core::{to_ledger_units, CoreError};

    fn setup() -> (Arc<ScriptedWallet>, ContractInvoker) {
        let wallet = Arc::new(ScriptedWallet::new(
            Address::repeat_byte(0x01),
            ScriptedLedger::new(),
        ));
        let invoker = ContractInvoker::new(wallet.clone(), Address::repeat_byte(0xaa));
        (wallet, invoker)
    }

    #[tokio::test]
    async fn test_create_attaches_exact_stake() {
        let (wallet, invoker) = setup();
        let stake = to_ledger_units("0.01").unwrap();

        invoker.submit(&Intent::Create { stake }).await.unwrap();

        let submitted = wallet.submissions();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].operation(), "createGame");
        assert_eq!(
            submitted[0].attached_stake(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert!(submitted[0].arguments().is_empty());
    }

    #[tokio::test]
    async fn test_zero_stake_join_never_submits() {
        let (wallet, invoker) = setup();

        let err = invoker
            .submit(&Intent::Join {
                game_id: 4,
                stake: U256::zero(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GameError::Validation(_)));
        assert!(wallet.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_play_requires_a_move() {
        let (wallet, invoker) = setup();

        let err = invoker
            .submit(&Intent::Play {
                game_id: 4,
                choice: Choice::None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GameError::Validation(_)));
        assert!(wallet.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_encodes_arguments() {
        let (_, invoker) = setup();

        let play = invoker
            .request(&Intent::Play {
                game_id: 9,
                choice: Choice::Scissors,
            })
            .unwrap();
        assert_eq!(play.signature(), "play(uint256,uint8)");
        assert_eq!(
            play.arguments(),
            &[Token::Uint(U256::from(9)), Token::Uint(U256::from(3))]
        );
        assert!(play.attached_stake().is_zero());

        let timeout = invoker.request(&Intent::HandleTimeout { game_id: 9 }).unwrap();
        assert_eq!(timeout.operation(), "handleTimeout");
        assert_eq!(timeout.arguments(), &[Token::Uint(U256::from(9))]);
    }

    #[tokio::test]
    async fn test_wallet_rejection_passes_through() {
        let (wallet, invoker) = setup();
        wallet.fail_next(CoreError::wallet_rejection("user denied"));

        let err = invoker
            .submit(&Intent::Create {
                stake: U256::from(1),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GameError::Core(CoreError::WalletRejection(_))));
    }
}
