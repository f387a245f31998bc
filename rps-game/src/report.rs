use crate::error::{ErrorKind, GameError};
use crate::game::{Game, GameId};
use rps_core::TxHash;
use serde::Serialize;

/// Uniform outcome of a flow: `{ok: true, ...data}` or
/// `{ok: false, error_kind, message}`.
#[derive(Debug, Clone, Serialize)]
pub struct FlowReport<T> {
    pub ok: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Transaction a failure refers to; present on `timed_out_waiting` and
    /// `unsynced` so the operation can be resumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl<T> FlowReport<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error_kind: None,
            message: None,
            tx_hash: None,
        }
    }

    pub fn failure(err: &GameError) -> Self {
        Self {
            ok: false,
            data: None,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
            tx_hash: err.tx_hash(),
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

impl<T> From<crate::Result<T>> for FlowReport<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => {
                tracing::warn!("Flow failed ({:?}): {}", err.kind(), err);
                Self::failure(&err)
            }
        }
    }
}

/// Payload of a confirmed lifecycle flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedFlow {
    pub game_id: GameId,
    pub tx_hash: TxHash,
    /// Snapshot taken after the confirmed events were applied.
    pub game: Game,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_core::{Address, CoreError, U256};
    use std::time::Duration;

    #[test]
    fn test_success_flattens_data() {
        let report = FlowReport::success(ConfirmedFlow {
            game_id: 7,
            tx_hash: TxHash::repeat_byte(0x01),
            game: Game::created(7, Address::repeat_byte(0x02), U256::from(10)),
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["game_id"], 7);
        assert!(json.get("error_kind").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_failure_carries_kind_and_hash() {
        let tx_hash = TxHash::repeat_byte(0x0c);
        let err = GameError::from(CoreError::TimedOutWaiting {
            tx_hash,
            waited: Duration::from_secs(5),
        });
        let report: FlowReport<ConfirmedFlow> = Err(err).into();

        assert!(!report.ok);
        assert!(report.data().is_none());
        assert_eq!(report.error_kind, Some(ErrorKind::TimedOutWaiting));
        assert_eq!(report.tx_hash, Some(tx_hash));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error_kind"], "timed_out_waiting");
        assert!(json.get("game_id").is_none());
    }
}
