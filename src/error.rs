use crate::battle::{Outcome, Side};
use thiserror::Error;
use uuid::Uuid;

pub type BattleId = Uuid;

#[derive(Debug, Error)]
pub enum BattleError {
    #[error("malformed combatant: {reason}")]
    MalformedCombatant { reason: String },

    #[error("no combatant named {name} in source")]
    UnknownCombatant { name: String },

    #[error("invalid data for {entry}: {reason}")]
    InvalidCatalog { entry: String, reason: String },

    #[error("battle {battle_id} not found")]
    BattleNotFound { battle_id: BattleId },

    #[error("battle {battle_id} already ended ({})", .outcome.label())]
    BattleEnded { battle_id: BattleId, outcome: Outcome },

    #[error("battle {battle_id}: {side} does not know move {move_name}")]
    IllegalMove {
        battle_id: BattleId,
        side: Side,
        move_name: String,
    },

    #[error("episode is over, call reset before stepping again")]
    EpisodeOver,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
