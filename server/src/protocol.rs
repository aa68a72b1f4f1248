use common::RoomId;
use common::games::side_stacker::{Difficulty, Side, Token};
use serde::{Deserialize, Serialize};

use crate::matchmaker::GameMode;
use crate::room::GameState;

/// Frames sent by clients: `{"event": "...", "data": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    RequestGame {
        mode: GameMode,
        #[serde(default)]
        difficulty: Option<Difficulty>,
    },
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    MakeMove {
        room_id: RoomId,
        row: usize,
        side: Side,
    },
    LeaveWaiting,
    ReplayGame {
        room_id: RoomId,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// `token` is the recipient's own token, `None` for spectators.
    GameStart {
        state: GameState,
        token: Option<Token>,
    },
    WaitingForOpponent,
    GameUpdate(GameState),
    GameError {
        message: String,
    },
}
