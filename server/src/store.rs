use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::games::side_stacker::{BoardSnapshot, Difficulty, Side, Token};
use common::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::room::{Room, RoomStatus, RoomType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatRecord {
    pub player_id: PlayerId,
    pub token: Token,
}

/// Room metadata as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub room_id: RoomId,
    pub room_type: RoomType,
    pub status: RoomStatus,
    pub difficulty: Difficulty,
    pub seats: Vec<SeatRecord>,
    pub created_at: DateTime<Utc>,
}

impl RoomRecord {
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_id: room.id().clone(),
            room_type: room.room_type(),
            status: room.status(),
            difficulty: room.difficulty(),
            seats: room
                .players()
                .iter()
                .map(|p| SeatRecord {
                    player_id: p.id.clone(),
                    token: p.token,
                })
                .collect(),
            created_at: Utc::now(),
        }
    }
}

/// One applied move. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub room_id: RoomId,
    pub sequence: usize,
    pub player_id: PlayerId,
    pub token: Token,
    pub row: usize,
    pub side: Side,
    pub played_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct StoredRoom {
    pub room: RoomRecord,
    pub board: Option<BoardSnapshot>,
    pub moves: Vec<MoveRecord>,
}

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn save_room(&self, record: RoomRecord) -> Result<(), StoreError>;
    async fn update_status(&self, room_id: &RoomId, status: RoomStatus) -> Result<(), StoreError>;
    async fn append_move(&self, record: MoveRecord) -> Result<(), StoreError>;
    async fn save_board(&self, room_id: &RoomId, board: BoardSnapshot) -> Result<(), StoreError>;
    async fn load_room(&self, room_id: &RoomId) -> Result<Option<StoredRoom>, StoreError>;
    /// Moves of a room in sequence order.
    async fn move_history(&self, room_id: &RoomId) -> Result<Vec<MoveRecord>, StoreError>;
}

/// Process-local store; nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rooms: Arc<Mutex<HashMap<RoomId, StoredRoom>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn save_room(&self, record: RoomRecord) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        match rooms.get_mut(&record.room_id) {
            Some(stored) => {
                let created_at = stored.room.created_at;
                stored.room = RoomRecord { created_at, ..record };
            }
            None => {
                rooms.insert(
                    record.room_id.clone(),
                    StoredRoom {
                        room: record,
                        board: None,
                        moves: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn update_status(&self, room_id: &RoomId, status: RoomStatus) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        let stored = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::MissingRoom(room_id.clone()))?;
        stored.room.status = status;
        Ok(())
    }

    async fn append_move(&self, record: MoveRecord) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        let stored = rooms
            .get_mut(&record.room_id)
            .ok_or_else(|| StoreError::MissingRoom(record.room_id.clone()))?;
        stored.moves.push(record);
        Ok(())
    }

    async fn save_board(&self, room_id: &RoomId, board: BoardSnapshot) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        let stored = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::MissingRoom(room_id.clone()))?;
        stored.board = Some(board);
        Ok(())
    }

    async fn load_room(&self, room_id: &RoomId) -> Result<Option<StoredRoom>, StoreError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(room_id).map(|stored| {
            let mut stored = stored.clone();
            stored.moves.sort_by_key(|m| m.sequence);
            stored
        }))
    }

    async fn move_history(&self, room_id: &RoomId) -> Result<Vec<MoveRecord>, StoreError> {
        let rooms = self.rooms.lock().await;
        let stored = rooms
            .get(room_id)
            .ok_or_else(|| StoreError::MissingRoom(room_id.clone()))?;
        let mut moves = stored.moves.clone();
        moves.sort_by_key(|m| m.sequence);
        Ok(moves)
    }
}
