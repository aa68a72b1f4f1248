use common::games::side_stacker::Position;

use crate::error::GameError;
use crate::room::{Player, Room, RoomStatus};
use crate::store::{MoveRecord, StoredRoom};

/// Walks a finished room back through its recorded moves, one step at a time.
///
/// The pacing lives with the caller; the engine only applies records in order and
/// reports the first one that no longer fits the board.
#[derive(Debug)]
pub struct ReplayEngine {
    history: Vec<MoveRecord>,
    next: usize,
}

impl ReplayEngine {
    /// `history` must already be in sequence order.
    pub fn new(history: Vec<MoveRecord>) -> Self {
        Self { history, next: 0 }
    }

    /// Resets the board of a finished room and puts it in replay mode.
    pub fn start(room: &mut Room) -> Result<(), GameError> {
        if room.begin_replay() {
            Ok(())
        } else {
            Err(GameError::NotFinished)
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.history.len()
    }

    pub fn remaining(&self) -> usize {
        self.history.len() - self.next
    }

    /// Applies the next record. `None` once the history is used up.
    pub fn step(&mut self, room: &mut Room) -> Option<Result<Position, GameError>> {
        let record = self.history.get(self.next)?;
        let sequence = self.next;
        self.next += 1;
        Some(
            room.replay_move(record.token, record.row, record.side)
                .map_err(|reason| GameError::ReplayDivergence { sequence, reason }),
        )
    }

    /// Checks that the history brought the game back to its end.
    pub fn finish(&self, room: &Room) -> Result<(), GameError> {
        if room.status() == RoomStatus::Finished {
            Ok(())
        } else {
            Err(GameError::IncompleteHistory)
        }
    }

    /// Unpaced replay of the whole history.
    pub fn apply_all(room: &mut Room, history: Vec<MoveRecord>) -> Result<(), GameError> {
        Self::start(room)?;
        let mut engine = Self::new(history);
        while let Some(result) = engine.step(room) {
            result?;
        }
        engine.finish(room)
    }
}

/// Reconstructs a live room from persisted metadata and moves.
pub fn rebuild_room(stored: &StoredRoom) -> Result<Room, GameError> {
    let record = &stored.room;
    let mut room = Room::new(record.room_id.clone(), record.room_type, record.difficulty);
    for seat in &record.seats {
        room.add_player(Player::new(
            record.room_id.clone(),
            seat.player_id.clone(),
            seat.token,
        ));
    }
    for (sequence, mv) in stored.moves.iter().enumerate() {
        room.handle_move(mv.token, mv.row, mv.side)
            .map_err(|reason| GameError::ReplayDivergence { sequence, reason })?;
    }
    Ok(room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomType;
    use crate::store::{RoomRecord, SeatRecord};
    use chrono::Utc;
    use common::games::side_stacker::{Difficulty, InvalidMove, Side, Token};
    use common::{PlayerId, RoomId};

    fn room() -> Room {
        let id = RoomId::new("r1");
        let mut room = Room::new(id.clone(), RoomType::HeadToHead, Difficulty::Easy);
        room.add_player(Player::new(id.clone(), PlayerId::new("a"), Token::X));
        room.add_player(Player::new(id, PlayerId::new("b"), Token::O));
        room
    }

    /// Plays `moves` live and returns the finished room with its history.
    fn play(moves: &[(usize, Side)]) -> (Room, Vec<MoveRecord>) {
        let mut room = room();
        let mut history = Vec::new();
        for (sequence, &(row, side)) in moves.iter().enumerate() {
            let mover = room.player_to_move().cloned().unwrap();
            let token = mover.token;
            room.handle_move(token, row, side).unwrap();
            history.push(MoveRecord {
                room_id: room.id().clone(),
                sequence,
                player_id: mover.id,
                token,
                row,
                side,
                played_at: Utc::now(),
            });
        }
        (room, history)
    }

    const DIAGONAL_GAME: [(usize, Side); 11] = [
        (0, Side::Left),
        (1, Side::Left),
        (1, Side::Left),
        (2, Side::Left),
        (2, Side::Left),
        (3, Side::Left),
        (2, Side::Left),
        (3, Side::Left),
        (3, Side::Left),
        (0, Side::Right),
        (3, Side::Left),
    ];

    #[test]
    fn reproduces_the_original_outcome() {
        let (mut room, history) = play(&DIAGONAL_GAME);
        assert_eq!(room.status(), RoomStatus::Finished);
        let original = *room.board();

        ReplayEngine::apply_all(&mut room, history).unwrap();

        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.board().grid(), original.grid());
        assert_eq!(room.board().winner(), original.winner());
        assert_eq!(room.board().winning_cells(), original.winning_cells());
    }

    #[test]
    fn refuses_unfinished_rooms() {
        let (mut room, history) = play(&DIAGONAL_GAME[..4]);
        assert!(matches!(
            ReplayEngine::apply_all(&mut room, history),
            Err(GameError::NotFinished)
        ));
        assert_eq!(room.status(), RoomStatus::Playing);
    }

    #[test]
    fn stops_at_a_diverging_record() {
        let (mut room, mut history) = play(&DIAGONAL_GAME);
        history[4].token = history[4].token.opponent();

        let err = ReplayEngine::apply_all(&mut room, history).unwrap_err();
        assert!(matches!(
            err,
            GameError::ReplayDivergence {
                sequence: 4,
                reason: InvalidMove::NotYourTurn { .. }
            }
        ));
        assert_eq!(room.status(), RoomStatus::Replaying);
        assert_eq!(room.board().filled_cells(), 4);
    }

    #[test]
    fn truncated_history_is_reported() {
        let (mut room, mut history) = play(&DIAGONAL_GAME);
        history.truncate(6);
        assert!(matches!(
            ReplayEngine::apply_all(&mut room, history),
            Err(GameError::IncompleteHistory)
        ));
    }

    #[test]
    fn steps_one_record_at_a_time() {
        let (mut room, history) = play(&DIAGONAL_GAME);
        ReplayEngine::start(&mut room).unwrap();
        let mut engine = ReplayEngine::new(history);
        assert_eq!(engine.remaining(), DIAGONAL_GAME.len());

        let first = engine.step(&mut room).unwrap().unwrap();
        assert_eq!(first.row, 0);
        assert_eq!(room.board().filled_cells(), 1);
        assert!(engine.finish(&room).is_err());

        while let Some(result) = engine.step(&mut room) {
            result.unwrap();
        }
        assert!(engine.is_exhausted());
        assert!(engine.finish(&room).is_ok());
    }

    #[test]
    fn rebuilds_a_room_from_the_store() {
        let (room, history) = play(&DIAGONAL_GAME[..5]);
        let stored = StoredRoom {
            room: RoomRecord {
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
            },
            board: Some(room.board().snapshot()),
            moves: history,
        };

        let rebuilt = rebuild_room(&stored).unwrap();
        assert_eq!(rebuilt.status(), RoomStatus::Playing);
        assert_eq!(rebuilt.board(), room.board());
        assert_eq!(rebuilt.players(), room.players());
    }
}
