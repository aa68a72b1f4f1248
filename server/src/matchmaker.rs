use common::games::side_stacker::{Difficulty, Token};
use common::{ClientId, PlayerId, RoomId};
use serde::{Deserialize, Serialize};

use crate::room::{Player, Room, RoomType};

/// Kind of game a client asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "PvP")]
    HeadToHead,
    #[serde(rename = "PvAI")]
    VersusComputer,
    #[serde(rename = "AIvAI")]
    Exhibition,
}

#[derive(Debug)]
pub enum MatchResult {
    /// The requester now holds the waiting slot.
    Waiting,
    Created(Room),
}

/// Pairs human players through a single waiting slot.
#[derive(Debug, Default)]
pub struct Matchmaker {
    waiting: Option<ClientId>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waiting(&self) -> Option<&ClientId> {
        self.waiting.as_ref()
    }

    /// Computer modes always create a room; head-to-head either pairs the requester with
    /// the waiting client or makes the requester wait.
    pub fn request_game(
        &mut self,
        requester: &ClientId,
        mode: GameMode,
        difficulty: Difficulty,
        room_id: RoomId,
    ) -> MatchResult {
        match mode {
            GameMode::HeadToHead => match self.waiting.take() {
                Some(waiting) if &waiting != requester => {
                    MatchResult::Created(head_to_head_room(room_id, &waiting, requester))
                }
                _ => {
                    self.waiting = Some(requester.clone());
                    MatchResult::Waiting
                }
            },
            GameMode::VersusComputer => {
                MatchResult::Created(versus_computer_room(room_id, requester, difficulty))
            }
            GameMode::Exhibition => MatchResult::Created(exhibition_room(room_id, difficulty)),
        }
    }

    /// Clears the slot only if `client` is the one holding it.
    pub fn leave(&mut self, client: &ClientId) -> bool {
        if self.waiting.as_ref() == Some(client) {
            self.waiting = None;
            return true;
        }
        false
    }
}

fn seated_room(
    room_id: RoomId,
    room_type: RoomType,
    difficulty: Difficulty,
    x: PlayerId,
    o: PlayerId,
) -> Room {
    let mut room = Room::new(room_id.clone(), room_type, difficulty);
    room.add_player(Player::new(room_id.clone(), x, Token::X));
    room.add_player(Player::new(room_id, o, Token::O));
    room
}

fn head_to_head_room(room_id: RoomId, first: &ClientId, second: &ClientId) -> Room {
    seated_room(
        room_id,
        RoomType::HeadToHead,
        Difficulty::default(),
        first.to_player_id(),
        second.to_player_id(),
    )
}

fn versus_computer_room(room_id: RoomId, human: &ClientId, difficulty: Difficulty) -> Room {
    seated_room(
        room_id,
        RoomType::VersusComputer,
        difficulty,
        human.to_player_id(),
        PlayerId::computer_agent(),
    )
}

fn exhibition_room(room_id: RoomId, difficulty: Difficulty) -> Room {
    seated_room(
        room_id,
        RoomType::Exhibition,
        difficulty,
        PlayerId::numbered_computer_agent(1),
        PlayerId::numbered_computer_agent(2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomStatus;

    fn request(mm: &mut Matchmaker, client: &str, mode: GameMode) -> MatchResult {
        mm.request_game(&ClientId::new(client), mode, Difficulty::Medium, RoomId::new("r"))
    }

    #[test]
    fn pairs_first_two_requesters_in_order() {
        let mut mm = Matchmaker::new();
        assert!(matches!(request(&mut mm, "a", GameMode::HeadToHead), MatchResult::Waiting));
        assert_eq!(mm.waiting(), Some(&ClientId::new("a")));

        let MatchResult::Created(room) = request(&mut mm, "b", GameMode::HeadToHead) else {
            panic!("expected a room");
        };
        assert_eq!(room.status(), RoomStatus::Playing);
        assert_eq!(room.room_type(), RoomType::HeadToHead);
        assert_eq!(room.token_of(&PlayerId::new("a")), Some(Token::X));
        assert_eq!(room.token_of(&PlayerId::new("b")), Some(Token::O));
        assert_eq!(mm.waiting(), None);
    }

    #[test]
    fn same_requester_keeps_waiting() {
        let mut mm = Matchmaker::new();
        request(&mut mm, "a", GameMode::HeadToHead);
        assert!(matches!(request(&mut mm, "a", GameMode::HeadToHead), MatchResult::Waiting));
        assert_eq!(mm.waiting(), Some(&ClientId::new("a")));
    }

    #[test]
    fn only_the_waiting_client_can_clear_the_slot() {
        let mut mm = Matchmaker::new();
        request(&mut mm, "a", GameMode::HeadToHead);
        assert!(!mm.leave(&ClientId::new("b")));
        assert_eq!(mm.waiting(), Some(&ClientId::new("a")));
        assert!(mm.leave(&ClientId::new("a")));
        assert_eq!(mm.waiting(), None);
    }

    #[test]
    fn computer_modes_never_queue() {
        let mut mm = Matchmaker::new();
        request(&mut mm, "a", GameMode::HeadToHead);

        let MatchResult::Created(room) = request(&mut mm, "b", GameMode::VersusComputer) else {
            panic!("expected a room");
        };
        assert_eq!(room.difficulty(), Difficulty::Medium);
        assert_eq!(room.token_of(&PlayerId::new("b")), Some(Token::X));
        assert_eq!(room.token_of(&PlayerId::computer_agent()), Some(Token::O));
        assert_eq!(mm.waiting(), Some(&ClientId::new("a")));

        let MatchResult::Created(room) = request(&mut mm, "c", GameMode::Exhibition) else {
            panic!("expected a room");
        };
        assert!(room.players().iter().all(Player::is_computer_agent));
        assert!(room.is_computer_turn());
    }
}
