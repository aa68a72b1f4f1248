use common::games::side_stacker::{
    Board, BoardSnapshot, Difficulty, InvalidMove, Position, Side, Token,
};
use common::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};

pub const MAX_PLAYERS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "PvP")]
    HeadToHead,
    #[serde(rename = "PvAI")]
    VersusComputer,
    #[serde(rename = "AIvAI")]
    Exhibition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Replaying,
    Finished,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub room_id: RoomId,
    pub id: PlayerId,
    pub token: Token,
}

impl Player {
    pub fn new(room_id: RoomId, id: PlayerId, token: Token) -> Self {
        Self { room_id, id, token }
    }

    pub fn is_computer_agent(&self) -> bool {
        self.id.is_computer_agent()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub token: Token,
}

/// Read-only projection of a room for observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub room_id: RoomId,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub status: RoomStatus,
    pub players: Vec<PlayerSummary>,
    pub board: BoardSnapshot,
    pub difficulty: Difficulty,
}

/// One game: up to two players, a board, and the lifecycle around it.
#[derive(Clone, Debug)]
pub struct Room {
    id: RoomId,
    room_type: RoomType,
    difficulty: Difficulty,
    status: RoomStatus,
    players: Vec<Player>,
    board: Board,
}

impl Room {
    pub fn new(id: RoomId, room_type: RoomType, difficulty: Difficulty) -> Self {
        Self {
            id,
            room_type,
            difficulty,
            status: RoomStatus::Waiting,
            players: Vec::with_capacity(MAX_PLAYERS),
            board: Board::new(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Seats `player`; the room starts playing once both seats are taken.
    pub fn add_player(&mut self, player: Player) -> bool {
        if self.is_full() || self.players.iter().any(|p| p.token == player.token) {
            return false;
        }
        self.players.push(player);
        if self.players.len() == MAX_PLAYERS && self.status == RoomStatus::Waiting {
            self.status = RoomStatus::Playing;
        }
        true
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn token_of(&self, id: &PlayerId) -> Option<Token> {
        self.player(id).map(|p| p.token)
    }

    /// First of X, O that nobody holds yet.
    pub fn next_free_token(&self) -> Option<Token> {
        [Token::X, Token::O]
            .into_iter()
            .find(|token| self.players.iter().all(|p| p.token != *token))
    }

    pub fn player_to_move(&self) -> Option<&Player> {
        let token = self.board.current_player();
        self.players.iter().find(|p| p.token == token)
    }

    /// A live game whose next move belongs to a computer agent.
    pub fn is_computer_turn(&self) -> bool {
        self.status == RoomStatus::Playing
            && self.player_to_move().is_some_and(Player::is_computer_agent)
    }

    pub fn handle_move(
        &mut self,
        token: Token,
        row: usize,
        side: Side,
    ) -> Result<Position, InvalidMove> {
        if self.status != RoomStatus::Playing {
            return Err(InvalidMove::NotAcceptingMoves);
        }
        self.apply_move(token, row, side)
    }

    /// Clears the board of a finished game and hands it to the replay driver.
    pub fn begin_replay(&mut self) -> bool {
        if self.status != RoomStatus::Finished {
            return false;
        }
        self.board.reset();
        self.status = RoomStatus::Replaying;
        true
    }

    /// Same as [`Room::handle_move`] but only while replaying.
    pub fn replay_move(
        &mut self,
        token: Token,
        row: usize,
        side: Side,
    ) -> Result<Position, InvalidMove> {
        if self.status != RoomStatus::Replaying {
            return Err(InvalidMove::NotAcceptingMoves);
        }
        self.apply_move(token, row, side)
    }

    fn apply_move(
        &mut self,
        token: Token,
        row: usize,
        side: Side,
    ) -> Result<Position, InvalidMove> {
        let expected = self.board.current_player();
        if token != expected {
            return Err(InvalidMove::NotYourTurn {
                expected,
                actual: token,
            });
        }
        let position = self.board.make_move(row, side)?;
        if self.board.is_game_over() {
            self.status = RoomStatus::Finished;
        }
        Ok(position)
    }

    pub fn game_state(&self) -> GameState {
        GameState {
            room_id: self.id.clone(),
            room_type: self.room_type,
            status: self.status,
            players: self
                .players
                .iter()
                .map(|p| PlayerSummary {
                    id: p.id.clone(),
                    token: p.token,
                })
                .collect(),
            board: self.board.snapshot(),
            difficulty: self.difficulty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with_players(room_type: RoomType, x: PlayerId, o: PlayerId) -> Room {
        let id = RoomId::new("room-1");
        let mut room = Room::new(id.clone(), room_type, Difficulty::Easy);
        assert!(room.add_player(Player::new(id.clone(), x, Token::X)));
        assert!(room.add_player(Player::new(id, o, Token::O)));
        room
    }

    fn head_to_head() -> Room {
        room_with_players(RoomType::HeadToHead, PlayerId::new("a"), PlayerId::new("b"))
    }

    #[test]
    fn starts_playing_once_two_players_join() {
        let id = RoomId::new("room-1");
        let mut room = Room::new(id.clone(), RoomType::HeadToHead, Difficulty::Easy);
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert!(room.add_player(Player::new(id.clone(), PlayerId::new("a"), Token::X)));
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert_eq!(room.next_free_token(), Some(Token::O));
        assert!(room.add_player(Player::new(id.clone(), PlayerId::new("b"), Token::O)));
        assert_eq!(room.status(), RoomStatus::Playing);
        assert!(!room.add_player(Player::new(id, PlayerId::new("c"), Token::X)));
        assert_eq!(room.players().len(), 2);
        assert_eq!(room.next_free_token(), None);
    }

    #[test]
    fn rejects_moves_out_of_turn_without_mutation() {
        let mut room = head_to_head();
        let before = *room.board();
        assert_eq!(
            room.handle_move(Token::O, 0, Side::Left),
            Err(InvalidMove::NotYourTurn {
                expected: Token::X,
                actual: Token::O
            })
        );
        assert_eq!(*room.board(), before);
    }

    #[test]
    fn rejects_moves_before_the_game_starts() {
        let id = RoomId::new("room-1");
        let mut room = Room::new(id.clone(), RoomType::HeadToHead, Difficulty::Easy);
        room.add_player(Player::new(id, PlayerId::new("a"), Token::X));
        assert_eq!(
            room.handle_move(Token::X, 0, Side::Left),
            Err(InvalidMove::NotAcceptingMoves)
        );
    }

    #[test]
    fn winning_move_finishes_the_room() {
        let mut room = head_to_head();
        for _ in 0..3 {
            room.handle_move(Token::X, 1, Side::Left).unwrap();
            room.handle_move(Token::O, 2, Side::Left).unwrap();
        }
        room.handle_move(Token::X, 1, Side::Left).unwrap();
        assert_eq!(room.status(), RoomStatus::Finished);
        assert!(room.board().is_game_over());
        assert_eq!(
            room.handle_move(Token::O, 3, Side::Left),
            Err(InvalidMove::NotAcceptingMoves)
        );
    }

    #[test]
    fn replay_requires_a_finished_game() {
        let mut room = head_to_head();
        assert!(!room.begin_replay());
        assert_eq!(
            room.replay_move(Token::X, 0, Side::Left),
            Err(InvalidMove::NotAcceptingMoves)
        );

        for _ in 0..3 {
            room.handle_move(Token::X, 1, Side::Left).unwrap();
            room.handle_move(Token::O, 2, Side::Left).unwrap();
        }
        room.handle_move(Token::X, 1, Side::Left).unwrap();

        assert!(room.begin_replay());
        assert_eq!(room.status(), RoomStatus::Replaying);
        assert_eq!(room.board().filled_cells(), 0);
        assert_eq!(
            room.handle_move(Token::X, 0, Side::Left),
            Err(InvalidMove::NotAcceptingMoves)
        );
        room.replay_move(Token::X, 0, Side::Left).unwrap();
        assert_eq!(room.board().filled_cells(), 1);
    }

    #[test]
    fn computer_turn_follows_the_board() {
        let mut room = room_with_players(
            RoomType::VersusComputer,
            PlayerId::new("human"),
            PlayerId::computer_agent(),
        );
        assert!(!room.is_computer_turn());
        room.handle_move(Token::X, 3, Side::Left).unwrap();
        assert!(room.is_computer_turn());
        assert_eq!(room.player_to_move().unwrap().id, PlayerId::computer_agent());
    }

    #[test]
    fn game_state_is_an_independent_copy() {
        let mut room = head_to_head();
        let state = room.game_state();
        room.handle_move(Token::X, 0, Side::Left).unwrap();
        assert!(state.board.grid.iter().flatten().all(Option::is_none));
        assert_eq!(room.game_state().board.grid[0][0], Some(Token::X));
    }

    #[test]
    fn game_state_wire_shape() {
        let room = head_to_head();
        let json = serde_json::to_value(room.game_state()).unwrap();
        assert_eq!(json["roomId"], "room-1");
        assert_eq!(json["type"], "PvP");
        assert_eq!(json["status"], "playing");
        assert_eq!(json["difficulty"], "easy");
        assert_eq!(json["players"][1]["id"], "b");
        assert_eq!(json["players"][1]["token"], "O");
        assert_eq!(json["board"]["currentPlayer"], "X");
    }
}
