use serde::{Deserialize, Serialize};

use super::types::{
    COLUMNS, Cell, InvalidMove, LatestCell, Move, Position, ROWS, Side, Token, WIN_LENGTH,
};
use super::win_detector::find_winning_line;

/// The 7x7 side-stacker grid and its win/draw state.
///
/// `Board` is a plain value: cloning it yields a fully independent copy, which is
/// what move simulation relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    grid: [[Cell; COLUMNS]; ROWS],
    current_player: Token,
    winner: Option<Token>,
    game_over: bool,
    winning_cells: Option<[Position; WIN_LENGTH]>,
    latest_cell: Option<LatestCell>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            grid: [[None; COLUMNS]; ROWS],
            current_player: Token::X,
            winner: None,
            game_over: false,
            winning_cells: None,
            latest_cell: None,
        }
    }

    /// Builds a board from an arbitrary position and evaluates its outcome.
    pub fn from_grid(grid: [[Cell; COLUMNS]; ROWS], current_player: Token) -> Self {
        let mut board = Self {
            grid,
            current_player,
            ..Self::new()
        };
        if let Some((token, line)) = find_winning_line(&board.grid) {
            board.winner = Some(token);
            board.winning_cells = Some(line);
            board.game_over = true;
        } else if board.check_draw() {
            board.game_over = true;
        }
        board
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn grid(&self) -> &[[Cell; COLUMNS]; ROWS] {
        &self.grid
    }

    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.grid[row][column]
    }

    pub fn current_player(&self) -> Token {
        self.current_player
    }

    pub fn winner(&self) -> Option<Token> {
        self.winner
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winning_cells(&self) -> &[Position] {
        match &self.winning_cells {
            Some(cells) => cells,
            None => &[],
        }
    }

    pub fn latest_cell(&self) -> Option<LatestCell> {
        self.latest_cell
    }

    /// Hands the turn to `token` without placing anything. Used by simulations that
    /// ask "what if this player moved here".
    pub(crate) fn set_current_player(&mut self, token: Token) {
        self.current_player = token;
    }

    /// Pushes the current player's token into `row` from `side`.
    ///
    /// On failure nothing is mutated. On success the turn passes to the opponent
    /// unless the move ended the game.
    pub fn make_move(&mut self, row: usize, side: Side) -> Result<Position, InvalidMove> {
        if self.game_over {
            return Err(InvalidMove::GameOver);
        }
        if row >= ROWS {
            return Err(InvalidMove::RowOutOfRange(row));
        }

        let column = self
            .first_empty_from(row, side)
            .ok_or(InvalidMove::SideFull { row, side })?;

        self.grid[row][column] = Some(self.current_player);
        self.latest_cell = Some(LatestCell { row, column, side });

        if self.check_win() {
            self.winner = Some(self.current_player);
            self.game_over = true;
        } else if self.check_draw() {
            self.game_over = true;
        } else {
            self.current_player = self.current_player.opponent();
        }

        Ok(Position::new(row, column))
    }

    fn first_empty_from(&self, row: usize, side: Side) -> Option<usize> {
        let cells = &self.grid[row];
        match side {
            Side::Left => (0..COLUMNS).find(|&c| cells[c].is_none()),
            Side::Right => (0..COLUMNS).rev().find(|&c| cells[c].is_none()),
        }
    }

    /// Both sides of every row with an empty cell, ascending by row, left before right.
    /// Recomputed on every call.
    pub fn valid_moves(&self) -> Vec<Move> {
        self.grid
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(Option::is_none))
            .flat_map(|(row, _)| [Move::left(row), Move::right(row)])
            .collect()
    }

    /// Records the first 4-in-a-line found in scan order as the winning cells.
    pub fn check_win(&mut self) -> bool {
        match find_winning_line(&self.grid) {
            Some((_, line)) => {
                self.winning_cells = Some(line);
                true
            }
            None => false,
        }
    }

    pub fn check_draw(&self) -> bool {
        self.winner.is_none() && self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.grid.iter().all(|row| row.iter().all(Option::is_some))
    }

    pub fn filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            grid: self.grid.iter().map(|row| row.to_vec()).collect(),
            current_player: self.current_player,
            winner: self.winner,
            game_over: self.game_over,
            moves: self.valid_moves(),
            winning_cells: self.winning_cells().to_vec(),
            latest_cell: self.latest_cell,
        }
    }
}

/// Serializable, owned copy of a board for observers and persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub grid: Vec<Vec<Cell>>,
    pub current_player: Token,
    pub winner: Option<Token>,
    pub game_over: bool,
    pub moves: Vec<Move>,
    pub winning_cells: Vec<Position>,
    pub latest_cell: Option<LatestCell>,
}
