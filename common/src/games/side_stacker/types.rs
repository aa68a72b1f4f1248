use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROWS: usize = 7;
pub const COLUMNS: usize = 7;
pub const WIN_LENGTH: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Token {
    X,
    O,
}

impl Token {
    pub fn opponent(self) -> Token {
        match self {
            Token::X => Token::O,
            Token::O => Token::X,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::X => write!(f, "X"),
            Token::O => write!(f, "O"),
        }
    }
}

/// `None` is an empty cell.
pub type Cell = Option<Token>;

/// Edge of a row a piece is pushed in from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "LEFT"),
            Side::Right => write!(f, "RIGHT"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub side: Side,
}

impl Move {
    pub fn new(row: usize, side: Side) -> Self {
        Self { row, side }
    }

    pub fn left(row: usize) -> Self {
        Self::new(row, Side::Left)
    }

    pub fn right(row: usize) -> Self {
        Self::new(row, Side::Right)
    }
}

/// Most recently filled cell. Only used by clients to animate the insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestCell {
    pub row: usize,
    pub column: usize,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("game is already over")]
    GameOver,
    #[error("row {0} is out of range")]
    RowOutOfRange(usize),
    #[error("row {row} has no empty cell from the {side} side")]
    SideFull { row: usize, side: Side },
    #[error("it is {expected}'s turn, not {actual}'s")]
    NotYourTurn { expected: Token, actual: Token },
    #[error("room is not accepting moves")]
    NotAcceptingMoves,
}
