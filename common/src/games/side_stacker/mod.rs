mod board;
pub mod bot;
mod types;
pub mod win_detector;

pub use board::{Board, BoardSnapshot};
pub use bot::{Difficulty, MoveSelector, MoveSelectors};
pub use types::{
    COLUMNS, Cell, InvalidMove, LatestCell, Move, Position, ROWS, Side, Token, WIN_LENGTH,
};
