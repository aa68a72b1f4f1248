use std::sync::{Mutex, PoisonError};

use crate::games::side_stacker::{Board, Move};
use crate::session_rng::SessionRng;

/// Easy tier: a uniformly random legal move.
pub struct RandomSelector {
    rng: Mutex<SessionRng>,
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RandomSelector {
    /// `Some(seed)` makes the choices reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SessionRng::new(seed),
            None => SessionRng::from_random(),
        };
        Self { rng: Mutex::new(rng) }
    }

    pub fn select_move(&self, board: &Board) -> Option<Move> {
        if board.is_game_over() {
            return None;
        }
        self.choose(&board.valid_moves())
    }

    pub fn choose(&self, moves: &[Move]) -> Option<Move> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.choose(moves).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::side_stacker::Side;

    #[test]
    fn always_picks_a_legal_move() {
        let selector = RandomSelector::new(Some(7));
        let mut board = Board::new();
        while !board.is_game_over() {
            let mv = selector.select_move(&board).unwrap();
            assert!(board.valid_moves().contains(&mv));
            board.make_move(mv.row, mv.side).unwrap();
        }
        assert_eq!(selector.select_move(&board), None);
    }

    #[test]
    fn same_seed_same_choices() {
        let a = RandomSelector::new(Some(42));
        let b = RandomSelector::new(Some(42));
        let board = Board::new();
        for _ in 0..10 {
            assert_eq!(a.select_move(&board), b.select_move(&board));
        }
    }

    #[test]
    fn empty_move_list_yields_nothing() {
        let selector = RandomSelector::default();
        assert_eq!(selector.choose(&[]), None);
        assert_eq!(selector.choose(&[Move::new(3, Side::Right)]), Some(Move::right(3)));
    }
}
