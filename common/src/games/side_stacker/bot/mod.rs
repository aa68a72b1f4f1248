mod advisory;
mod heuristic;
mod prompt;
mod random;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use advisory::{AdvisoryClient, AdvisoryError, AdvisorySelector, UnavailableAdvisory};
pub use heuristic::HeuristicSelector;
pub use prompt::{parse_move_index, render_board, render_prompt};
pub use random::RandomSelector;

use super::{Board, Move};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

/// One way of choosing a move for the player to move.
///
/// Whatever the strategy, the result is either `None` (terminal board) or one of
/// `board.valid_moves()`.
pub enum MoveSelector {
    Random(RandomSelector),
    Heuristic(HeuristicSelector),
    Advisory(AdvisorySelector),
}

impl MoveSelector {
    pub async fn select_move(&self, board: &Board) -> Option<Move> {
        if board.is_game_over() {
            return None;
        }
        match self {
            MoveSelector::Random(selector) => selector.select_move(board),
            MoveSelector::Heuristic(selector) => {
                let selector = *selector;
                let board = *board;
                tokio::task::spawn_blocking(move || selector.select_move(&board))
                    .await
                    .unwrap_or_else(|err| {
                        warn!(error = %err, "heuristic move search aborted");
                        None
                    })
            }
            MoveSelector::Advisory(selector) => selector.select_move(board).await,
        }
    }
}

/// The selector used for each difficulty tier.
pub struct MoveSelectors {
    easy: MoveSelector,
    medium: MoveSelector,
    hard: MoveSelector,
}

impl MoveSelectors {
    pub fn new(advisory: Arc<dyn AdvisoryClient>, advisory_timeout: Duration) -> Self {
        Self {
            easy: MoveSelector::Random(RandomSelector::default()),
            medium: MoveSelector::Heuristic(HeuristicSelector),
            hard: MoveSelector::Advisory(AdvisorySelector::new(advisory, advisory_timeout)),
        }
    }

    /// Selectors with fixed seeds; the hard tier never reaches a service.
    pub fn seeded(seed: u64) -> Self {
        Self {
            easy: MoveSelector::Random(RandomSelector::new(Some(seed))),
            medium: MoveSelector::Heuristic(HeuristicSelector),
            hard: MoveSelector::Advisory(AdvisorySelector::with_fallback(
                Arc::new(UnavailableAdvisory),
                Duration::from_secs(1),
                RandomSelector::new(Some(seed.wrapping_add(1))),
            )),
        }
    }

    pub fn for_difficulty(&self, difficulty: Difficulty) -> &MoveSelector {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::side_stacker::Side;

    #[test]
    fn difficulty_wire_names() {
        assert_eq!(serde_json::to_string(&Difficulty::Medium).unwrap(), "\"medium\"");
        let parsed: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed, Difficulty::Hard);
        assert_eq!(Difficulty::default(), Difficulty::Easy);
    }

    #[tokio::test]
    async fn every_tier_returns_a_legal_move() {
        let selectors = MoveSelectors::seeded(3);
        let mut board = Board::new();
        board.make_move(3, Side::Left).unwrap();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let mv = selectors
                .for_difficulty(difficulty)
                .select_move(&board)
                .await
                .unwrap();
            assert!(board.valid_moves().contains(&mv), "{difficulty}");
        }
    }

    #[tokio::test]
    async fn terminal_board_yields_none_for_every_tier() {
        let selectors = MoveSelectors::seeded(3);
        let mut board = Board::new();
        for _ in 0..3 {
            board.make_move(5, Side::Right).unwrap();
            board.make_move(6, Side::Right).unwrap();
        }
        board.make_move(5, Side::Right).unwrap();
        assert!(board.is_game_over());
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(selectors.for_difficulty(difficulty).select_move(&board).await, None);
        }
    }

    #[tokio::test]
    async fn medium_completes_the_line() {
        let selectors = MoveSelectors::seeded(3);
        let mut board = Board::new();
        for _ in 0..3 {
            board.make_move(2, Side::Left).unwrap();
            board.make_move(4, Side::Right).unwrap();
        }
        let mv = selectors
            .for_difficulty(Difficulty::Medium)
            .select_move(&board)
            .await;
        assert_eq!(mv, Some(Move::left(2)));
    }
}
