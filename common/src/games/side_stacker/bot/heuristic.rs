use crate::games::side_stacker::win_detector::lines;
use crate::games::side_stacker::{Board, COLUMNS, Move, ROWS, Token};

const WIN_SCORE: i32 = 10_000;
const OPPONENT_WIN_PENALTY: i32 = 5_000;
const DOUBLE_THREAT_SETUP_PENALTY: i32 = 4_000;
const OPEN_PATTERN_PENALTY: i32 = 3_000;
const OWN_THREAT_BONUS: i32 = 100;
const OPPONENT_THREAT_PENALTY: i32 = 50;
const CENTER_DISTANCE_PENALTY: i32 = 5;

/// Medium tier: fixed priorities (win, block, then best score) with a short lookahead.
///
/// Every candidate is played out on a copy of the board; the live board is never touched.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicSelector;

impl HeuristicSelector {
    pub fn select_move(&self, board: &Board) -> Option<Move> {
        if board.is_game_over() {
            return None;
        }

        let moves = board.valid_moves();
        let me = board.current_player();
        let opponent = me.opponent();

        if let Some(&winning) = moves.iter().find(|&&mv| is_winning_move(board, mv, me)) {
            return Some(winning);
        }
        if let Some(&blocking) = moves.iter().find(|&&mv| is_winning_move(board, mv, opponent)) {
            return Some(blocking);
        }

        let mut best: Option<(Move, i32)> = None;
        for mv in moves {
            let score = self.evaluate_move(board, mv);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }
        best.map(|(mv, _)| mv)
    }

    /// Scores `mv` for the player to move. Higher is better.
    pub fn evaluate_move(&self, board: &Board, mv: Move) -> i32 {
        let me = board.current_player();
        let opponent = me.opponent();

        let mut after = *board;
        if after.make_move(mv.row, mv.side).is_err() {
            return i32::MIN;
        }
        if after.winner() == Some(me) {
            return WIN_SCORE;
        }

        let mut score = 0;

        score -= OPPONENT_WIN_PENALTY * count_winning_moves(&after, opponent) as i32;

        if can_set_up_double_threat(&after, opponent) {
            score -= DOUBLE_THREAT_SETUP_PENALTY;
        }

        score -= OPEN_PATTERN_PENALTY * open_row_patterns(&after, opponent);

        score += OWN_THREAT_BONUS * count_threats(&after, me);
        score -= OPPONENT_THREAT_PENALTY * count_threats(&after, opponent);

        score -= CENTER_DISTANCE_PENALTY * mv.row.abs_diff(ROWS / 2) as i32;

        score
    }
}

/// Would `player` win by playing `mv` right now, whoever is actually to move.
fn is_winning_move(board: &Board, mv: Move, player: Token) -> bool {
    let mut simulated = *board;
    simulated.set_current_player(player);
    let _ = simulated.make_move(mv.row, mv.side);
    simulated.winner() == Some(player)
}

fn count_winning_moves(board: &Board, player: Token) -> usize {
    board
        .valid_moves()
        .into_iter()
        .filter(|&mv| is_winning_move(board, mv, player))
        .count()
}

/// Can `player` make a move after which they have two or more winning replies.
fn can_set_up_double_threat(board: &Board, player: Token) -> bool {
    board.valid_moves().into_iter().any(|mv| {
        let mut next = *board;
        next.set_current_player(player);
        let _ = next.make_move(mv.row, mv.side);
        count_winning_moves(&next, player) >= 2
    })
}

/// Lines holding three of `player`'s tokens and one gap.
fn count_threats(board: &Board, player: Token) -> i32 {
    lines()
        .filter(|line| {
            let owned = line.iter().filter(|p| board.cell(p.row, p.column) == Some(player)).count();
            let empty = line.iter().filter(|p| board.cell(p.row, p.column).is_none()).count();
            owned == 3 && empty == 1
        })
        .count() as i32
}

/// Horizontal windows that grow into an unblockable double threat: two tokens with two
/// gaps count once, three tokens with a gap and open cells on both flanks count twice.
fn open_row_patterns(board: &Board, player: Token) -> i32 {
    let grid = board.grid();
    let mut patterns = 0;

    for row in grid.iter() {
        for start in 0..=COLUMNS - 4 {
            let window = &row[start..start + 4];
            let owned = window.iter().filter(|&&cell| cell == Some(player)).count();
            let empty = window.iter().filter(|cell| cell.is_none()).count();

            if owned == 2 && empty == 2 {
                patterns += 1;
            }

            if owned == 3 && empty == 1 {
                let open_left = start > 0 && row[start - 1].is_none();
                let open_right = start + 4 < COLUMNS && row[start + 4].is_none();
                if open_left && open_right {
                    patterns += 2;
                }
            }
        }
    }

    patterns
}
