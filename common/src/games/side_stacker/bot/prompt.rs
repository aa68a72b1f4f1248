use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::games::side_stacker::{Board, COLUMNS, Move, ROWS, Token};

/// Tried in order; the first match wins. Numbers are 1-based move indices.
static MOVE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)Move:\s*(\d+)").expect("valid regex"),
        Regex::new(r"^(\d+)\s*[-:]").expect("valid regex"),
        Regex::new(r"^(\d+)").expect("valid regex"),
    ]
});

/// Grid with a column header and row labels, `.` for empty cells.
pub fn render_board(board: &Board) -> String {
    let mut out = String::from("   ");
    for column in 0..COLUMNS {
        let _ = write!(out, "{column} ");
    }
    out.push_str(" (columns)\n");

    for (row, cells) in board.grid().iter().enumerate() {
        let _ = write!(out, "{row}: ");
        for cell in cells {
            match cell {
                Some(token) => {
                    let _ = write!(out, "{token} ");
                }
                None => out.push_str(". "),
            }
        }
        let _ = writeln!(out, "(row {row})");
    }
    out
}

/// Legal moves enumerated from 1, as the reply is expected to reference them.
pub fn render_moves(moves: &[Move]) -> String {
    moves
        .iter()
        .enumerate()
        .map(|(i, mv)| format!("{}. Row {}, Side {}", i + 1, mv.row, mv.side))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_prompt(board: &Board, moves: &[Move]) -> String {
    let me: Token = board.current_player();
    format!(
        "You are playing a strategic game called Side Stacker (similar to Connect 4).

GAME RULES:
- {ROWS}x{COLUMNS} grid where pieces slide in from the LEFT or RIGHT side of each row
- A piece played from the LEFT stops at the first free cell from the left edge
- A piece played from the RIGHT stops at the first free cell from the right edge
- Goal: get 4 in a row (horizontal, vertical, or diagonal)
- You are player: {me}
- Opponent is player: {opponent}

Current board:
{board}
VALID MOVES:
{moves}

STRATEGIC PRIORITIES:
1. Win immediately if possible
2. Create multiple winning threats for yourself
3. Block the opponent from winning immediately
4. Prevent unblockable double threats (3 in a row with open cells on both sides)
5. Build from the middle out across several rows

Respond with ONLY the move number (1-{count}) and a brief explanation.
Format: \"Move: N - [brief reason]\"

Your response:",
        opponent = me.opponent(),
        board = render_board(board),
        moves = render_moves(moves),
        count = moves.len(),
    )
}

/// Extracts the 1-based move number from a free-form reply.
pub fn parse_move_index(response: &str) -> Option<usize> {
    let text = response.trim();
    MOVE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::side_stacker::Side;

    #[test]
    fn parses_labelled_reply() {
        assert_eq!(parse_move_index("I will block. Move: 5"), Some(5));
        assert_eq!(parse_move_index("move:12 because"), Some(12));
    }

    #[test]
    fn parses_leading_number_forms() {
        assert_eq!(parse_move_index("3 - Row 1 from LEFT"), Some(3));
        assert_eq!(parse_move_index("4: Row 2 from RIGHT"), Some(4));
        assert_eq!(parse_move_index("  7\n"), Some(7));
    }

    #[test]
    fn labelled_form_takes_precedence() {
        assert_eq!(parse_move_index("2 options considered. Move: 9"), Some(9));
    }

    #[test]
    fn unparseable_reply() {
        assert_eq!(parse_move_index("I choose the left side of row three"), None);
        assert_eq!(parse_move_index(""), None);
    }

    #[test]
    fn prompt_lists_moves_one_based() {
        let mut board = Board::new();
        board.make_move(0, Side::Left).unwrap();
        let moves = board.valid_moves();
        let prompt = render_prompt(&board, &moves);
        assert!(prompt.contains("You are player: O"));
        assert!(prompt.contains("1. Row 0, Side LEFT"));
        assert!(prompt.contains("2. Row 0, Side RIGHT"));
        assert!(prompt.contains("(1-14)"));
    }

    #[test]
    fn board_has_header_and_row_labels() {
        let mut board = Board::new();
        board.make_move(0, Side::Left).unwrap();
        board.make_move(0, Side::Right).unwrap();
        let text = render_board(&board);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "   0 1 2 3 4 5 6  (columns)");
        assert_eq!(lines[1], "0: X . . . . . O (row 0)");
        assert_eq!(lines.len(), 1 + ROWS);
    }
}
