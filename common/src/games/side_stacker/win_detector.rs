use super::types::{Cell, COLUMNS, Position, ROWS, Token, WIN_LENGTH};

/// Scan directions as (row step, column step), in scan priority order:
/// horizontal, vertical, diagonal down-right, diagonal down-left.
pub const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

pub type Line = [Position; WIN_LENGTH];

fn line_from(row: usize, column: usize, (dr, dc): (isize, isize)) -> Option<Line> {
    let last_row = row as isize + dr * (WIN_LENGTH as isize - 1);
    let last_column = column as isize + dc * (WIN_LENGTH as isize - 1);
    if last_row < 0
        || last_row >= ROWS as isize
        || last_column < 0
        || last_column >= COLUMNS as isize
    {
        return None;
    }

    let mut line = [Position::new(row, column); WIN_LENGTH];
    for (i, cell) in line.iter_mut().enumerate() {
        let i = i as isize;
        *cell = Position::new(
            (row as isize + dr * i) as usize,
            (column as isize + dc * i) as usize,
        );
    }
    Some(line)
}

/// Every in-bounds line of `WIN_LENGTH` cells, ordered row-major by start cell, then by direction.
pub fn lines() -> impl Iterator<Item = Line> {
    (0..ROWS).flat_map(|row| {
        (0..COLUMNS).flat_map(move |column| {
            DIRECTIONS
                .iter()
                .filter_map(move |&direction| line_from(row, column, direction))
        })
    })
}

/// First complete line in scan order. Only one line is reported even when several exist.
pub fn find_winning_line(grid: &[[Cell; COLUMNS]; ROWS]) -> Option<(Token, Line)> {
    for row in 0..ROWS {
        for column in 0..COLUMNS {
            let Some(token) = grid[row][column] else {
                continue;
            };

            for direction in DIRECTIONS {
                let Some(line) = line_from(row, column, direction) else {
                    continue;
                };
                if line.iter().all(|p| grid[p.row][p.column] == Some(token)) {
                    return Some((token, line));
                }
            }
        }
    }

    None
}
