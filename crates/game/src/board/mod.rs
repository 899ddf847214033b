use crate::PlayerIndex;

pub const ROW_COUNT: usize = 6;
pub const COLUMN_COUNT: usize = 7;
pub const WIN_LENGTH: usize = 4;

/// Row-major wire form of the board. Row 0 is the bottom row.
pub type BoardGrid = [[u8; COLUMN_COUNT]; ROW_COUNT];

/// Four `(row, column)` coordinates examined together by win detection.
pub type Window = [(usize, usize); WIN_LENGTH];

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    PlayerA,
    PlayerB,
}

impl Cell {
    pub fn for_player(player: PlayerIndex) -> Self {
        if player == 0 {
            Cell::PlayerA
        } else {
            Cell::PlayerB
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::PlayerA => 1,
            Cell::PlayerB => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Cell::Empty),
            1 => Some(Cell::PlayerA),
            2 => Some(Cell::PlayerB),
            _ => None,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// Gravity grid. Pieces only ever get added during a match, so a cell that
/// leaves `Empty` stays filled until the board is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Cell; COLUMN_COUNT]; ROW_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn is_column_open(&self, col: usize) -> bool {
        col < COLUMN_COUNT && self.cells[ROW_COUNT - 1][col].is_empty()
    }

    pub fn next_open_row(&self, col: usize) -> Option<usize> {
        if col >= COLUMN_COUNT {
            return None;
        }
        (0..ROW_COUNT).find(|&row| self.cells[row][col].is_empty())
    }

    /// Writes `cell` at `(row, col)` without any checks; the session is
    /// expected to have called `is_column_open` and `next_open_row` first.
    pub fn drop_piece(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[row][col] = cell;
    }

    /// Whole-board scan: true if any window belongs entirely to `cell`.
    pub fn check_win(&self, cell: Cell) -> bool {
        if cell.is_empty() {
            return false;
        }
        self.windows()
            .any(|window| window.iter().all(|&(r, c)| self.cells[r][c] == cell))
    }

    pub fn is_full(&self) -> bool {
        (0..COLUMN_COUNT).all(|col| !self.is_column_open(col))
    }

    pub fn piece_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// Every run of `WIN_LENGTH` in-bounds cells along the four line directions.
    pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
        DIRECTIONS.iter().flat_map(|&(dr, dc)| {
            (0..ROW_COUNT).flat_map(move |row| {
                (0..COLUMN_COUNT).filter_map(move |col| window_from(row, col, dr, dc))
            })
        })
    }

    pub fn grid(&self) -> BoardGrid {
        let mut grid = [[0u8; COLUMN_COUNT]; ROW_COUNT];
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                grid[row][col] = cell.as_u8();
            }
        }
        grid
    }
}

fn window_from(row: usize, col: usize, dr: isize, dc: isize) -> Option<Window> {
    let mut window = [(0, 0); WIN_LENGTH];
    for (step, slot) in window.iter_mut().enumerate() {
        let r = row as isize + dr * step as isize;
        let c = col as isize + dc * step as isize;
        if r < 0 || c < 0 || r >= ROW_COUNT as isize || c >= COLUMN_COUNT as isize {
            return None;
        }
        *slot = (r as usize, c as usize);
    }
    Some(window)
}
