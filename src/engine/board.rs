use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BOARD_SIZE: usize = 8;

pub const DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }
}

impl From<Color> for Cell {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Color::Black),
            "white" => Ok(Color::White),
            other => Err(AppError::InvalidBoard(format!("unknown color '{other}'"))),
        }
    }
}

/// Zero-based board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

pub const CORNERS: [Position; 4] = [
    Position::new(0, 0),
    Position::new(0, 7),
    Position::new(7, 0),
    Position::new(7, 7),
];

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn is_corner(&self) -> bool {
        (self.row == 0 || self.row == 7) && (self.col == 0 || self.col == 7)
    }

    /// Border square that is not a corner.
    pub fn is_edge(&self) -> bool {
        !self.is_corner() && (self.row == 0 || self.row == 7 || self.col == 0 || self.col == 7)
    }

    pub fn is_x_square(&self) -> bool {
        matches!((self.row, self.col), (1 | 6, 1 | 6))
    }

    pub fn is_c_square(&self) -> bool {
        matches!(
            (self.row, self.col),
            (0 | 7, 1 | 6) | (1 | 6, 0 | 7)
        )
    }

    /// Corner this C or X square touches, if it is one.
    pub fn guarded_corner(&self) -> Option<Position> {
        if !(self.is_x_square() || self.is_c_square()) {
            return None;
        }
        let row = if self.row < 4 { 0 } else { 7 };
        let col = if self.col < 4 { 0 } else { 7 };
        Some(Position::new(row, col))
    }

    /// Step from this square, `None` when it leaves the board.
    pub fn offset(&self, dr: i32, dc: i32) -> Option<Position> {
        let row = self.row as i32 + dr;
        let col = self.col as i32 + dc;
        if (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col) {
            Some(Position::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// Column letter, for example `C` for column 2.
    pub fn col_letter(&self) -> char {
        (b'A' + self.col as u8) as char
    }

    /// Notation such as `F5`.
    pub fn notation(&self) -> String {
        format!("{}{}", self.col_letter(), self.row + 1)
    }

    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.col_letter(), self.row + 1)
    }
}

impl FromStr for Position {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(letter), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(AppError::InvalidBoard(format!("bad move notation '{s}'")));
        };
        let col = (letter.to_ascii_uppercase() as u32).wrapping_sub('A' as u32) as usize;
        let row = (digit as u32).wrapping_sub('1' as u32) as usize;
        if col >= BOARD_SIZE || row >= BOARD_SIZE {
            return Err(AppError::InvalidBoard(format!("move '{s}' is off the board")));
        }
        Ok(Position::new(row, col))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PieceCount {
    pub black: u32,
    pub white: u32,
    pub empty: u32,
}

impl PieceCount {
    pub fn of(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub fn discs(&self) -> u32 {
        self.black + self.white
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win(Color),
    Tie,
}

/// 8x8 Reversi board, serialised as rows of `"black" | "white" | "empty"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard opening position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.cells[3][3] = Cell::White;
        board.cells[3][4] = Cell::Black;
        board.cells[4][3] = Cell::Black;
        board.cells[4][4] = Cell::White;
        board
    }

    pub fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn from_cells(cells: [[Cell; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, AppError> {
        if rows.len() != BOARD_SIZE {
            return Err(AppError::InvalidBoard(format!(
                "expected {BOARD_SIZE} rows, got {}",
                rows.len()
            )));
        }
        let mut board = Self::empty();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != BOARD_SIZE {
                return Err(AppError::InvalidBoard(format!(
                    "row {} has {} cells, expected {BOARD_SIZE}",
                    r + 1,
                    row.len()
                )));
            }
            for (c, cell) in row.into_iter().enumerate() {
                board.cells[r][c] = cell;
            }
        }
        Ok(board)
    }

    pub fn cells(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, pos: Position) -> Cell {
        self.cells[pos.row][pos.col]
    }

    pub fn set(&mut self, pos: Position, cell: Cell) {
        self.cells[pos.row][pos.col] = cell;
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos) == Cell::Empty
    }

    fn run_length(&self, pos: Position, color: Color, dr: i32, dc: i32) -> usize {
        let own = Cell::from(color);
        let theirs = Cell::from(color.opponent());
        let mut run = 0;
        let mut cursor = pos.offset(dr, dc);
        while let Some(p) = cursor {
            match self.get(p) {
                c if c == theirs => run += 1,
                c if c == own => return run,
                _ => return 0,
            }
            cursor = p.offset(dr, dc);
        }
        0
    }

    pub fn is_valid_move(&self, pos: Position, color: Color) -> bool {
        if pos.row >= BOARD_SIZE || pos.col >= BOARD_SIZE || !self.is_empty_at(pos) {
            return false;
        }
        DIRECTIONS
            .iter()
            .any(|&(dr, dc)| self.run_length(pos, color, dr, dc) > 0)
    }

    /// Discs that would turn over if `color` played at `pos`.
    pub fn flips(&self, pos: Position, color: Color) -> Vec<Position> {
        if pos.row >= BOARD_SIZE || pos.col >= BOARD_SIZE || !self.is_empty_at(pos) {
            return Vec::new();
        }
        let mut flipped = Vec::new();
        for &(dr, dc) in &DIRECTIONS {
            let run = self.run_length(pos, color, dr, dc);
            let mut cursor = pos;
            for _ in 0..run {
                if let Some(next) = cursor.offset(dr, dc) {
                    flipped.push(next);
                    cursor = next;
                }
            }
        }
        flipped
    }

    /// Play `pos` for `color`. Returns `false` and leaves the board untouched when illegal.
    pub fn make_move(&mut self, pos: Position, color: Color) -> bool {
        let flipped = self.flips(pos, color);
        if flipped.is_empty() {
            return false;
        }
        let own = Cell::from(color);
        self.set(pos, own);
        for p in flipped {
            self.set(p, own);
        }
        true
    }

    /// Copy of the board after the move, `None` if illegal.
    pub fn apply(&self, pos: Position, color: Color) -> Option<Board> {
        let mut next = *self;
        next.make_move(pos, color).then_some(next)
    }

    pub fn valid_moves(&self, color: Color) -> Vec<Position> {
        Position::all()
            .filter(|&p| self.is_valid_move(p, color))
            .collect()
    }

    pub fn has_valid_move(&self, color: Color) -> bool {
        Position::all().any(|p| self.is_valid_move(p, color))
    }

    pub fn count(&self) -> PieceCount {
        let mut count = PieceCount::default();
        for cell in self.cells.iter().flatten() {
            match cell {
                Cell::Black => count.black += 1,
                Cell::White => count.white += 1,
                Cell::Empty => count.empty += 1,
            }
        }
        count
    }

    pub fn empty_count(&self) -> u32 {
        self.count().empty
    }

    pub fn is_game_over(&self) -> bool {
        self.empty_count() == 0
            || (!self.has_valid_move(Color::Black) && !self.has_valid_move(Color::White))
    }

    /// Result once the game is over.
    pub fn winner(&self) -> Option<Outcome> {
        if !self.is_game_over() {
            return None;
        }
        let count = self.count();
        Some(match count.black.cmp(&count.white) {
            std::cmp::Ordering::Greater => Outcome::Win(Color::Black),
            std::cmp::Ordering::Less => Outcome::Win(Color::White),
            std::cmp::Ordering::Equal => Outcome::Tie,
        })
    }

    /// Text rendering with an optional `*` marking a move.
    pub fn render(&self, highlight: Option<Position>) -> String {
        let mut out = String::from("  A B C D E F G H\n");
        for row in 0..BOARD_SIZE {
            out.push_str(&(row + 1).to_string());
            for col in 0..BOARD_SIZE {
                let pos = Position::new(row, col);
                let symbol = if highlight == Some(pos) {
                    '*'
                } else {
                    match self.get(pos) {
                        Cell::Black => '●',
                        Cell::White => '○',
                        Cell::Empty => '-',
                    }
                };
                out.push(' ');
                out.push(symbol);
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Square the opponent most likely just played, comparing two snapshots.
pub fn detect_opponent_move(prev: &Board, curr: &Board, our_color: Color) -> Option<Position> {
    let theirs = Cell::from(our_color.opponent());
    let placed: Vec<Position> = Position::all()
        .filter(|&p| prev.get(p) == Cell::Empty && curr.get(p) == theirs)
        .collect();

    match placed.as_slice() {
        [] => None,
        [only] => Some(*only),
        [first, ..] => {
            tracing::debug!(
                candidates = placed.len(),
                chosen = %first,
                "Several new opponent discs, taking the first"
            );
            Some(*first)
        }
    }
}
