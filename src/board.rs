// src/board.rs
use std::error::Error;
use std::fmt;

use crate::piece::{Color, Piece, PieceKind};

/// Board dimension along either axis.
pub const SIZE: i32 = 8;

// --- Errors ---

#[derive(Debug, PartialEq, Eq)]
pub enum BoardError {
    /// Coordinate outside [0,7] on either axis.
    OutOfBounds(i32, i32),
    /// No king of the requested color is on the board.
    NoKing(Color),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::OutOfBounds(x, y) => write!(f, "Index out of bounds: ({}, {})", x, y),
            BoardError::NoKing(color) => write!(f, "No {:?} king found", color),
        }
    }
}

impl Error for BoardError {}

// --- Square ---

/// One of 64 board cells. The piece slot is either empty or holds exactly one
/// live piece; the board owns every square.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Square {
    pub x: i32,
    pub y: i32,
    pub piece: Option<Piece>,
}

impl Square {
    fn new(x: i32, y: i32, piece: Option<Piece>) -> Self {
        Square { x, y, piece }
    }

    /// Glyph of the occupant, if any. Serialization renders `None` as "".
    pub fn glyph(&self) -> Option<char> {
        self.piece.map(|p| p.glyph())
    }
}

// --- Board ---

/*                    BLACK
 *        A   B   C   D   E   F   G   H
 *
 *  8   | R | N | B | Q | K | B | N | R |  y=7
 *  7   | P | P | P | P | P | P | P | P |  y=6
 *  ...
 *  2   | P | P | P | P | P | P | P | P |  y=1
 *  1   | R | N | B | Q | K | B | N | R |  y=0
 *
 *       x=0  1   2   3   4   5   6   7
 *                    WHITE
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Square; 8]; 8], // indexed [x][y]
    dead_pieces: Vec<Piece>,   // insertion order == capture order
}

impl Board {
    /// Creates a board with the standard starting position.
    pub fn new() -> Self {
        let mut board = Board {
            squares: [[Square::new(0, 0, None); 8]; 8],
            dead_pieces: Vec::new(),
        };
        for x in 0..SIZE {
            for y in 0..SIZE {
                board.squares[x as usize][y as usize] = Square::new(x, y, None);
            }
        }
        board.initialize();
        board
    }

    fn initialize(&mut self) {
        for x in 0..SIZE {
            for y in 0..SIZE {
                self.squares[x as usize][y as usize].piece = None;
            }
        }
        self.place_back_rank(Color::White);
        self.place_back_rank(Color::Black);
        for x in 0..SIZE {
            self.squares[x as usize][1].piece = Some(Piece::new(PieceKind::Pawn, Color::White));
            self.squares[x as usize][6].piece = Some(Piece::new(PieceKind::Pawn, Color::Black));
        }
    }

    fn place_back_rank(&mut self, color: Color) {
        let y = color.back_rank() as usize;
        let order = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (x, &kind) in order.iter().enumerate() {
            self.squares[x][y].piece = Some(Piece::new(kind, color));
        }
    }

    /// Restores the starting position and clears the dead-piece ledger.
    pub fn reset(&mut self) {
        self.dead_pieces.clear();
        self.initialize();
    }

    /// Empties all 64 squares and the dead-piece ledger.
    pub fn clear_board(&mut self) {
        for x in 0..SIZE {
            for y in 0..SIZE {
                self.squares[x as usize][y as usize].piece = None;
            }
        }
        self.dead_pieces.clear();
    }

    // --- Square access ---

    /// Borrow the square at (x, y); callers read occupancy through it.
    pub fn square(&self, x: i32, y: i32) -> Result<&Square, BoardError> {
        if !Self::in_bounds(x, y) {
            return Err(BoardError::OutOfBounds(x, y));
        }
        Ok(&self.squares[x as usize][y as usize])
    }

    /// Mutable counterpart of [`square`](Self::square).
    pub fn square_mut(&mut self, x: i32, y: i32) -> Result<&mut Square, BoardError> {
        if !Self::in_bounds(x, y) {
            return Err(BoardError::OutOfBounds(x, y));
        }
        Ok(&mut self.squares[x as usize][y as usize])
    }

    fn in_bounds(x: i32, y: i32) -> bool {
        (0..SIZE).contains(&x) && (0..SIZE).contains(&y)
    }

    /// Copy of the occupant at an in-range coordinate; `None` when empty.
    /// Internal helper: callers pass coordinates already known to be valid.
    pub(crate) fn occupant(&self, pos: (i32, i32)) -> Option<Piece> {
        if !Self::in_bounds(pos.0, pos.1) {
            return None;
        }
        self.squares[pos.0 as usize][pos.1 as usize].piece
    }

    fn set(&mut self, pos: (i32, i32), piece: Option<Piece>) {
        self.squares[pos.0 as usize][pos.1 as usize].piece = piece;
    }

    // --- Dead-piece ledger ---

    pub fn dead_pieces(&self) -> &[Piece] {
        &self.dead_pieces
    }

    pub(crate) fn bury(&mut self, piece: Piece) {
        self.dead_pieces.push(piece);
    }

    // --- King location ---

    /// Scans for the king of `color`, file-major.
    pub fn king_square(&self, color: Color) -> Result<(i32, i32), BoardError> {
        for x in 0..SIZE {
            for y in 0..SIZE {
                if let Some(piece) = self.squares[x as usize][y as usize].piece {
                    if piece.kind == PieceKind::King && piece.color == color {
                        return Ok((x, y));
                    }
                }
            }
        }
        Err(BoardError::NoKing(color))
    }

    // --- Reachability queries ---

    /// Every square the occupant of (x, y) can legally move to, in board-scan
    /// order (file-major, rank-minor). Empty when the square is empty.
    pub fn accessible_squares(&mut self, x: i32, y: i32) -> Result<Vec<(i32, i32)>, BoardError> {
        let origin = self.square(x, y)?;
        let piece = match origin.piece {
            Some(piece) => piece,
            None => return Ok(Vec::new()),
        };

        let mut accessible = Vec::new();
        for i in 0..SIZE {
            for j in 0..SIZE {
                if (i, j) != (x, y) && piece.can_move(self, (x, y), (i, j)) {
                    accessible.push((i, j));
                }
            }
        }
        Ok(accessible)
    }

    /// True iff any piece of the color opposing `color` currently attacks
    /// `square`. Independent of whose king (if anyone) occupies the square,
    /// so it doubles as the transit-square test during castling.
    pub fn is_checked(&self, color: Color, square: (i32, i32)) -> bool {
        for x in 0..SIZE {
            for y in 0..SIZE {
                if let Some(piece) = self.squares[x as usize][y as usize].piece {
                    if piece.color != color && piece.can_attack(self, (x, y), square) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// True iff `color`'s king is checked and no move by any friendly piece
    /// removes the check. Every pseudo-legal candidate is simulated in place
    /// and reverted, so the scan is at most 64 x 64 simulations.
    pub fn is_checkmate(&mut self, color: Color) -> bool {
        let king_square = match self.king_square(color) {
            Ok(square) => square,
            Err(_) => return false,
        };
        if !self.is_checked(color, king_square) {
            return false;
        }

        for x in 0..SIZE {
            for y in 0..SIZE {
                let piece = match self.occupant((x, y)) {
                    Some(piece) if piece.color == color => piece,
                    _ => continue,
                };
                for i in 0..SIZE {
                    for j in 0..SIZE {
                        if piece.can_reach(self, (x, y), (i, j))
                            && !self.move_creates_check((x, y), (i, j))
                        {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    // --- Path clearance ---

    /// For sliding pieces: true iff every square strictly between origin and
    /// dest along their shared line is unoccupied. False for pairs that are
    /// neither collinear nor diagonal.
    pub fn is_free_path(&self, origin: (i32, i32), dest: (i32, i32)) -> bool {
        let dx = dest.0 - origin.0;
        let dy = dest.1 - origin.1;
        if !(dx == 0 || dy == 0 || dx.abs() == dy.abs()) {
            return false;
        }

        let step = (dx.signum(), dy.signum());
        let mut pos = (origin.0 + step.0, origin.1 + step.1);
        while pos != dest {
            if self.occupant(pos).is_some() {
                return false;
            }
            pos = (pos.0 + step.0, pos.1 + step.1);
        }
        true
    }

    /// True iff every square between the king and its rook is both empty and
    /// not attacked by the opponent.
    pub fn is_free_castle_path(&self, origin: (i32, i32), dest: (i32, i32)) -> bool {
        let color = match self.occupant(origin) {
            Some(piece) => piece.color,
            None => return false,
        };
        let direction = if origin.0 < dest.0 { 1 } else { -1 };
        let mut x = origin.0 + direction;
        while x != dest.0 {
            let transit = (x, origin.1);
            if self.occupant(transit).is_some() || self.is_checked(color, transit) {
                return false;
            }
            x += direction;
        }
        true
    }

    // --- Self-check simulation ---

    /// Simulates relocating the origin piece to `dest` and reports whether
    /// the moving side's own king is then in check. The relocation is an
    /// in-place swap that is reverted before returning, never a board clone:
    /// the checkmate scan calls this up to 64 x 64 times per turn.
    pub fn move_creates_check(&mut self, origin: (i32, i32), dest: (i32, i32)) -> bool {
        let mover = match self.occupant(origin) {
            Some(piece) => piece,
            None => return false,
        };
        let displaced = self.occupant(dest);

        self.set(origin, None);
        self.set(dest, Some(mover));

        let checked = match self.king_square(mover.color) {
            Ok(king_square) => self.is_checked(mover.color, king_square),
            Err(_) => false,
        };

        self.set(dest, displaced);
        self.set(origin, Some(mover));
        checked
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for y in (0..SIZE).rev() {
            write!(f, "{} | ", y + 1)?;
            for x in 0..SIZE {
                match self.squares[x as usize][y as usize].piece {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        write!(f, "    a b c d e f g h")
    }
}
