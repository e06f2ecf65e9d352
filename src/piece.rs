// src/piece.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Board;

// --- Color ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank direction pawns of this color advance in.
    pub fn forward(&self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The rank on which this color's pieces start (pawns one rank further in).
    pub fn back_rank(&self) -> i32 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// The opponent's back rank, i.e. the promotion rank for this color's pawns.
    pub fn promotion_rank(&self) -> i32 {
        self.opponent().back_rank()
    }
}

// --- Piece kinds and the piece itself ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// A chess piece: a closed tagged union over the six variants, plus color and
/// the two lifecycle flags. `has_moved` only ever goes false -> true.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub has_moved: bool,
    pub captured: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color, has_moved: false, captured: false }
    }

    /// Material value credited to the capturer's score.
    pub fn value(&self) -> u32 {
        match self.kind {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 3,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 100,
        }
    }

    /// Unicode glyph for rendering and serialization.
    pub fn glyph(&self) -> char {
        match (self.kind, self.color) {
            (PieceKind::King, Color::White) => '\u{2654}',
            (PieceKind::Queen, Color::White) => '\u{2655}',
            (PieceKind::Rook, Color::White) => '\u{2656}',
            (PieceKind::Bishop, Color::White) => '\u{2657}',
            (PieceKind::Knight, Color::White) => '\u{2658}',
            (PieceKind::Pawn, Color::White) => '\u{2659}',
            (PieceKind::King, Color::Black) => '\u{265A}',
            (PieceKind::Queen, Color::Black) => '\u{265B}',
            (PieceKind::Rook, Color::Black) => '\u{265C}',
            (PieceKind::Bishop, Color::Black) => '\u{265D}',
            (PieceKind::Knight, Color::Black) => '\u{265E}',
            (PieceKind::Pawn, Color::Black) => '\u{265F}',
        }
    }

    // --- Attack predicate ---

    /// True if this piece, standing on `origin`, threatens `dest` on the
    /// current board. Shape and path clearance only: no self-check filtering,
    /// so check scanning terminates. A pawn threatens its forward diagonals
    /// even when they are empty, which is why check detection calls this
    /// predicate and not `can_move`.
    pub fn can_attack(&self, board: &Board, origin: (i32, i32), dest: (i32, i32)) -> bool {
        let dx = dest.0 - origin.0;
        let dy = dest.1 - origin.1;
        if dx == 0 && dy == 0 {
            return false;
        }

        match self.kind {
            PieceKind::Pawn => dx.abs() == 1 && dy == self.color.forward(),
            PieceKind::Knight => dx.abs() * dy.abs() == 2,
            PieceKind::Bishop => dx.abs() == dy.abs() && board.is_free_path(origin, dest),
            PieceKind::Rook => {
                ((dx == 0) ^ (dy == 0)) && board.is_free_path(origin, dest)
            }
            PieceKind::Queen => {
                (dx.abs() == dy.abs() || dx == 0 || dy == 0) && board.is_free_path(origin, dest)
            }
            PieceKind::King => dx.abs() <= 1 && dy.abs() <= 1,
        }
    }

    // --- Movement predicates ---

    /// Pseudo-legal reachability: shape, path clearance and capture rules,
    /// but no self-check filtering and no castling. Checkmate scanning pairs
    /// this with `Board::move_creates_check` to simulate each candidate.
    pub fn can_reach(&self, board: &Board, origin: (i32, i32), dest: (i32, i32)) -> bool {
        match self.kind {
            PieceKind::Pawn => {
                let dx = dest.0 - origin.0;
                let dy = dest.1 - origin.1;
                let dir = self.color.forward();
                if dx == 0 && board.occupant(dest).is_none() {
                    // Forward push: one step always, two only from the start.
                    return dy == dir
                        || (dy == 2 * dir && !self.has_moved && board.is_free_path(origin, dest));
                }
                // Diagonal step is a capture shape: requires an enemy occupant.
                self.can_attack(board, origin, dest)
                    && board.occupant(dest).map_or(false, |p| p.color != self.color)
            }
            _ => {
                self.can_attack(board, origin, dest)
                    && board.occupant(dest).map_or(true, |p| p.color != self.color)
            }
        }
    }

    /// Full move legality for this piece from `origin` to `dest`.
    ///
    /// Non-king moves are pseudo-legal reachability plus the self-check
    /// filter. The king instead tests its destination square directly with
    /// `is_checked`, and additionally accepts the castling encoding: the
    /// destination holds this side's unmoved rook and the transit path is
    /// neither occupied nor attacked.
    pub fn can_move(&self, board: &mut Board, origin: (i32, i32), dest: (i32, i32)) -> bool {
        match self.kind {
            PieceKind::King => {
                if let Some(target) = board.occupant(dest) {
                    if target.color == self.color {
                        // Own rook as destination encodes a castle attempt.
                        return target.kind == PieceKind::Rook
                            && self.can_castle(&target)
                            && board.is_free_castle_path(origin, dest);
                    }
                }
                let dx = (dest.0 - origin.0).abs();
                let dy = (dest.1 - origin.1).abs();
                dx <= 1 && dy <= 1 && (dx, dy) != (0, 0) && !board.is_checked(self.color, dest)
            }
            _ => self.can_reach(board, origin, dest) && !board.move_creates_check(origin, dest),
        }
    }

    /// Castling precondition: neither the king nor the chosen rook has moved.
    pub fn can_castle(&self, rook: &Piece) -> bool {
        !self.has_moved && !rook.has_moved
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}
