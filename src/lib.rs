// src/lib.rs
pub mod board;
pub mod game;
pub mod piece;
pub mod session;

pub use board::{Board, BoardError, Square};
pub use game::{Game, GameError, GameState, MoveRecord, Player};
pub use piece::{Color, Piece, PieceKind};
pub use session::{GameSession, GameStatus, SessionError};
