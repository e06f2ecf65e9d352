// src/session.rs
use std::error::Error;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::board::{BoardError, SIZE};
use crate::game::{Game, GameError, GameState, Player};
use crate::piece::Color;

// --- Errors ---

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    Game(GameError),
    /// The caller asserted ownership of a square that is empty or holds the
    /// opponent's piece.
    PieceMismatch(i32, i32),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Game(e) => write!(f, "{}", e),
            SessionError::PieceMismatch(x, y) => {
                write!(f, "Player and piece mismatch at ({}, {})", x, y)
            }
        }
    }
}

impl Error for SessionError {}

impl From<GameError> for SessionError {
    fn from(e: GameError) -> Self {
        SessionError::Game(e)
    }
}

impl From<BoardError> for SessionError {
    fn from(e: BoardError) -> Self {
        SessionError::Game(GameError::Board(e))
    }
}

// --- Status views ---

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PlayerView {
    pub color: Color,
    pub name: String,
    pub score: u32,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        PlayerView {
            color: player.color,
            name: player.name.clone(),
            score: player.score,
        }
    }
}

/// One cell of the rendered board. Vacant squares carry an empty string so
/// the document always has 64 uniform entries.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SquareView {
    pub x: i32,
    pub y: i32,
    pub piece: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DeadPieceView {
    pub color: Color,
    pub piece: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MoveView {
    pub player: Color,
    pub origin: (i32, i32),
    pub dest: (i32, i32),
    pub piece: String,
    pub is_castle: bool,
}

/// Full snapshot of a game, shaped for serialization.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GameStatus {
    pub player1: PlayerView,
    pub player2: PlayerView,
    pub current_turn: Color,
    pub state: GameState,
    pub board: Vec<SquareView>,
    pub dead_pieces: Vec<DeadPieceView>,
    pub moves: Vec<MoveView>,
}

impl GameStatus {
    fn snapshot(game: &Game) -> Result<Self, SessionError> {
        let mut board = Vec::with_capacity((SIZE * SIZE) as usize);
        for x in 0..SIZE {
            for y in 0..SIZE {
                let square = game.board().square(x, y).map_err(GameError::from)?;
                board.push(SquareView {
                    x,
                    y,
                    piece: square.glyph().map(String::from).unwrap_or_default(),
                });
            }
        }

        let dead_pieces = game
            .board()
            .dead_pieces()
            .iter()
            .map(|p| DeadPieceView { color: p.color, piece: p.glyph().to_string() })
            .collect();

        let moves = game
            .moves()
            .iter()
            .map(|m| MoveView {
                player: m.player,
                origin: m.origin,
                dest: m.dest,
                piece: m.piece.glyph().to_string(),
                is_castle: m.is_castling(),
            })
            .collect();

        Ok(GameStatus {
            player1: PlayerView::from(game.player1()),
            player2: PlayerView::from(game.player2()),
            current_turn: game.turn(),
            state: game.state(),
            board,
            dead_pieces,
            moves,
        })
    }
}

// --- Session ---

/// Handle to one running game. All mutation goes through the write lock, so
/// moves, resets and declarations are serialized; status reads share the
/// read lock and may run concurrently with each other.
pub struct GameSession {
    inner: RwLock<Game>,
}

impl GameSession {
    /// Fresh session with two randomly named players, White and Black.
    pub fn new() -> Result<Self, GameError> {
        let game = Game::new(Player::new(Color::White), Player::new(Color::Black))?;
        Ok(GameSession { inner: RwLock::new(game) })
    }

    fn read(&self) -> RwLockReadGuard<'_, Game> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Game> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Serializable snapshot of the whole game.
    pub fn status(&self) -> Result<GameStatus, SessionError> {
        GameStatus::snapshot(&self.read())
    }

    /// True iff the piece on (x, y) belongs to the side whose turn it is.
    /// Empty squares are simply `Ok(false)`; only the coordinates can fail.
    pub fn is_current_turn_piece(&self, x: i32, y: i32) -> Result<bool, SessionError> {
        let game = self.read();
        let square = game.board().square(x, y).map_err(GameError::from)?;
        Ok(square.piece.map_or(false, |p| p.color == game.turn()))
    }

    /// Legal destinations for the piece on (x, y). Empty when the square is
    /// vacant or its piece is not on move.
    pub fn accessible_squares(&self, x: i32, y: i32) -> Result<Vec<(i32, i32)>, SessionError> {
        let mut game = self.write();
        let on_move = game
            .board()
            .square(x, y)
            .map_err(GameError::from)?
            .piece
            .map_or(false, |p| p.color == game.turn());
        if !on_move {
            return Ok(Vec::new());
        }
        Ok(game.board_mut().accessible_squares(x, y).map_err(GameError::from)?)
    }

    /// Submits a move on behalf of the side on turn. Asserting ownership of
    /// an empty or enemy origin square is an error; a legal-but-refused move
    /// is `Ok(false)`.
    pub fn submit_move(&self, origin: (i32, i32), dest: (i32, i32)) -> Result<bool, SessionError> {
        let mut game = self.write();
        let owned = game
            .board()
            .square(origin.0, origin.1)
            .map_err(GameError::from)?
            .piece
            .map_or(false, |p| p.color == game.turn());
        if !owned {
            return Err(SessionError::PieceMismatch(origin.0, origin.1));
        }
        let turn = game.turn();
        Ok(game.attempt_move(turn, origin, dest)?)
    }

    /// Starts a new game with the same players, optionally swapping colors.
    pub fn reset(&self, swap_colors: bool) {
        self.write().reset(swap_colors);
    }

    /// Records an externally decided outcome.
    pub fn declare(&self, outcome: GameState) -> Result<(), SessionError> {
        Ok(self.write().declare(outcome)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardError;

    #[test]
    fn new_session_reports_the_starting_position() {
        let session = GameSession::new().unwrap();
        let status = session.status().unwrap();

        assert_eq!(status.current_turn, Color::White);
        assert_eq!(status.state, GameState::Active);
        assert_eq!(status.board.len(), 64);
        assert!(status.dead_pieces.is_empty());
        assert!(status.moves.is_empty());
        assert_eq!(status.player1.color, Color::White);
        assert_eq!(status.player2.color, Color::Black);

        let occupied = status.board.iter().filter(|s| !s.piece.is_empty()).count();
        assert_eq!(occupied, 32);
    }

    #[test]
    fn ownership_query_distinguishes_sides_and_vacancy() {
        let session = GameSession::new().unwrap();
        assert_eq!(session.is_current_turn_piece(4, 1), Ok(true));
        assert_eq!(session.is_current_turn_piece(4, 6), Ok(false));
        assert_eq!(session.is_current_turn_piece(4, 4), Ok(false));
        assert!(session.is_current_turn_piece(4, 8).is_err());
    }

    #[test]
    fn accessible_squares_are_empty_for_the_side_not_on_move() {
        let session = GameSession::new().unwrap();
        assert_eq!(session.accessible_squares(4, 1).unwrap(), vec![(4, 2), (4, 3)]);
        assert_eq!(session.accessible_squares(4, 6).unwrap(), Vec::new());
        assert_eq!(session.accessible_squares(4, 4).unwrap(), Vec::new());
    }

    #[test]
    fn submitting_from_an_unowned_square_is_an_error() {
        let session = GameSession::new().unwrap();
        assert_eq!(
            session.submit_move((4, 4), (4, 5)),
            Err(SessionError::PieceMismatch(4, 4))
        );
        assert_eq!(
            session.submit_move((4, 6), (4, 4)),
            Err(SessionError::PieceMismatch(4, 6))
        );
        assert_eq!(
            session.submit_move((9, 0), (0, 0)),
            Err(SessionError::Game(GameError::Board(BoardError::OutOfBounds(9, 0))))
        );
    }

    #[test]
    fn moves_advance_the_shared_game() {
        let session = GameSession::new().unwrap();
        assert_eq!(session.submit_move((4, 1), (4, 3)), Ok(true));
        assert_eq!(session.submit_move((4, 6), (4, 4)), Ok(true));
        // Illegal destination for the knight.
        assert_eq!(session.submit_move((1, 0), (1, 2)), Ok(false));

        let status = session.status().unwrap();
        assert_eq!(status.moves.len(), 2);
        assert_eq!(status.current_turn, Color::White);
        assert_eq!(status.moves[0].origin, (4, 1));
        assert_eq!(status.moves[0].dest, (4, 3));
        assert!(!status.moves[0].is_castle);
    }

    #[test]
    fn reset_and_declare_round_trip() {
        let session = GameSession::new().unwrap();
        session.submit_move((4, 1), (4, 3)).unwrap();
        session.declare(GameState::Draw).unwrap();
        assert_eq!(session.status().unwrap().state, GameState::Draw);

        session.reset(true);
        let status = session.status().unwrap();
        assert_eq!(status.state, GameState::Active);
        assert!(status.moves.is_empty());
        assert_eq!(status.player1.color, Color::Black);
        assert_eq!(status.player2.color, Color::White);
    }

    #[test]
    fn status_serializes_to_json() {
        let session = GameSession::new().unwrap();
        let json = serde_json::to_string_pretty(&session.status().unwrap()).unwrap();
        assert!(json.contains("\"current_turn\": \"White\""));
        assert!(json.contains("\"state\": \"Active\""));
        assert!(json.contains('\u{2654}'));
        assert!(json.contains('\u{265A}'));
    }
}
