// src/game.rs
use std::error::Error;
use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::board::{Board, BoardError};
use crate::piece::{Color, Piece, PieceKind};

// --- Player ---

/// One side of the game. The display name is generated at random when no
/// explicit name is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub color: Color,
    pub name: String,
    pub score: u32,
}

impl Player {
    pub fn new(color: Color) -> Self {
        Player { color, name: random_name(6), score: 0 }
    }

    pub fn named(color: Color, name: &str) -> Self {
        Player { color, name: name.to_string(), score: 0 }
    }
}

/// Random uppercase A-Z string of the given length.
fn random_name(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| (b'A' + rng.random_range(0..26u8)) as char)
        .collect()
}

// --- Move log ---

/// Snapshot of one accepted move, recorded after it was applied. Castling is
/// classified from the snapshot itself: a king whose chosen destination held
/// a same-color rook. The displaced occupant stays private so the log never
/// exposes the rook-destination encoding as a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub player: Color,
    pub origin: (i32, i32),
    pub dest: (i32, i32),
    pub piece: Piece,
    dest_piece: Option<Piece>,
}

impl MoveRecord {
    fn new(player: Color, origin: (i32, i32), dest: (i32, i32), piece: Piece, dest_piece: Option<Piece>) -> Self {
        MoveRecord { player, origin, dest, piece, dest_piece }
    }

    pub fn is_castling(&self) -> bool {
        self.piece.kind == PieceKind::King
            && self
                .dest_piece
                .map_or(false, |p| p.kind == PieceKind::Rook && p.color == self.piece.color)
    }

    /// The enemy piece this move captured, if any.
    pub fn captured(&self) -> Option<Piece> {
        self.dest_piece.filter(|p| p.color != self.piece.color)
    }
}

// --- Game state ---

#[derive(Debug, Serialize, Copy, Clone, PartialEq, Eq)]
pub enum GameState {
    Active,
    Draw,
    Forfeit,
    WhiteWin,
    BlackWin,
    Stalemate,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        *self != GameState::Active
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GameState::Active => "Active",
            GameState::Draw => "Draw",
            GameState::Forfeit => "Forfeit",
            GameState::WhiteWin => "WhiteWin",
            GameState::BlackWin => "BlackWin",
            GameState::Stalemate => "Stalemate",
        };
        write!(f, "{}", label)
    }
}

// --- Errors ---

#[derive(Debug, PartialEq, Eq)]
pub enum GameError {
    /// Both players were assigned the same color.
    SameColorPlayers(Color),
    /// A coordinate or king lookup failed at the board layer.
    Board(BoardError),
    /// `declare` was handed `Active`, which is not an outcome.
    InvalidOutcome,
    /// `declare` on a game that has already concluded.
    GameOver(GameState),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::SameColorPlayers(color) => {
                write!(f, "Players cannot have the same color: {:?}", color)
            }
            GameError::Board(e) => write!(f, "{}", e),
            GameError::InvalidOutcome => write!(f, "Active is not a declarable outcome"),
            GameError::GameOver(state) => write!(f, "Game already concluded: {}", state),
        }
    }
}

impl Error for GameError {}

impl From<BoardError> for GameError {
    fn from(e: BoardError) -> Self {
        GameError::Board(e)
    }
}

// --- Game ---

/// One chess game: two players, a board, whose turn it is, the lifecycle
/// state and the move log. All rule enforcement funnels through
/// [`attempt_move`](Self::attempt_move).
#[derive(Debug)]
pub struct Game {
    player1: Player,
    player2: Player,
    turn: Color,
    board: Board,
    state: GameState,
    moves: Vec<MoveRecord>,
}

impl Game {
    pub fn new(player1: Player, player2: Player) -> Result<Self, GameError> {
        if player1.color == player2.color {
            return Err(GameError::SameColorPlayers(player1.color));
        }
        Ok(Game {
            player1,
            player2,
            turn: Color::White,
            board: Board::new(),
            state: GameState::Active,
            moves: Vec::new(),
        })
    }

    // --- Accessors ---

    pub fn player1(&self) -> &Player {
        &self.player1
    }

    pub fn player2(&self) -> &Player {
        &self.player2
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    fn player_mut(&mut self, color: Color) -> &mut Player {
        if self.player1.color == color {
            &mut self.player1
        } else {
            &mut self.player2
        }
    }

    // --- Moving ---

    /// Attempts to move the piece on `origin` to `dest` on behalf of
    /// `player`.
    ///
    /// Out-of-range coordinates are an `Err`; every in-game reason a move
    /// cannot happen (wrong turn, wrong color, illegal destination, game
    /// already over) is an ordinary `Ok(false)` with the game untouched.
    /// `Ok(true)` means the board, scores, state and move log were updated
    /// and the turn passed to the opponent.
    pub fn attempt_move(
        &mut self,
        player: Color,
        origin: (i32, i32),
        dest: (i32, i32),
    ) -> Result<bool, GameError> {
        let origin_square = *self.board.square(origin.0, origin.1)?;
        let dest_square = *self.board.square(dest.0, dest.1)?;

        if self.state.is_terminal() {
            return Ok(false);
        }
        let piece = match origin_square.piece {
            Some(piece) => piece,
            None => return Ok(false),
        };
        if self.turn != player || piece.color != player {
            return Ok(false);
        }
        if !piece.can_move(&mut self.board, origin, dest) {
            return Ok(false);
        }

        let dest_piece = dest_square.piece;
        let record = MoveRecord::new(player, origin, dest, piece, dest_piece);

        if record.is_castling() {
            self.apply_castle(&record)?;
        } else {
            self.apply_standard(&record)?;
        }

        self.moves.push(record);
        self.turn = self.turn.opponent();
        Ok(true)
    }

    /// King and rook jump to their post-castle files on the king's rank.
    /// Queenside rook (file 0) puts the king on file 2, kingside on file 6;
    /// the rook lands on the far side of the king.
    fn apply_castle(&mut self, record: &MoveRecord) -> Result<(), GameError> {
        let y = record.origin.1;
        let x_king = if record.dest.0 == 0 { 2 } else { 6 };
        let x_rook = if x_king == 2 { 3 } else { 5 };

        let mut king = record.piece;
        king.has_moved = true;
        let mut rook = match self.board.square(record.dest.0, record.dest.1)?.piece {
            Some(rook) => rook,
            None => {
                // Legality already confirmed the rook; this cannot happen.
                eprintln!("castle applied with no rook at {:?}", record.dest);
                return Ok(());
            }
        };
        rook.has_moved = true;

        self.board.square_mut(record.origin.0, record.origin.1)?.piece = None;
        self.board.square_mut(record.dest.0, record.dest.1)?.piece = None;
        self.board.square_mut(x_king, y)?.piece = Some(king);
        self.board.square_mut(x_rook, y)?.piece = Some(rook);
        Ok(())
    }

    fn apply_standard(&mut self, record: &MoveRecord) -> Result<(), GameError> {
        // Capture: ledger first, then the capturer's score.
        if let Some(mut victim) = record.captured() {
            victim.captured = true;
            self.board.bury(victim);
            self.player_mut(record.player).score += victim.value();
        }

        let mut piece = record.piece;
        piece.has_moved = true;
        self.board.square_mut(record.origin.0, record.origin.1)?.piece = None;
        self.board.square_mut(record.dest.0, record.dest.1)?.piece = Some(piece);

        // Win by capturing the king, otherwise by mating the opponent.
        let winner = if record.player == Color::White {
            GameState::WhiteWin
        } else {
            GameState::BlackWin
        };
        if record.captured().map_or(false, |p| p.kind == PieceKind::King) {
            self.state = winner;
        } else if self.board.is_checkmate(record.player.opponent()) {
            self.state = winner;
        }

        // A pawn reaching the far rank becomes a queen on the spot.
        if piece.kind == PieceKind::Pawn && record.dest.1 == record.player.promotion_rank() {
            let mut queen = Piece::new(PieceKind::Queen, record.player);
            queen.has_moved = true;
            self.board.square_mut(record.dest.0, record.dest.1)?.piece = Some(queen);
        }
        Ok(())
    }

    // --- Lifecycle ---

    /// Returns the game to its starting configuration: fresh board, zeroed
    /// scores, empty move log, `Active` state, White to move. With
    /// `swap_colors` the players trade sides first.
    pub fn reset(&mut self, swap_colors: bool) {
        if swap_colors {
            self.player1.color = self.player1.color.opponent();
            self.player2.color = self.player2.color.opponent();
        }
        self.player1.score = 0;
        self.player2.score = 0;
        self.state = GameState::Active;
        self.moves.clear();
        self.board.reset();
        self.turn = Color::White;
    }

    /// Records an externally decided outcome. Draws, forfeits and stalemates
    /// only ever enter through here; the engine never detects them itself.
    pub fn declare(&mut self, outcome: GameState) -> Result<(), GameError> {
        if outcome == GameState::Active {
            return Err(GameError::InvalidOutcome);
        }
        if self.state.is_terminal() {
            return Err(GameError::GameOver(self.state));
        }
        self.state = outcome;
        Ok(())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        writeln!(
            f,
            "{} ({:?}): {}   {} ({:?}): {}",
            self.player1.name,
            self.player1.color,
            self.player1.score,
            self.player2.name,
            self.player2.color,
            self.player2.score
        )?;
        write!(f, "State: {}   Turn: {:?}", self.state, self.turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_game() -> Game {
        Game::new(Player::named(Color::White, "WHITE"), Player::named(Color::Black, "BLACK")).unwrap()
    }

    #[test]
    fn players_must_have_opposite_colors() {
        let result = Game::new(
            Player::named(Color::White, "A"),
            Player::named(Color::White, "B"),
        );
        assert_eq!(result.unwrap_err(), GameError::SameColorPlayers(Color::White));
    }

    #[test]
    fn pawn_double_push_advances_and_flips_the_turn() {
        let mut game = new_game();
        assert_eq!(game.attempt_move(Color::White, (4, 1), (4, 3)), Ok(true));

        assert!(game.board().square(4, 1).unwrap().piece.is_none());
        let pawn = game.board().square(4, 3).unwrap().piece.unwrap();
        assert_eq!(pawn.kind, PieceKind::Pawn);
        assert!(pawn.has_moved);
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.moves().len(), 1);
        assert!(!game.moves()[0].is_castling());
    }

    #[test]
    fn out_of_turn_moves_are_rejected_without_side_effects() {
        let mut game = new_game();
        assert_eq!(game.attempt_move(Color::Black, (4, 6), (4, 4)), Ok(false));

        assert_eq!(game.turn(), Color::White);
        assert_eq!(game.state(), GameState::Active);
        assert!(game.moves().is_empty());
        assert!(game.board().square(4, 6).unwrap().piece.is_some());
        assert!(game.board().square(4, 4).unwrap().piece.is_none());
    }

    #[test]
    fn moving_the_opponents_piece_is_rejected() {
        let mut game = new_game();
        assert_eq!(game.attempt_move(Color::White, (4, 6), (4, 4)), Ok(false));
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn out_of_bounds_coordinates_are_an_error() {
        let mut game = new_game();
        assert!(game.attempt_move(Color::White, (4, 1), (4, 8)).is_err());
        assert!(game.attempt_move(Color::White, (-1, 0), (0, 0)).is_err());
    }

    #[test]
    fn capture_feeds_the_ledger_and_the_score() {
        let mut game = new_game();
        // Scholar's-opening skirmish: white pawn takes the d5 pawn.
        assert_eq!(game.attempt_move(Color::White, (4, 1), (4, 3)), Ok(true));
        assert_eq!(game.attempt_move(Color::Black, (3, 6), (3, 4)), Ok(true));
        assert_eq!(game.attempt_move(Color::White, (4, 3), (3, 4)), Ok(true));

        assert_eq!(game.board().dead_pieces().len(), 1);
        let victim = game.board().dead_pieces()[0];
        assert_eq!(victim.kind, PieceKind::Pawn);
        assert_eq!(victim.color, Color::Black);
        assert!(victim.captured);
        assert_eq!(game.player1().score, 1);
        assert_eq!(game.moves()[2].captured().map(|p| p.kind), Some(PieceKind::Pawn));
    }

    #[test]
    fn kingside_castle_places_king_and_rook() {
        let mut game = new_game();
        game.board_mut().square_mut(5, 0).unwrap().piece = None;
        game.board_mut().square_mut(6, 0).unwrap().piece = None;

        assert_eq!(game.attempt_move(Color::White, (4, 0), (7, 0)), Ok(true));

        let king = game.board().square(6, 0).unwrap().piece.unwrap();
        let rook = game.board().square(5, 0).unwrap().piece.unwrap();
        assert_eq!(king.kind, PieceKind::King);
        assert_eq!(rook.kind, PieceKind::Rook);
        assert!(king.has_moved);
        assert!(rook.has_moved);
        assert!(game.board().square(4, 0).unwrap().piece.is_none());
        assert!(game.board().square(7, 0).unwrap().piece.is_none());

        // The log marks it as a castle, not a capture.
        assert!(game.moves()[0].is_castling());
        assert_eq!(game.moves()[0].captured(), None);
        assert_eq!(game.player1().score, 0);
        assert!(game.board().dead_pieces().is_empty());
    }

    #[test]
    fn queenside_castle_places_king_and_rook() {
        let mut game = new_game();
        for x in [1, 2, 3] {
            game.board_mut().square_mut(x, 0).unwrap().piece = None;
        }

        assert_eq!(game.attempt_move(Color::White, (4, 0), (0, 0)), Ok(true));
        assert_eq!(
            game.board().square(2, 0).unwrap().piece.map(|p| p.kind),
            Some(PieceKind::King)
        );
        assert_eq!(
            game.board().square(3, 0).unwrap().piece.map(|p| p.kind),
            Some(PieceKind::Rook)
        );
    }

    #[test]
    fn castle_through_an_attacked_square_is_rejected() {
        let mut game = new_game();
        game.board_mut().square_mut(5, 0).unwrap().piece = None;
        game.board_mut().square_mut(6, 0).unwrap().piece = None;
        game.board_mut().square_mut(5, 1).unwrap().piece = None;
        game.board_mut().square_mut(5, 4).unwrap().piece =
            Some(Piece::new(PieceKind::Rook, Color::Black));

        assert_eq!(game.attempt_move(Color::White, (4, 0), (7, 0)), Ok(false));
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn castle_is_refused_once_the_king_has_moved() {
        let mut game = new_game();
        game.board_mut().square_mut(5, 0).unwrap().piece = None;
        game.board_mut().square_mut(6, 0).unwrap().piece = None;

        assert_eq!(game.attempt_move(Color::White, (4, 0), (5, 0)), Ok(true));
        assert_eq!(game.attempt_move(Color::Black, (0, 6), (0, 5)), Ok(true));
        assert_eq!(game.attempt_move(Color::White, (5, 0), (4, 0)), Ok(true));
        assert_eq!(game.attempt_move(Color::Black, (0, 5), (0, 4)), Ok(true));

        assert_eq!(game.attempt_move(Color::White, (4, 0), (7, 0)), Ok(false));
    }

    #[test]
    fn pawn_reaching_the_far_rank_becomes_a_queen() {
        let mut game = new_game();
        // Clear a lane and plant an unmoved-flagged white pawn on a7.
        game.board_mut().square_mut(0, 6).unwrap().piece = None;
        game.board_mut().square_mut(0, 7).unwrap().piece = None;
        let mut pawn = Piece::new(PieceKind::Pawn, Color::White);
        pawn.has_moved = true;
        game.board_mut().square_mut(0, 6).unwrap().piece = Some(pawn);
        game.board_mut().square_mut(0, 1).unwrap().piece = None;

        assert_eq!(game.attempt_move(Color::White, (0, 6), (0, 7)), Ok(true));
        let promoted = game.board().square(0, 7).unwrap().piece.unwrap();
        assert_eq!(promoted.kind, PieceKind::Queen);
        assert_eq!(promoted.color, Color::White);
        // The log still records the pawn that moved.
        assert_eq!(game.moves()[0].piece.kind, PieceKind::Pawn);
    }

    #[test]
    fn fools_mate_ends_the_game() {
        let mut game = new_game();
        assert_eq!(game.attempt_move(Color::White, (5, 1), (5, 2)), Ok(true));
        assert_eq!(game.attempt_move(Color::Black, (4, 6), (4, 4)), Ok(true));
        assert_eq!(game.attempt_move(Color::White, (6, 1), (6, 3)), Ok(true));
        assert_eq!(game.attempt_move(Color::Black, (3, 7), (7, 3)), Ok(true));

        assert_eq!(game.state(), GameState::BlackWin);
        // No further moves are accepted.
        assert_eq!(game.attempt_move(Color::White, (4, 1), (4, 2)), Ok(false));
    }

    #[test]
    fn capturing_the_king_wins_immediately() {
        let mut game = new_game();
        game.board_mut().clear_board();
        game.board_mut().square_mut(4, 0).unwrap().piece =
            Some(Piece::new(PieceKind::King, Color::White));
        game.board_mut().square_mut(4, 4).unwrap().piece =
            Some(Piece::new(PieceKind::Rook, Color::White));
        game.board_mut().square_mut(4, 7).unwrap().piece =
            Some(Piece::new(PieceKind::King, Color::Black));

        assert_eq!(game.attempt_move(Color::White, (4, 4), (4, 7)), Ok(true));
        assert_eq!(game.state(), GameState::WhiteWin);
        assert_eq!(game.player1().score, 100);
    }

    #[test]
    fn self_check_moves_are_rejected() {
        let mut game = new_game();
        game.board_mut().clear_board();
        game.board_mut().square_mut(4, 0).unwrap().piece =
            Some(Piece::new(PieceKind::King, Color::White));
        game.board_mut().square_mut(4, 1).unwrap().piece =
            Some(Piece::new(PieceKind::Rook, Color::White));
        game.board_mut().square_mut(4, 7).unwrap().piece =
            Some(Piece::new(PieceKind::Rook, Color::Black));
        game.board_mut().square_mut(0, 7).unwrap().piece =
            Some(Piece::new(PieceKind::King, Color::Black));

        // The rook is pinned to the e-file.
        assert_eq!(game.attempt_move(Color::White, (4, 1), (5, 1)), Ok(false));
        assert_eq!(game.attempt_move(Color::White, (4, 1), (4, 5)), Ok(true));
    }

    #[test]
    fn reset_restores_the_initial_configuration() {
        let mut game = new_game();
        game.attempt_move(Color::White, (4, 1), (4, 3)).unwrap();
        game.attempt_move(Color::Black, (3, 6), (3, 4)).unwrap();
        game.attempt_move(Color::White, (4, 3), (3, 4)).unwrap();
        game.declare(GameState::Draw).unwrap();

        game.reset(false);
        assert_eq!(game.state(), GameState::Active);
        assert_eq!(game.turn(), Color::White);
        assert!(game.moves().is_empty());
        assert_eq!(game.player1().score, 0);
        assert!(game.board().dead_pieces().is_empty());
        assert_eq!(*game.board(), Board::new());
    }

    #[test]
    fn reset_can_swap_colors() {
        let mut game = new_game();
        game.reset(true);
        assert_eq!(game.player1().color, Color::Black);
        assert_eq!(game.player2().color, Color::White);
        // White still opens, so player2 is now on move.
        assert_eq!(game.turn(), Color::White);
        assert_eq!(game.attempt_move(Color::White, (4, 1), (4, 3)), Ok(true));
        assert_eq!(game.player2().score, 0);
    }

    #[test]
    fn declared_outcomes_are_one_way() {
        let mut game = new_game();
        assert_eq!(game.declare(GameState::Active), Err(GameError::InvalidOutcome));

        game.declare(GameState::Forfeit).unwrap();
        assert_eq!(game.state(), GameState::Forfeit);
        assert_eq!(
            game.declare(GameState::Draw),
            Err(GameError::GameOver(GameState::Forfeit))
        );
        // Terminal state also blocks further moves.
        assert_eq!(game.attempt_move(Color::White, (4, 1), (4, 3)), Ok(false));
    }

    #[test]
    fn random_player_names_are_uppercase_ascii() {
        let player = Player::new(Color::White);
        assert_eq!(player.name.len(), 6);
        assert!(player.name.chars().all(|c| c.is_ascii_uppercase()));
    }
}
