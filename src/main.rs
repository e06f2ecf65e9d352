// src/main.rs
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};

use lazy_static::lazy_static;
use regex::Regex;

use chess_engine::game::GameState;
use chess_engine::session::{GameSession, SessionError};

const DEFAULT_SAVE_FILENAME: &str = "chess_status.json";

lazy_static! {
    // Coordinate algebraic: origin square then destination square, e.g. "e2e4".
    static ref MOVE_RE: Regex = Regex::new("^([a-h][1-8])([a-h][1-8])$").unwrap();
    static ref SQUARE_RE: Regex = Regex::new("^[a-h][1-8]$").unwrap();
}

// --- Errors ---

#[derive(Debug)]
enum CommandError {
    UnknownCommand(String),
    InvalidSquare(String),
    Session(SessionError),
    Serialization(serde_json::Error),
    Io(String, io::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(cmd) => {
                write!(f, "Unknown command: '{}'. Type 'help' for commands.", cmd)
            }
            CommandError::InvalidSquare(s) => {
                write!(f, "Invalid square: '{}'. Use file a-h and rank 1-8, e.g. 'e2'.", s)
            }
            CommandError::Session(e) => write!(f, "{}", e),
            CommandError::Serialization(e) => write!(f, "Serialization error: {}", e),
            CommandError::Io(file, e) => write!(f, "I/O error with file '{}': {}", file, e),
        }
    }
}

impl Error for CommandError {}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        CommandError::Session(e)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::Serialization(e)
    }
}

// --- Input parsing ---

#[derive(Debug, PartialEq, Eq)]
enum UserInput {
    Move((i32, i32), (i32, i32)),
    Squares((i32, i32)),
    Status,
    Save(String),
    Reset,
    Swap,
    Declare(GameState),
    Help,
    Quit,
}

/// "e2" -> (4, 1). Rank 1 is y = 0.
fn parse_square(input: &str) -> Result<(i32, i32), CommandError> {
    if !SQUARE_RE.is_match(input) {
        return Err(CommandError::InvalidSquare(input.to_string()));
    }
    let mut chars = input.chars();
    let file = chars.next().ok_or_else(|| CommandError::InvalidSquare(input.to_string()))?;
    let rank = chars.next().ok_or_else(|| CommandError::InvalidSquare(input.to_string()))?;
    Ok((file as i32 - 'a' as i32, rank as i32 - '1' as i32))
}

fn format_square(pos: (i32, i32)) -> String {
    let file = (b'a' + pos.0 as u8) as char;
    format!("{}{}", file, pos.1 + 1)
}

fn parse_user_input(input: &str) -> Result<UserInput, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if let Some(caps) = MOVE_RE.captures(&lower) {
        let origin = parse_square(&caps[1])?;
        let dest = parse_square(&caps[2])?;
        return Ok(UserInput::Move(origin, dest));
    }

    let mut parts = lower.splitn(2, char::is_whitespace);
    let command_word = parts.next().unwrap_or("");
    let argument = parts.next().unwrap_or("").trim();

    match command_word {
        "squares" => Ok(UserInput::Squares(parse_square(argument)?)),
        "status" => Ok(UserInput::Status),
        "save" => {
            let filename = if argument.is_empty() { DEFAULT_SAVE_FILENAME } else { argument };
            Ok(UserInput::Save(filename.to_string()))
        }
        "reset" | "newgame" => Ok(UserInput::Reset),
        "swap" => Ok(UserInput::Swap),
        "resign" | "forfeit" => Ok(UserInput::Declare(GameState::Forfeit)),
        "draw" => Ok(UserInput::Declare(GameState::Draw)),
        "stalemate" => Ok(UserInput::Declare(GameState::Stalemate)),
        "help" | "?" => Ok(UserInput::Help),
        "quit" | "exit" => Ok(UserInput::Quit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

// --- Command execution ---

fn save_status(session: &GameSession, filename: &str) -> Result<(), CommandError> {
    let status = session.status()?;
    let json = serde_json::to_string_pretty(&status)?;
    fs::write(filename, json).map_err(|e| CommandError::Io(filename.to_string(), e))?;
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  e2e4            move the piece on e2 to e4");
    println!("  e1h1            castle: move your king onto your own unmoved rook");
    println!("  squares <sq>    list the legal destinations for the piece on <sq>");
    println!("  status          print the full game status as JSON");
    println!("  save [file]     write the game status to a JSON file");
    println!("  reset           start a new game, same colors");
    println!("  swap            start a new game with colors swapped");
    println!("  resign          concede the game (forfeit)");
    println!("  draw            record an agreed draw");
    println!("  stalemate       record a stalemate");
    println!("  help            show this message");
    println!("  quit            leave");
}

fn print_board(session: &GameSession) {
    match session.status() {
        Ok(status) => {
            println!("  +-----------------+");
            for y in (0..8).rev() {
                print!("{} | ", y + 1);
                for x in 0..8 {
                    let cell = status
                        .board
                        .iter()
                        .find(|s| s.x == x && s.y == y)
                        .map(|s| s.piece.as_str())
                        .unwrap_or("");
                    if cell.is_empty() {
                        print!(". ");
                    } else {
                        print!("{} ", cell);
                    }
                }
                println!("|");
            }
            println!("  +-----------------+");
            println!("    a b c d e f g h");
            println!(
                "{:?} to move   state: {:?}   {}: {}  {}: {}",
                status.current_turn,
                status.state,
                status.player1.name,
                status.player1.score,
                status.player2.name,
                status.player2.score
            );
        }
        Err(e) => eprintln!("Error reading game status: {}", e),
    }
}

fn execute(session: &GameSession, input: UserInput) -> Result<bool, CommandError> {
    match input {
        UserInput::Move(origin, dest) => {
            if session.submit_move(origin, dest)? {
                println!("Moved {} to {}.", format_square(origin), format_square(dest));
            } else {
                println!(
                    "Move {} to {} refused.",
                    format_square(origin),
                    format_square(dest)
                );
            }
            print_board(session);
        }
        UserInput::Squares(pos) => {
            let squares = session.accessible_squares(pos.0, pos.1)?;
            if squares.is_empty() {
                println!("No legal destinations from {}.", format_square(pos));
            } else {
                let list: Vec<String> = squares.into_iter().map(format_square).collect();
                println!("{}: {}", format_square(pos), list.join(" "));
            }
        }
        UserInput::Status => {
            let status = session.status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        UserInput::Save(filename) => {
            save_status(session, &filename)?;
            println!("Status saved to '{}'.", filename);
        }
        UserInput::Reset => {
            session.reset(false);
            println!("New game started.");
            print_board(session);
        }
        UserInput::Swap => {
            session.reset(true);
            println!("New game started with colors swapped.");
            print_board(session);
        }
        UserInput::Declare(outcome) => {
            session.declare(outcome)?;
            println!("Game concluded: {:?}.", outcome);
        }
        UserInput::Help => print_help(),
        UserInput::Quit => return Ok(false),
    }
    Ok(true)
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=====================");
    println!("|    Rust Chess     |");
    println!("=====================");

    let session = GameSession::new()?;
    print_board(&session);
    print_help();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input_line = String::new();
        match io::stdin().read_line(&mut input_line) {
            Ok(0) => {
                println!("\nEnd of input. Quitting.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}. Try again or use 'quit'.", e);
                continue;
            }
        }

        let trimmed = input_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_user_input(trimmed) {
            Ok(input) => match execute(&session, input) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => println!("Error: {}", e),
            },
            Err(e) => println!("Error: {}", e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_moves_parse_to_zero_based_pairs() {
        assert_eq!(
            parse_user_input("e2e4").unwrap(),
            UserInput::Move((4, 1), (4, 3))
        );
        assert_eq!(
            parse_user_input("a1h8").unwrap(),
            UserInput::Move((0, 0), (7, 7))
        );
        assert!(parse_user_input("e2e9").is_err());
        assert!(parse_user_input("i2e4").is_err());
    }

    #[test]
    fn commands_parse_case_insensitively() {
        assert_eq!(parse_user_input("STATUS").unwrap(), UserInput::Status);
        assert_eq!(
            parse_user_input("squares e2").unwrap(),
            UserInput::Squares((4, 1))
        );
        assert_eq!(
            parse_user_input("resign").unwrap(),
            UserInput::Declare(GameState::Forfeit)
        );
        assert_eq!(
            parse_user_input("save mygame.json").unwrap(),
            UserInput::Save("mygame.json".to_string())
        );
        assert_eq!(
            parse_user_input("save").unwrap(),
            UserInput::Save(DEFAULT_SAVE_FILENAME.to_string())
        );
        assert!(parse_user_input("castle").is_err());
    }

    #[test]
    fn squares_round_trip_through_algebraic_names() {
        assert_eq!(parse_square("a1").unwrap(), (0, 0));
        assert_eq!(parse_square("h8").unwrap(), (7, 7));
        assert_eq!(format_square((4, 1)), "e2");
        assert_eq!(format_square((0, 7)), "a8");
    }
}
