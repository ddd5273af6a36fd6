//! JSON request/response protocol for the web shell
//!
//! One request object in, one response object out. The request carries the
//! whole move history; the shell replays it into a fresh board, runs the
//! command and serializes the result. The move for `make_move` travels in a
//! dedicated top-level `move` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Player, SparseBoard};
use crate::config;
use crate::engine::{DecisionType, SearchEngine, SearchStats};

/// Protocol failures, each becoming a `{success:false, error}` response.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing 'command' field")]
    MissingCommand,
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Invalid current_player: {0}")]
    InvalidPlayer(String),
    #[error("Invalid move in history: ({x}, {y}), player: {player}")]
    InvalidHistoryMove { x: i32, y: i32, player: String },
    #[error("Missing 'move' field for make_move")]
    MissingMove,
    #[error("Invalid move: ({x}, {y})")]
    InvalidMove { x: i32, y: i32 },
}

/// Incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub win_length: Option<i32>,
    #[serde(default)]
    pub current_player: Option<String>,
    #[serde(default)]
    pub time_ms: Option<u64>,
    #[serde(default)]
    pub moves: Vec<WireMove>,
    /// The move to play for `make_move`.
    #[serde(default, rename = "move")]
    pub new_move: Option<WireCell>,
}

/// One history entry on the wire. A missing player defaults to X.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMove {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub player: Option<String>,
}

/// A bare cell coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WireCell {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Serialize)]
pub struct WireBoardCell {
    pub x: i32,
    pub y: i32,
    pub player: String,
}

#[derive(Debug, Serialize)]
pub struct WireBbox {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

#[derive(Debug, Serialize)]
pub struct WireBoard {
    pub cells: Vec<WireBoardCell>,
    /// `null` while the board is empty.
    pub bbox: Option<WireBbox>,
}

#[derive(Debug, Serialize)]
pub struct WirePlayedMove {
    pub x: i32,
    pub y: i32,
    pub player: String,
}

#[derive(Debug, Serialize)]
pub struct WireStats {
    pub time_ms: u64,
    pub decision_type: String,
    pub depth_reached: i32,
    pub nodes_searched: u64,
    pub final_score: i32,
    pub principal_variation: Vec<WireCell>,
}

/// Outgoing response.
#[derive(Debug, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<WireBoard>,
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub played: Option<WirePlayedMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<WireStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_over: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_terminal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn error(err: &WireError) -> Self {
        Self {
            success: false,
            board: None,
            played: None,
            stats: None,
            game_over: None,
            winner: None,
            is_terminal: None,
            error: Some(err.to_string()),
        }
    }

    fn success(
        board: &SparseBoard,
        played: Option<WirePlayedMove>,
        stats: Option<WireStats>,
        game_over: bool,
        winner: Option<Player>,
    ) -> Self {
        Self {
            success: true,
            board: Some(serialize_board(board)),
            played,
            stats,
            game_over: Some(game_over),
            winner: Some(winner.map(player_name)),
            is_terminal: Some(board.is_terminal()),
            error: None,
        }
    }
}

fn player_name(player: Player) -> String {
    match player {
        Player::X => "X".to_string(),
        Player::O => "O".to_string(),
        Player::Empty => "None".to_string(),
    }
}

fn parse_player(name: &str) -> Option<Player> {
    match name {
        "X" | "x" => Some(Player::X),
        "O" | "o" => Some(Player::O),
        _ => None,
    }
}

fn serialize_board(board: &SparseBoard) -> WireBoard {
    let cells = board
        .occupied_positions()
        .into_iter()
        .map(|pos| WireBoardCell {
            x: pos.x,
            y: pos.y,
            player: player_name(board.at(pos.x, pos.y)),
        })
        .collect();

    let bbox = board.bounding_box().map(|b| WireBbox {
        min_x: b.min_x,
        max_x: b.max_x,
        min_y: b.min_y,
        max_y: b.max_y,
    });

    WireBoard { cells, bbox }
}

fn decision_name(decision: DecisionType) -> &'static str {
    match decision {
        DecisionType::ImmediateWin => "IMMEDIATE_WIN",
        DecisionType::ImmediateBlock => "IMMEDIATE_BLOCK",
        DecisionType::DangerousThreat => "DANGEROUS_THREAT",
        DecisionType::ThreatSolver => "THREAT_SOLVER",
        DecisionType::Negamax => "NEGAMAX_SEARCH",
    }
}

fn serialize_stats(stats: &SearchStats) -> WireStats {
    WireStats {
        time_ms: stats.time_ms,
        decision_type: decision_name(stats.decision).to_string(),
        depth_reached: stats.depth_reached,
        nodes_searched: stats.nodes_searched,
        final_score: stats.final_score,
        principal_variation: stats
            .pv
            .iter()
            .map(|m| WireCell { x: m.x, y: m.y })
            .collect(),
    }
}

/// Winner of a finished game, if any: the player of the last move when it
/// completed a run.
fn winner_of(board: &SparseBoard) -> Option<Player> {
    let last = board.history().last()?;
    if board.is_win(last.x, last.y, last.player) {
        Some(last.player)
    } else {
        None
    }
}

fn clamp_win_length(requested: Option<i32>) -> i32 {
    match requested {
        Some(n) if n >= 3 => n.min(20),
        _ => config::WIN_LENGTH,
    }
}

fn build_board(win_length: i32, moves: &[WireMove]) -> Result<SparseBoard, WireError> {
    let mut board = SparseBoard::new(win_length);
    for m in moves {
        let name = m.player.as_deref().unwrap_or("X");
        let player = parse_player(name).ok_or_else(|| WireError::InvalidHistoryMove {
            x: m.x,
            y: m.y,
            player: name.to_string(),
        })?;
        if !board.make_move(m.x, m.y, player) {
            return Err(WireError::InvalidHistoryMove {
                x: m.x,
                y: m.y,
                player: name.to_string(),
            });
        }
    }
    Ok(board)
}

fn required_player(request: &Request) -> Result<Player, WireError> {
    let name = request.current_player.as_deref().unwrap_or("");
    parse_player(name).ok_or_else(|| WireError::InvalidPlayer(name.to_string()))
}

/// Run one request against a fresh board and engine.
pub fn handle_request(request: &Request) -> Result<Response, WireError> {
    if request.command.is_empty() {
        return Err(WireError::MissingCommand);
    }

    let win_length = clamp_win_length(request.win_length);
    let mut board = build_board(win_length, &request.moves)?;

    match request.command.as_str() {
        "make_move" => {
            let cell = request.new_move.ok_or(WireError::MissingMove)?;
            let player = required_player(request)?;

            if !board.make_move(cell.x, cell.y, player) {
                return Err(WireError::InvalidMove {
                    x: cell.x,
                    y: cell.y,
                });
            }

            let game_over = board.is_terminal();
            let winner = if game_over { winner_of(&board) } else { None };
            let played = WirePlayedMove {
                x: cell.x,
                y: cell.y,
                player: player_name(player),
            };
            Ok(Response::success(
                &board,
                Some(played),
                None,
                game_over,
                winner,
            ))
        }
        "ai_move" => {
            let player = required_player(request)?;
            let time_ms = match request.time_ms {
                Some(ms) if ms > 0 => ms,
                _ => config::DEFAULT_TIME_MS,
            };

            let mut engine = SearchEngine::new(win_length);
            let mv = engine.find_best_move(&board, player, time_ms);

            if !board.make_move(mv.x, mv.y, player) {
                return Err(WireError::InvalidMove { x: mv.x, y: mv.y });
            }

            let game_over = board.is_terminal();
            let winner = if game_over { winner_of(&board) } else { None };
            let played = WirePlayedMove {
                x: mv.x,
                y: mv.y,
                player: player_name(player),
            };
            let stats = serialize_stats(engine.stats());
            Ok(Response::success(
                &board,
                Some(played),
                Some(stats),
                game_over,
                winner,
            ))
        }
        "get_state" => Ok(Response::success(
            &board,
            None,
            None,
            board.is_terminal(),
            None,
        )),
        other => Err(WireError::UnknownCommand(other.to_string())),
    }
}

/// Parse raw input and run it; protocol failures become error responses.
#[must_use]
pub fn handle_input(input: &str) -> Response {
    let run = || -> Result<Response, WireError> {
        if input.trim().is_empty() {
            return Err(WireError::EmptyInput);
        }
        let request: Request = serde_json::from_str(input)?;
        handle_request(&request)
    };

    match run() {
        Ok(response) => response,
        Err(err) => Response::error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_error() {
        let response = handle_input("  \n ");
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Empty input"));
    }

    #[test]
    fn test_malformed_json_is_error() {
        let response = handle_input("{not json");
        assert!(!response.success);
        assert!(response.error.is_some());
    }

    #[test]
    fn test_unknown_command_is_error() {
        let response = handle_input(r#"{"command": "frobnicate"}"#);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("frobnicate"));
    }

    #[test]
    fn test_get_state_round_trip() {
        let input = r#"{
            "command": "get_state",
            "win_length": 5,
            "moves": [
                {"x": 0, "y": 0, "player": "X"},
                {"x": 1, "y": 1, "player": "O"}
            ]
        }"#;

        let response = handle_input(input);
        assert!(response.success);

        let board = response.board.unwrap();
        assert_eq!(board.cells.len(), 2);
        let bbox = board.bbox.unwrap();
        assert_eq!((bbox.min_x, bbox.max_x), (0, 1));
        assert_eq!(response.is_terminal, Some(false));
        assert_eq!(response.game_over, Some(false));
    }

    #[test]
    fn test_get_state_empty_board_has_null_bbox() {
        let response = handle_input(r#"{"command": "get_state"}"#);
        assert!(response.success);
        assert!(response.board.unwrap().bbox.is_none());
    }

    #[test]
    fn test_make_move_uses_dedicated_field() {
        let input = r#"{
            "command": "make_move",
            "current_player": "X",
            "moves": [{"x": 0, "y": 0, "player": "O"}],
            "move": {"x": 3, "y": 4}
        }"#;

        let response = handle_input(input);
        assert!(response.success);

        let played = response.played.unwrap();
        assert_eq!((played.x, played.y), (3, 4));
        assert_eq!(played.player, "X");
        assert_eq!(response.board.unwrap().cells.len(), 2);
    }

    #[test]
    fn test_make_move_requires_move_field() {
        let input = r#"{"command": "make_move", "current_player": "X"}"#;
        let response = handle_input(input);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("move"));
    }

    #[test]
    fn test_make_move_rejects_occupied_cell() {
        let input = r#"{
            "command": "make_move",
            "current_player": "X",
            "moves": [{"x": 0, "y": 0, "player": "O"}],
            "move": {"x": 0, "y": 0}
        }"#;

        let response = handle_input(input);
        assert!(!response.success);
    }

    #[test]
    fn test_make_move_detects_win() {
        let input = r#"{
            "command": "make_move",
            "current_player": "X",
            "moves": [
                {"x": 0, "y": 0, "player": "X"},
                {"x": 0, "y": 5, "player": "O"},
                {"x": 1, "y": 0, "player": "X"},
                {"x": 1, "y": 5, "player": "O"},
                {"x": 2, "y": 0, "player": "X"},
                {"x": 2, "y": 5, "player": "O"},
                {"x": 3, "y": 0, "player": "X"},
                {"x": 3, "y": 5, "player": "O"}
            ],
            "move": {"x": 4, "y": 0}
        }"#;

        let response = handle_input(input);
        assert!(response.success);
        assert_eq!(response.game_over, Some(true));
        assert_eq!(response.winner, Some(Some("X".to_string())));
        assert_eq!(response.is_terminal, Some(true));
    }

    #[test]
    fn test_invalid_history_move_is_error() {
        let input = r#"{
            "command": "get_state",
            "moves": [
                {"x": 0, "y": 0, "player": "X"},
                {"x": 0, "y": 0, "player": "O"}
            ]
        }"#;

        let response = handle_input(input);
        assert!(!response.success);
        assert!(response.error.unwrap().contains("history"));
    }

    #[test]
    fn test_ai_move_wins_when_possible() {
        let input = r#"{
            "command": "ai_move",
            "current_player": "X",
            "time_ms": 1000,
            "moves": [
                {"x": 0, "y": 0, "player": "X"},
                {"x": 0, "y": 5, "player": "O"},
                {"x": 1, "y": 0, "player": "X"},
                {"x": 1, "y": 5, "player": "O"},
                {"x": 2, "y": 0, "player": "X"},
                {"x": 2, "y": 5, "player": "O"},
                {"x": 3, "y": 0, "player": "X"}
            ]
        }"#;

        let response = handle_input(input);
        assert!(response.success);

        let stats = response.stats.unwrap();
        assert_eq!(stats.decision_type, "IMMEDIATE_WIN");
        assert_eq!(response.game_over, Some(true));
        assert_eq!(response.winner, Some(Some("X".to_string())));
    }

    #[test]
    fn test_ai_move_requires_player() {
        let input = r#"{"command": "ai_move"}"#;
        let response = handle_input(input);
        assert!(!response.success);
    }

    #[test]
    fn test_win_length_clamped() {
        // win_length below 3 falls back to the default; the response is
        // still well-formed.
        let input = r#"{"command": "get_state", "win_length": 1}"#;
        let response = handle_input(input);
        assert!(response.success);
    }

    #[test]
    fn test_response_serializes_cleanly() {
        let response = handle_input(r#"{"command": "get_state"}"#);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"bbox\":null"));
    }
}
