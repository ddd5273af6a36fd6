//! Interactive line-oriented shell for playing against the engine
//!
//! Reads `x y` moves from stdin, prints an ASCII board with integer axes
//! around the occupied area, and reports how the engine reached each of its
//! moves. The win length can be passed as the first argument.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use omok::{config, DecisionType, Player, SearchEngine, SearchStats, SparseBoard};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let win_length = parse_win_length();

    println!("=== Infinite K-in-a-Row Engine ===\n");
    println!("Win condition: {win_length} in a row");
    println!("Commands: 'x y' to make move, 'quit' to exit\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let choice = prompt(&mut lines, "Choose your player (X or O, default X): ")?;
    let (human, ai) = if choice.eq_ignore_ascii_case("o") {
        println!("You are playing as O, AI is X\n");
        (Player::O, Player::X)
    } else {
        println!("You are playing as X, AI is O\n");
        (Player::X, Player::O)
    };

    let first = prompt(&mut lines, "Who goes first? (you/ai, default you): ")?;
    let ai_first = first.eq_ignore_ascii_case("ai");

    let detailed = prompt(&mut lines, "Enable detailed decision logs? (yes/no, default no): ")?;
    let detailed_logs = matches!(detailed.as_str(), "yes" | "y" | "Y");

    let mut board = SparseBoard::new(win_length);
    let mut engine = SearchEngine::new(win_length);
    let mut current = Player::X;

    // X always opens; an AI playing X just starts at the origin.
    if ai_first && ai == Player::X {
        board.make_move(0, 0, Player::X);
        println!("AI plays: (0, 0)\n");
        current = Player::O;
    }

    loop {
        print_board(&board);

        if let Some(winner) = winner_of(&board) {
            println!(
                "Player {} wins!",
                if winner == Player::X { "X" } else { "O" }
            );
            break;
        }

        if current == human {
            println!(
                "Player {} (You) to move.",
                if current == Player::X { "X" } else { "O" }
            );
            print!("Enter coordinates (x y): ");
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let input = line?;
            let input = input.trim();

            if matches!(input, "quit" | "q" | "exit") {
                break;
            }

            let Some((x, y)) = parse_move(input) else {
                println!("Invalid input. Please enter two numbers: x y");
                continue;
            };

            if !board.make_move(x, y, current) {
                println!("Invalid move. Cell is already occupied or invalid.");
                continue;
            }
        } else {
            println!(
                "Player {} (AI) is thinking...",
                if current == Player::X { "X" } else { "O" }
            );

            let mv = engine.find_best_move(&board, current, config::DEFAULT_TIME_MS);
            let stats = engine.stats().clone();

            if board.make_move(mv.x, mv.y, current) {
                println!("AI plays: ({}, {})", mv.x, mv.y);
                print_brief_report(&stats);
                if detailed_logs {
                    print_detailed_stats(&stats);
                } else {
                    println!();
                }
            } else {
                println!("AI error: move ({}, {}) is not legal here.", mv.x, mv.y);
                break;
            }
        }

        current = current.opponent();
    }

    println!("Game over. Thanks for playing!");
    Ok(())
}

fn parse_win_length() -> i32 {
    let Some(arg) = std::env::args().nth(1) else {
        return config::WIN_LENGTH;
    };
    match arg.parse::<i32>() {
        Ok(n) if n < 3 => {
            eprintln!("Win length must be at least 3. Using minimum: 3");
            3
        }
        Ok(n) if n > 20 => {
            eprintln!("Win length too large (max 20). Using maximum: 20");
            20
        }
        Ok(n) => n,
        Err(_) => {
            eprintln!(
                "Invalid argument. Using default win length: {}",
                config::WIN_LENGTH
            );
            config::WIN_LENGTH
        }
    }
}

fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    message: &str,
) -> Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(line?.trim().to_string()),
        None => Ok(String::new()),
    }
}

fn parse_move(input: &str) -> Option<(i32, i32)> {
    let mut parts = input.split_whitespace();
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    Some((x, y))
}

/// Winner, if any occupied cell completes a run for its occupant.
fn winner_of(board: &SparseBoard) -> Option<Player> {
    board
        .occupied_positions()
        .into_iter()
        .map(|pos| (board.at(pos.x, pos.y), pos))
        .find(|&(player, pos)| board.is_win(pos.x, pos.y, player))
        .map(|(player, _)| player)
}

/// Print the occupied area with a 2-cell margin, y axis descending.
fn print_board(board: &SparseBoard) {
    let margin = 2;
    let (min_x, max_x, min_y, max_y) = match board.bounding_box() {
        Some(bbox) => (
            bbox.min_x - margin,
            bbox.max_x + margin,
            bbox.min_y - margin,
            bbox.max_y + margin,
        ),
        None => (-margin, margin, -margin, margin),
    };

    print!("   ");
    for x in min_x..=max_x {
        print!("{x:3}");
    }
    println!();

    for y in (min_y..=max_y).rev() {
        print!("{y:3} ");
        for x in min_x..=max_x {
            match board.at(x, y) {
                Player::X => print!(" X "),
                Player::O => print!(" O "),
                Player::Empty => print!(" . "),
            }
        }
        println!();
    }
    println!();
}

fn format_time(time_ms: u64) -> String {
    if time_ms < 1000 {
        format!("{time_ms} ms")
    } else {
        format!("{:.2} s", time_ms as f64 / 1000.0)
    }
}

fn decision_label(decision: DecisionType) -> &'static str {
    match decision {
        DecisionType::ImmediateWin => "Immediate win",
        DecisionType::ImmediateBlock => "Immediate block",
        DecisionType::DangerousThreat => "Dangerous threat block",
        DecisionType::ThreatSolver => "Threat-based forced win",
        DecisionType::Negamax => "Negamax search",
    }
}

fn print_brief_report(stats: &SearchStats) {
    print!(
        "Time: {} | Method: {}",
        format_time(stats.time_ms),
        decision_label(stats.decision)
    );
    if stats.decision == DecisionType::Negamax {
        print!(" (depth {})", stats.depth_reached);
    }
    println!();
}

fn print_detailed_stats(stats: &SearchStats) {
    println!("\n=== Detailed Search Statistics ===");
    println!("Decision method: {}", decision_label(stats.decision));
    println!("Time: {}", format_time(stats.time_ms));
    println!("Nodes searched: {}", stats.nodes_searched);

    if stats.decision == DecisionType::Negamax {
        println!("Depth reached: {}", stats.depth_reached);
        println!("Final score: {}", stats.final_score);

        if !stats.pv.is_empty() {
            print!("Principal variation: ");
            for mv in stats.pv.iter().take(10) {
                print!("({},{}) ", mv.x, mv.y);
            }
            println!();
        }
    }

    println!("===================================\n");
}
