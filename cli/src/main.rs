//! # 1+1 CLI
//!
//! Command-line interface for playing the 1+1 match-and-shift puzzle
//! interactively or running headless simulations with configurable policies.

use clap::{Parser, ValueEnum};
use one_plus_one_core::{Coord, Direction, Game};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::io::{self, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "one-plus-one")]
#[command(author, version, about = "Play 1+1 in the terminal or run simulations")]
struct Args {
    /// Run in interactive mode (default if no other mode specified)
    #[arg(short, long)]
    interactive: bool,

    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Board edge length
    #[arg(long, default_value = "5")]
    size: usize,

    /// Maximum moves per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_moves: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random legal merge
    Random,
    /// First legal merge in row-major scan order
    Scan,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Some(episodes) = args.episodes {
        run_headless(&args, episodes);
    } else {
        run_interactive(&args);
    }
}

/// Run interactive mode where the user plays with the keyboard.
fn run_interactive(args: &Args) {
    // Set terminal to raw mode for single-key input
    enable_raw_mode();

    let mut game = Game::with_size(args.seed, args.size);
    let mut cursor = game.center();
    let mut stdin = io::stdin();
    let mut buffer = [0u8; 3];

    draw(&game, cursor);

    loop {
        let bytes_read = stdin.read(&mut buffer).unwrap_or(0);
        if bytes_read == 0 {
            continue;
        }

        match parse_input(&buffer[..bytes_read]) {
            InputAction::MoveCursor(dir) => {
                let (dx, dy) = dir.delta();
                if let Some(next) = cursor.offset(dx, dy, game.size()) {
                    cursor = next;
                }
                draw(&game, cursor);
            }
            InputAction::Drag(dir) => {
                if !game.is_ended() {
                    let outcome = game.try_move(cursor, dir);
                    draw(&game, cursor);

                    if outcome.accepted {
                        println!("  +{} points!", outcome.reward);
                    } else {
                        println!("  No merge that way.");
                    }

                    if game.is_ended() {
                        println!("\n  *** GAME OVER ***");
                        println!("  Final Score: {}", game.score());
                        println!("  Highest at center: {}", game.highest());
                        println!("\n  Press R to restart or Q to quit");
                    }
                }
            }
            InputAction::Restart => {
                game.reset(args.seed);
                cursor = game.center();
                draw(&game, cursor);
            }
            InputAction::Quit => {
                disable_raw_mode();
                println!("\nGoodbye!");
                break;
            }
            InputAction::None => {}
        }
    }
}

/// Run headless simulation mode.
fn run_headless(args: &Args, episodes: u32) {
    if episodes == 0 {
        println!("episodes=0");
        return;
    }
    let mut total_score: u64 = 0;
    let mut scores: Vec<u64> = Vec::with_capacity(episodes as usize);
    let mut highest_values: Vec<u32> = Vec::with_capacity(episodes as usize);
    let mut highest_overall: u32 = 0;

    // Use a separate RNG for move selection
    let mut action_rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1000));

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(episode as u64);
        let mut game = Game::with_size(episode_seed, args.size);
        let mut moves = 0;

        while !game.is_ended() && (args.max_moves == 0 || moves < args.max_moves) {
            let legal = game.legal_moves();
            if legal.is_empty() {
                break;
            }
            let (origin, dir) = match args.policy {
                Policy::Random => legal[action_rng.gen_range(0..legal.len())],
                Policy::Scan => legal[0],
            };

            game.try_move(origin, dir);
            moves += 1;

            if args.verbose {
                println!(
                    "Episode {} Move {}: ({}, {}) {:?}",
                    episode + 1,
                    moves,
                    origin.x,
                    origin.y,
                    dir
                );
                print!("{}", game);
            }
        }

        let score = game.score();
        let highest = *game.highest();

        scores.push(score);
        highest_values.push(highest);
        total_score += score;
        highest_overall = highest_overall.max(highest);

        if args.verbose {
            println!(
                "Episode {}: Score={}, Highest={}, Moves={}",
                episode + 1,
                score,
                highest,
                moves
            );
        }
    }

    // Compute statistics
    let avg_score = total_score as f64 / episodes as f64;
    scores.sort_unstable();
    let median_score = if episodes % 2 == 0 {
        (scores[(episodes / 2 - 1) as usize] + scores[(episodes / 2) as usize]) as f64 / 2.0
    } else {
        scores[(episodes / 2) as usize] as f64
    };

    let mut highest_counts = std::collections::HashMap::new();
    for value in &highest_values {
        *highest_counts.entry(*value).or_insert(0u32) += 1;
    }

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", args.seed);
    println!("size={}", args.size);
    println!("max_moves={}", args.max_moves);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores.first().unwrap_or(&0));
    println!("max_score={}", scores.last().unwrap_or(&0));
    println!("highest_overall={}", highest_overall);

    let mut highest_list: Vec<_> = highest_counts.iter().collect();
    highest_list.sort_by_key(|&(value, _)| *value);
    print!("highest_distribution=");
    for (i, (value, count)) in highest_list.iter().enumerate() {
        if i > 0 {
            print!(",");
        }
        print!("{}:{}", value, count);
    }
    println!();
}

enum InputAction {
    MoveCursor(Direction),
    Drag(Direction),
    Restart,
    Quit,
    None,
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences) drag the selected tile
        [27, 91, 65] => InputAction::Drag(Direction::Up),
        [27, 91, 66] => InputAction::Drag(Direction::Down),
        [27, 91, 67] => InputAction::Drag(Direction::Right),
        [27, 91, 68] => InputAction::Drag(Direction::Left),

        // WASD moves the cursor
        [b'w'] | [b'W'] => InputAction::MoveCursor(Direction::Up),
        [b's'] | [b'S'] => InputAction::MoveCursor(Direction::Down),
        [b'a'] | [b'A'] => InputAction::MoveCursor(Direction::Left),
        [b'd'] | [b'D'] => InputAction::MoveCursor(Direction::Right),

        // Control keys
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

fn draw(game: &Game, cursor: Coord) {
    println!("\x1b[2J\x1b[H"); // Clear screen
    println!("=== 1+1 ===");
    println!("WASD: move cursor | Arrows: drag tile | Q: quit | R: restart\n");
    print_board(game, cursor);
    io::stdout().flush().unwrap_or(());
}

/// Render the grid with the cursor cell bracketed.
fn print_board(game: &Game, cursor: Coord) {
    println!(
        "Score: {}  Highest: {}  Moves: {}",
        game.score(),
        game.highest(),
        game.move_count()
    );
    let rule: String = "+------".repeat(game.size()) + "+";
    println!("{}", rule);
    for y in 0..game.size() {
        print!("|");
        for x in 0..game.size() {
            let at = Coord::new(x, y);
            let key = game.tile(at).key;
            if at == cursor {
                print!("{:^6}|", format!("[{}]", key));
            } else {
                print!("{:^6}|", key);
            }
        }
        println!();
        println!("{}", rule);
    }
}

// Platform-specific terminal raw mode handling
#[cfg(unix)]
fn enable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag &= !(libc::ICANON | libc::ECHO);
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(unix)]
fn disable_raw_mode() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        let fd = io::stdin().as_raw_fd();
        let mut termios: libc::termios = std::mem::zeroed();
        libc::tcgetattr(fd, &mut termios);
        termios.c_lflag |= libc::ICANON | libc::ECHO;
        libc::tcsetattr(fd, libc::TCSANOW, &termios);
    }
}

#[cfg(not(unix))]
fn enable_raw_mode() {
    // On non-Unix systems, just continue without raw mode
    // Interactive mode will require Enter after each key
}

#[cfg(not(unix))]
fn disable_raw_mode() {}
