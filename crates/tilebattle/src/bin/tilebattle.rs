//! # TILEBATTLE Terminal
//!
//! Line-based front end. Type keys and press enter: `wasd` or `hjkl` slide,
//! `r` resets, `q` leaves.
//!
//! ```bash
//! tilebattle solo
//! tilebattle host [--port 8027]
//! tilebattle join [192.168.1.20]        # defaults to the last host joined
//!
//! # Common options
//! tilebattle --config tilebattle.toml --name alice --data .tilebattle host
//! ```

use std::error::Error;
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use tilebattle::core::GameSnapshot;
use tilebattle::shared::TileBattleConfig;
use tilebattle::{DuelMatch, HostLobby, JoinLobby, Key, MatchOutcome, SoloGame, Store};

/// One update tick at 60 Hz.
const FRAME_TIME: Duration = Duration::from_micros(16_666);

const DEFAULT_CONFIG: &str = "tilebattle.toml";
const DEFAULT_DATA_DIR: &str = ".tilebattle";

enum Mode {
    Solo,
    Host { port: Option<u16> },
    Join { host: Option<String> },
}

struct Options {
    mode: Mode,
    config: PathBuf,
    data: PathBuf,
    name: Option<String>,
}

fn usage() -> String {
    "usage: tilebattle [--config FILE] [--data DIR] [--name NAME] (solo | host [--port N] | join [HOST])"
        .to_string()
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut mode = None;
    let mut port = None;
    let mut host = None;
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut data = PathBuf::from(DEFAULT_DATA_DIR);
    let mut name = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = args.next().ok_or_else(usage)?.into(),
            "--data" => data = args.next().ok_or_else(usage)?.into(),
            "--name" => name = Some(args.next().ok_or_else(usage)?),
            "--port" => {
                let value = args.next().ok_or_else(usage)?;
                port = Some(value.parse().map_err(|_| format!("invalid port: {value}"))?);
            }
            command @ ("solo" | "host" | "join") if mode.is_none() => {
                mode = Some(command.to_string());
            }
            other if mode.as_deref() == Some("join") && host.is_none() => {
                host = Some(other.to_string());
            }
            _ => return Err(usage()),
        }
    }

    let mode = match mode.as_deref() {
        Some("solo") => Mode::Solo,
        Some("host") => Mode::Host { port },
        Some("join") => Mode::Join { host },
        _ => return Err(usage()),
    };
    Ok(Options {
        mode,
        config,
        data,
        name,
    })
}

/// Reads stdin lines on a thread so the tick loop never blocks.
fn spawn_stdin() -> Result<Receiver<String>, std::io::Error> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("tilebattle-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Next typed line, `Err(())` once stdin is closed.
fn next_line(input: &Receiver<String>) -> Result<Option<String>, ()> {
    match input.try_recv() {
        Ok(line) => Ok(Some(line)),
        Err(TryRecvError::Empty) => Ok(None),
        Err(TryRecvError::Disconnected) => Err(()),
    }
}

fn is_quit(line: &str) -> bool {
    matches!(line.trim(), "q" | "quit")
}

fn sleep_rest_of_frame(frame_start: Instant) {
    if let Some(rest) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
        thread::sleep(rest);
    }
}

fn print_board(title: &str, snapshot: &GameSnapshot) {
    println!(
        "── {title} ── score {} (best {}) ── {:.1}s",
        snapshot.score,
        snapshot.high_score,
        snapshot.elapsed.as_secs_f64()
    );
    print!("{}", snapshot.board.debug_string());
}

// =============================================================================
// Screens
// =============================================================================

fn run_solo(store: Store, input: &Receiver<String>) -> Result<(), Box<dyn Error>> {
    let mut solo = SoloGame::load(store)?;
    print_board("You", &solo.game().snapshot());

    while let Ok(line) = input.recv() {
        if is_quit(&line) {
            break;
        }
        for key in Key::parse_line(&line) {
            let _ = solo.handle_key(key);
        }
        print_board("You", &solo.game().snapshot());
    }

    solo.save()?;
    println!("   ✓ Game saved");
    Ok(())
}

fn run_host(config: TileBattleConfig, input: &Receiver<String>) -> Result<(), Box<dyn Error>> {
    let mut lobby = HostLobby::open(config)?;
    println!("🌐 Hosting on {}. Waiting for a guest...", lobby.local_addr());
    println!("   Type 'start' once they have joined.");

    let mut shown = String::new();
    loop {
        let frame_start = Instant::now();
        lobby.tick()?;

        let status = lobby.status().text();
        if status != shown {
            println!("   {status}");
            shown = status;
        }

        match next_line(input) {
            Ok(Some(line)) if is_quit(&line) => return Ok(()),
            Ok(Some(line)) if line.trim() == "start" => match lobby.start_match() {
                Ok(duel) => return run_duel(duel, input),
                Err(e) => println!("   ✗ Cannot start: {e}"),
            },
            Ok(_) => {}
            Err(()) => return Ok(()),
        }
        sleep_rest_of_frame(frame_start);
    }
}

fn run_join(
    config: TileBattleConfig,
    store: Store,
    host: Option<String>,
    input: &Receiver<String>,
) -> Result<(), Box<dyn Error>> {
    let mut lobby = JoinLobby::new(config, store);
    let mut target = host.or_else(|| lobby.last_host());
    if target.is_none() {
        println!("   Enter the host address:");
    }

    let mut shown = String::new();
    loop {
        let frame_start = Instant::now();

        if let Some(host) = target.take() {
            println!("🌐 Joining {host} ...");
            if let Err(e) = lobby.join(&host) {
                println!("   ✗ {e}. Enter another address to retry.");
            }
        }
        if let Some(duel) = lobby.tick() {
            return run_duel(duel, input);
        }

        let status = lobby.status().text();
        if status != shown {
            println!("   {status}");
            shown = status;
        }

        match next_line(input) {
            Ok(Some(line)) if is_quit(&line) => return Ok(()),
            Ok(Some(line)) if !line.trim().is_empty() && lobby.is_armed() => {
                target = Some(line.trim().to_string());
            }
            Ok(_) => {}
            Err(()) => return Ok(()),
        }
        sleep_rest_of_frame(frame_start);
    }
}

fn run_duel(mut duel: DuelMatch, input: &Receiver<String>) -> Result<(), Box<dyn Error>> {
    println!("⚔️  Match against {} started", duel.opponent());

    let mut last_frame = None;
    loop {
        let frame_start = Instant::now();

        match next_line(input) {
            Ok(Some(line)) if is_quit(&line) => break,
            Ok(Some(line)) => {
                for key in Key::parse_line(&line) {
                    let _ = duel.handle_key(key);
                }
            }
            Ok(None) => {}
            Err(()) => break,
        }

        duel.tick();
        let view = duel.view();
        let frame = (
            view.own.board.clone(),
            view.own.score,
            view.opponent.as_deref().map(|s| (s.board.clone(), s.score)),
            view.outcome,
            view.connected,
        );
        if last_frame.as_ref() != Some(&frame) {
            print_board("You", &view.own);
            match &view.opponent {
                Some(opponent) => print_board(&view.opponent_name, opponent),
                None => println!("── {} ── waiting for their board", view.opponent_name),
            }
            match view.outcome {
                MatchOutcome::Won => println!("🏆 You win! {} loses!", view.opponent_name),
                MatchOutcome::Lost => println!("💀 You lose! {} wins!", view.opponent_name),
                MatchOutcome::Playing => {}
            }
            if !view.connected {
                println!("   {} has left the game", view.opponent_name);
            }
            last_frame = Some(frame);
        }

        sleep_rest_of_frame(frame_start);
    }

    duel.leave();
    Ok(())
}

// =============================================================================
// Entry
// =============================================================================

fn run(options: Options) -> Result<(), Box<dyn Error>> {
    let mut config = TileBattleConfig::load_or_default(&options.config)?;
    if let Some(name) = options.name {
        config.player.username = name;
    }
    if let Mode::Host { port: Some(port) } = options.mode {
        config.network.port = port;
    }
    config.validate()?;

    let store = Store::open(&options.data)?;
    let input = spawn_stdin()?;

    match options.mode {
        Mode::Solo => run_solo(store, &input),
        Mode::Host { .. } => run_host(config, &input),
        Mode::Join { host } => run_join(config, store, host, &input),
    }
}

fn main() {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    TILEBATTLE v{}", env!("CARGO_PKG_VERSION"));
    println!("═══════════════════════════════════════════════════════════════════");

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(options) {
        eprintln!("   ✗ FATAL: {e}");
        std::process::exit(1);
    }
}
