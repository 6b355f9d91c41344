//! Duel match behaviour over an in-process link.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::SeedableRng;
use tilebattle::core::{Board, Direction, Game, GameRng, Grid, GRID_SIZE};
use tilebattle::networking::{local, PeerSync, Role, SyncConfig};
use tilebattle::{DuelMatch, Key, MatchOutcome};

fn sync_with(role: Role, link: tilebattle::networking::Link, game: Game, name: &str) -> Arc<PeerSync> {
    let config = SyncConfig {
        username: name.into(),
        ..SyncConfig::default()
    };
    Arc::new(PeerSync::new(role, link, Arc::new(Mutex::new(game)), config))
}

fn game_with(values: [[u32; GRID_SIZE]; GRID_SIZE]) -> Game {
    let mut rng = GameRng::seed_from_u64(9);
    let board = Board::from_values(values, &mut rng);
    Game::from_grid(Grid::from_board(board, rng))
}

/// Introduces both sides and enters the match screen on each.
fn duel_between(host_game: Game, guest_game: Game, capacity: usize) -> (DuelMatch, DuelMatch) {
    let (a, b) = local::pair();
    let host = sync_with(Role::Host, a, host_game, "alice");
    let guest = sync_with(Role::Guest, b, guest_game, "bob");

    host.connected().unwrap();
    guest.connected().unwrap();
    while host.poll() + guest.poll() > 0 {}

    (
        DuelMatch::with_capacity(host, None, capacity),
        DuelMatch::with_capacity(guest, None, capacity),
    )
}

fn duel() -> (DuelMatch, DuelMatch) {
    duel_between(Game::new(1), Game::new(2), 100)
}

fn settle(a: &mut DuelMatch, b: &mut DuelMatch) {
    for _ in 0..8 {
        a.tick();
        b.tick();
    }
}

fn own_board(duel: &DuelMatch) -> Board {
    duel.game().lock().grid().board()
}

fn mirrored_board(duel: &DuelMatch) -> Option<Board> {
    duel.view().opponent.map(|snapshot| snapshot.board.clone())
}

#[test]
fn test_entering_exchanges_boards() {
    let (mut host, mut guest) = duel();
    settle(&mut host, &mut guest);

    assert_eq!(host.opponent(), "bob");
    assert_eq!(guest.opponent(), "alice");
    assert_eq!(mirrored_board(&host), Some(own_board(&guest)));
    assert_eq!(mirrored_board(&guest), Some(own_board(&host)));
    assert!(host.game().lock().timer().is_running());
}

#[test]
fn test_one_move_per_tick() {
    let (mut host, mut guest) = duel();
    settle(&mut host, &mut guest);

    for key in [Key::Left, Key::Up, Key::Right] {
        assert!(host.handle_key(key));
    }
    assert_eq!(host.queued_moves(), 3);

    host.tick();
    assert_eq!(host.queued_moves(), 2);
    assert_eq!(host.game().lock().grid().last_move(), Some(Direction::Left));

    settle(&mut host, &mut guest);
    assert_eq!(host.queued_moves(), 0);
    assert_eq!(host.game().lock().grid().last_move(), Some(Direction::Right));
    assert_eq!(mirrored_board(&guest), Some(own_board(&host)));
    assert_eq!(
        guest.view().opponent.map(|s| s.score),
        Some(host.game().lock().score())
    );
}

#[test]
fn test_full_queue_drops_moves() {
    let (host, _guest) = duel_between(Game::new(3), Game::new(4), 2);

    assert!(host.queue_move(Direction::Up));
    assert!(host.queue_move(Direction::Down));
    assert!(!host.queue_move(Direction::Left));
    assert_eq!(host.queued_moves(), 2);
}

#[test]
fn test_opponent_reaching_win_tile_loses_match() {
    let mut winning = [[0; GRID_SIZE]; GRID_SIZE];
    winning[0][0] = 2048;
    let (mut host, mut guest) = duel_between(game_with(winning), Game::new(5), 100);
    settle(&mut host, &mut guest);

    assert_eq!(host.outcome(), MatchOutcome::Won);
    assert_eq!(guest.outcome(), MatchOutcome::Lost);
    assert!(!host.game().lock().timer().is_running());
    assert!(!guest.game().lock().timer().is_running());

    // Late key presses are discarded once the match is decided
    let before = own_board(&guest);
    assert!(guest.queue_move(Direction::Left));
    assert!(guest.queue_move(Direction::Right));
    guest.tick();
    assert_eq!(own_board(&guest), before);
    assert_eq!(guest.queued_moves(), 0);
}

#[test]
fn test_gridlocked_opponent_wins_match() {
    let gridlocked = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
    let (mut host, mut guest) = duel_between(Game::new(6), game_with(gridlocked), 100);
    settle(&mut host, &mut guest);

    assert_eq!(host.outcome(), MatchOutcome::Won);
    assert_eq!(guest.outcome(), MatchOutcome::Lost);
    assert_eq!(guest.view().outcome, MatchOutcome::Lost);
}

#[test]
fn test_reset_keeps_timer_and_reaches_opponent() {
    let (mut host, mut guest) = duel();
    settle(&mut host, &mut guest);
    for _ in 0..10 {
        for direction in Direction::ALL {
            host.queue_move(direction);
            host.tick();
        }
    }
    settle(&mut host, &mut guest);

    host.handle_key(Key::Reset);
    assert_eq!(host.game().lock().score(), 0);
    assert_eq!(host.game().lock().grid().num_tiles(), 2);
    assert!(host.game().lock().timer().is_running());

    settle(&mut host, &mut guest);
    assert_eq!(mirrored_board(&guest), Some(own_board(&host)));
    assert_eq!(guest.view().opponent.map(|s| s.score), Some(0));
}

#[test]
fn test_leaving_disconnects_opponent() {
    let (mut host, mut guest) = duel();
    settle(&mut host, &mut guest);

    host.leave();
    guest.tick();

    assert!(!guest.view().connected);
    assert!(!host.game().lock().timer().is_running());
    // Moves still apply locally with nobody to send them to
    guest.queue_move(Direction::Up);
    guest.tick();
    assert_eq!(guest.queued_moves(), 0);
}
