//! Benchmark for the grid engine.
//!
//! TARGET: a full move (slide + spawn) well under a microsecond budget per
//! frame, so the update tick never stalls on game logic.
//!
//! Run with: cargo bench --package tilebattle_core --bench grid_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::SeedableRng;
use tilebattle_core::{Board, Direction, Game, GameRng};

fn busy_board(rng: &mut GameRng) -> Board {
    Board::from_values(
        [[2, 2, 4, 8], [4, 0, 4, 16], [0, 8, 8, 2], [2, 2, 2, 2]],
        rng,
    )
}

fn benchmark_slide(c: &mut Criterion) {
    let mut rng = GameRng::seed_from_u64(1);
    let board = busy_board(&mut rng);

    let mut group = c.benchmark_group("slide");
    group.throughput(Throughput::Elements(1));
    for direction in Direction::ALL {
        group.bench_function(direction.to_string(), |b| {
            b.iter(|| {
                let mut board = board.clone();
                black_box(board.slide(black_box(direction), &mut rng))
            });
        });
    }
    group.finish();
}

fn benchmark_full_game(c: &mut Criterion) {
    c.bench_function("play_until_outcome", |b| {
        b.iter(|| {
            let mut game = Game::new(black_box(7));
            let mut i = 0;
            while game.outcome() == tilebattle_core::Outcome::None {
                game.execute_move(Direction::ALL[i % 4]);
                i += 1;
            }
            black_box(game.score())
        });
    });
}

fn benchmark_snapshot(c: &mut Criterion) {
    let game = Game::new(3);
    c.bench_function("snapshot", |b| b.iter(|| black_box(game.snapshot())));
}

criterion_group!(benches, benchmark_slide, benchmark_full_game, benchmark_snapshot);
criterion_main!(benches);
