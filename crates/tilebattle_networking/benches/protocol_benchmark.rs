//! Benchmark for message encoding.
//!
//! A snapshot is broadcast after every local move, so encoding and decoding
//! one must stay far below a frame.
//!
//! Run with: cargo bench --package tilebattle_networking --bench protocol_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tilebattle_core::{Direction, Game};
use tilebattle_networking::{GameData, Packet, Payload};

fn sample_game_data() -> GameData {
    let mut game = Game::new(42);
    for i in 0..40 {
        game.execute_move(Direction::ALL[i % 4]);
    }
    GameData { game: game.snapshot() }
}

fn benchmark_game_data(c: &mut Criterion) {
    let data = sample_game_data();
    let bytes = data.serialise().unwrap();

    let mut group = c.benchmark_group("game_data");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("serialise", |b| b.iter(|| black_box(data.serialise())));
    group.bench_function("decode", |b| b.iter(|| black_box(Packet::decode(black_box(&bytes)))));
    group.finish();
}

criterion_group!(benches, benchmark_game_data);
criterion_main!(benches);
