//! Benchmarks for the control-loop hot path: attribute reads and writes on a team of
//! eleven players, alone and under contention from a radio writer thread.
//!
//! Run with: cargo bench --bench team_state

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fieldstate::__internal::{decode_message, encode_message, RadioMessage};
use fieldstate::{PlayerId, Position, RadioCommand, TeamState};
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const SQUAD: u8 = 11;

fn squad() -> TeamState {
    let team = TeamState::new(1, "Blue");
    for id in 0..SQUAD {
        team.add_player(PlayerId::new(id));
    }
    team
}

fn bench_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("TeamState reads");
    let team = squad();

    group.bench_function("position", |b| {
        b.iter(|| team.position(black_box(PlayerId::new(5))));
    });

    group.bench_function("battery_charge", |b| {
        b.iter(|| team.battery_charge(black_box(PlayerId::new(5))));
    });

    group.bench_function("players", |b| {
        b.iter(|| black_box(team.players()));
    });

    group.bench_function("full control-loop frame", |b| {
        b.iter(|| {
            for id in team.players() {
                black_box(team.position(id));
                black_box(team.velocity(id));
                black_box(team.ball_possession(id));
            }
        });
    });

    group.finish();
}

fn bench_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("TeamState writes");
    let team = squad();

    group.bench_function("set_position", |b| {
        b.iter(|| team.set_position(PlayerId::new(5), black_box(Position::new(1.0, 2.0))));
    });

    group.bench_function("add_player (reset)", |b| {
        b.iter(|| team.add_player(black_box(PlayerId::new(5))));
    });

    group.finish();
}

/// Position reads while another thread hammers battery writes. Separate category locks
/// should keep this close to the uncontended read.
fn bench_contended_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("TeamState contended");

    for contended in [false, true] {
        let team = Arc::new(squad());
        let stop = Arc::new(AtomicBool::new(false));
        let writer = contended.then(|| {
            let team = Arc::clone(&team);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut charge = 0u8;
                while !stop.load(Ordering::Relaxed) {
                    team.set_player_battery_charge(PlayerId::new(5), charge);
                    charge = charge.wrapping_add(1);
                }
            })
        });

        group.bench_with_input(
            BenchmarkId::new("position", if contended { "battery writer" } else { "idle" }),
            &team,
            |b, team| b.iter(|| team.position(black_box(PlayerId::new(5)))),
        );

        stop.store(true, Ordering::Relaxed);
        if let Some(writer) = writer {
            let _ = writer.join();
        }
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("Radio codec");
    let message = RadioMessage::command(RadioCommand::BatteryCharge {
        team: 1,
        player: PlayerId::new(5),
        charge: 200,
    });
    let Ok(bytes) = encode_message(&message) else {
        return;
    };

    group.bench_function("encode command", |b| {
        b.iter(|| encode_message(black_box(&message)));
    });

    group.bench_function("decode command", |b| {
        b.iter(|| decode_message(black_box(&bytes)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_reads,
    bench_writes,
    bench_contended_reads,
    bench_codec
);
criterion_main!(benches);
