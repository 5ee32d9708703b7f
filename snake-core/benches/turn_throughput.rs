use criterion::{black_box, criterion_group, criterion_main, Criterion};
use snake_core::GameInstance;
use snake_types::{InstanceId, Move};

fn play_turns(game: &mut GameInstance, turns: u32) -> u32 {
    for turn in 0..turns {
        if game.is_over() {
            break;
        }
        let mv = Move::ALL[(turn as usize / 3) % Move::ALL.len()];
        for id in game.player_ids() {
            let _ = game.set_move(id, mv);
        }
        if game.step().is_err() {
            break;
        }
    }
    game.turn()
}

fn bench_turns(c: &mut Criterion) {
    c.bench_function("turn throughput / 19x19, 4 players, 8 food", |b| {
        b.iter_batched(
            || GameInstance::new(InstanceId(1), 19, 19, 4, 8, 42),
            |mut game| black_box(play_turns(&mut game, 200)),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_turns);
criterion_main!(benches);
