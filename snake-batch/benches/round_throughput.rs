use criterion::{black_box, criterion_group, criterion_main, Criterion};
use snake_batch::BatchEnv;
use snake_config::BatchConfig;

fn bench_rounds(c: &mut Criterion) {
    let mut env = BatchEnv::new(BatchConfig::new(4, 64, 2).with_seed(42)).expect("batch env init");
    let mut turn = 0_u8;
    c.bench_function("round throughput / 64 slots, 2 models", |b| {
        b.iter(|| {
            turn = turn.wrapping_add(1);
            for model in 0..env.num_models() {
                env.actions_mut(model)
                    .expect("model in range")
                    .fill(turn % 4);
            }
            env.step().expect("step");
            black_box(env.infos()[0])
        });
    });
}

criterion_group!(benches, bench_rounds);
criterion_main!(benches);
