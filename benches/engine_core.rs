use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use blockfall::types::{FIELD_WIDTH, TOTAL_ROWS};
use blockfall::{GameStatus, PieceBag, PieceKind, Session};

fn playing_session(seed: u32) -> Session {
    let mut session = Session::new(seed);
    session.transition(GameStatus::Playing);
    session
}

fn seed_for(kind: PieceKind) -> u32 {
    (1..)
        .find(|&seed| PieceBag::new(seed).draw() == kind)
        .unwrap()
}

fn bench_tick(c: &mut Criterion) {
    c.bench_function("progress_100_ticks", |b| {
        b.iter_batched(
            || playing_session(1),
            |mut session| {
                for _ in 0..100 {
                    session.progress();
                }
                black_box(session.score())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_hard_drop(c: &mut Criterion) {
    c.bench_function("hard_drop_and_spawn", |b| {
        b.iter_batched(
            || playing_session(2),
            |mut session| {
                session.hard_drop();
                black_box(session.score())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_line_clear(c: &mut Criterion) {
    let seed = seed_for(PieceKind::I);
    c.bench_function("hard_drop_clearing_four_rows", |b| {
        b.iter_batched(
            || {
                let mut session = playing_session(seed);
                let bottom = TOTAL_ROWS as i8 - 1;
                for r in 0..4 {
                    for x in 0..FIELD_WIDTH as i8 {
                        if x != 4 {
                            session.field_mut().set_cell(x, bottom - r, 1);
                        }
                    }
                }
                session
            },
            |mut session| {
                session.hard_drop();
                black_box(session.score())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_display(c: &mut Criterion) {
    let session = playing_session(3);
    c.bench_function("display_matrix", |b| {
        b.iter(|| black_box(session.display_matrix()))
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_hard_drop,
    bench_line_clear,
    bench_display
);
criterion_main!(benches);
