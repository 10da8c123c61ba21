use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use tui_nodeview::{SampleTreeConfig, TreeArena, TreeListState, populate_sample_tree};

fn big_arena() -> TreeArena {
    let mut arena = TreeArena::new();
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let config = SampleTreeConfig {
        depth: 6,
        root_width: 64,
        branch_probability: 0.6,
        max_children: 8,
    };
    populate_sample_tree(&mut arena, 0, &mut rng, &config).unwrap();
    arena
}

fn bench_rebuild_collapsed(c: &mut Criterion) {
    let arena = big_arena();
    let mut state = TreeListState::with_capacity(arena.len());
    state.reset(&arena);

    c.bench_function("rebuild_collapsed", |b| {
        b.iter(|| {
            state.invalidate();
            state.ensure_projection(black_box(&arena));
        });
    });
}

fn bench_rebuild_fully_expanded(c: &mut Criterion) {
    let arena = big_arena();
    let mut state = TreeListState::with_capacity(arena.len());
    state.reset(&arena);
    state.expand_all(&arena);

    c.bench_function("rebuild_fully_expanded", |b| {
        b.iter(|| {
            state.invalidate();
            state.ensure_projection(black_box(&arena));
        });
    });
}

fn bench_toggle_root(c: &mut Criterion) {
    let arena = big_arena();
    let mut state = TreeListState::with_capacity(arena.len());
    state.reset(&arena);
    let root = arena.child(0, None, 0).unwrap();

    c.bench_function("toggle_first_root", |b| {
        b.iter(|| {
            state.toggle(&arena, black_box(root)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_rebuild_collapsed,
    bench_rebuild_fully_expanded,
    bench_toggle_root
);
criterion_main!(benches);
