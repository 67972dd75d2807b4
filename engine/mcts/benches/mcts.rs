//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Full MCTS search with varying iteration counts
//! - Rollout policy and heuristic combinations
//! - Tree operations (expansion, UCT selection, backpropagation)
//! - The linear rollout policy's per-step cost

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine_core::{Action, ForwardModel};
use games_bomberman::{BombermanConfig, BombermanState};
use mcts::{
    features, HeuristicKind, LinearRolloutPolicy, MctsConfig, MctsSearch, MctsTree, RolloutKind,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Opening position of a default four-agent game, seen by agent 0.
fn opening() -> BombermanState {
    BombermanState::new(BombermanConfig::default(), 42).observation_for(0)
}

/// A position some ticks into the game with a bomb on the board.
fn midgame() -> BombermanState {
    let mut state = BombermanState::new(BombermanConfig::default(), 42);
    state.next(&[Action::Bomb, Action::Stop, Action::Stop, Action::Stop]);
    state.next(&[Action::Down, Action::Up, Action::Left, Action::Down]);
    state.next(&[Action::Down, Action::Right, Action::Up, Action::Left]);
    state.observation_for(0)
}

// =============================================================================
// Full MCTS Search Benchmarks
// =============================================================================

fn bench_mcts_search_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_search_iterations");

    for iters in [50u32, 100, 200, 400] {
        group.throughput(Throughput::Elements(iters as u64));
        group.bench_with_input(BenchmarkId::new("bomberman", iters), &iters, |b, &iters| {
            let config = MctsConfig::default().with_iterations(iters);
            let state = opening();

            b.iter(|| {
                let mut search = MctsSearch::new(state.clone(), config.clone(), 42).unwrap();
                black_box(search.run())
            });
        });
    }

    group.finish();
}

fn bench_game_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_game_phases");
    let config = MctsConfig::default().with_iterations(200);

    for (name, state) in [("opening", opening()), ("midgame", midgame())] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut search = MctsSearch::new(state.clone(), config.clone(), 7).unwrap();
                black_box(search.run())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Configuration Comparison Benchmarks
// =============================================================================

fn bench_mcts_configs(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_configs");
    let state = opening();

    for rollout in [RolloutKind::Random, RolloutKind::SafeRandom, RolloutKind::Linear] {
        for heuristic in [HeuristicKind::WinLoss, HeuristicKind::BoardStats] {
            let id = format!("{rollout:?}/{heuristic:?}");
            let config = MctsConfig::default()
                .with_iterations(200)
                .with_rollout(rollout)
                .with_heuristic(heuristic);

            group.bench_function(id, |b| {
                b.iter(|| {
                    let mut search = MctsSearch::new(state.clone(), config.clone(), 3).unwrap();
                    black_box(search.run())
                });
            });
        }
    }

    group.finish();
}

// =============================================================================
// Tree Operation Benchmarks
// =============================================================================

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_tree_ops");

    group.bench_function("expand_100_nodes", |b| {
        b.iter(|| {
            let mut tree = MctsTree::new(6);
            let mut rng = ChaCha20Rng::seed_from_u64(0);
            let mut parent = tree.root();
            for _ in 0..100 {
                match tree.pick_unexpanded(parent, &mut rng) {
                    Some(action) => {
                        tree.add_child(parent, action);
                    }
                    None => parent = tree.get(parent).children[0],
                }
            }
            black_box(tree.len())
        });
    });

    group.bench_function("uct_select", |b| {
        let mut tree = MctsTree::new(6);
        for action in 0..6 {
            let child = tree.add_child(tree.root(), action);
            for v in 0..(action + 1) * 10 {
                tree.backpropagate(child, (v % 3) as f64 * 0.1 - 0.1);
            }
        }
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        b.iter(|| black_box(tree.uct_select(tree.root(), 2f64.sqrt(), 1e-6, &mut rng)));
    });

    group.bench_function("backpropagate_depth_10", |b| {
        b.iter_batched(
            || {
                let mut tree = MctsTree::new(6);
                let mut parent = tree.root();
                for i in 0..10 {
                    parent = tree.add_child(parent, i % 6);
                }
                (tree, parent)
            },
            |(mut tree, leaf)| {
                tree.backpropagate(leaf, 0.5);
                black_box(tree)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_linear_policy(c: &mut Criterion) {
    let policy = LinearRolloutPolicy::pretrained();
    let state = midgame();

    c.bench_function("linear_policy_step", |b| {
        b.iter(|| black_box(policy.best_slot(&features(&state, 0))));
    });
}

criterion_group!(
    benches,
    bench_mcts_search_iterations,
    bench_game_phases,
    bench_mcts_configs,
    bench_tree_operations,
    bench_linear_policy,
);

criterion_main!(benches);
