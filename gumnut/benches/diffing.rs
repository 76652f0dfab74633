use divan::{Bencher, black_box};
use gumnut::indextree::NodeId;
use gumnut::{Diff, LabeledTree, MatchingConfig, Tree};

fn main() {
    divan::main();
}

const KINDS: [&str; 5] = ["block", "call", "ident", "literal", "stmt"];

/// Deterministic pseudo-random tree; every `edit_every`th value is changed
/// when `edited` is set.
fn generate(size: usize, edited: bool) -> LabeledTree<&'static str> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) as usize
    };

    let mut tree = LabeledTree::new("module", "");
    let mut ids: Vec<NodeId> = vec![tree.root];
    for i in 1..size {
        // bias towards recent nodes so the tree gets some depth
        let window = ids.len().min(16);
        let parent = ids[ids.len() - 1 - next() % window];
        let kind = KINDS[next() % KINDS.len()];
        let value = if edited && i % 50 == 0 {
            format!("v{i}'")
        } else {
            format!("v{i}")
        };
        ids.push(tree.add_child(parent, kind, value));
    }
    tree
}

fn pair(size: usize) -> (Tree<gumnut::NodeLabel<&'static str>>, Tree<gumnut::NodeLabel<&'static str>>) {
    (generate(size, false).build(), generate(size, true).build())
}

#[divan::bench(args = [100, 1_000, 5_000])]
fn build(bencher: Bencher, size: usize) {
    let source = generate(size, false);
    bencher.bench_local(|| black_box(source.build()));
}

#[divan::bench(args = [100, 1_000, 5_000])]
fn mapping(bencher: Bencher, size: usize) {
    let (src, dst) = pair(size);
    bencher
        .with_inputs(|| Diff::new(src.clone(), dst.clone()))
        .bench_local_values(|mut diff| black_box(diff.mapping().len()));
}

#[divan::bench(args = [100, 1_000, 5_000])]
fn full_diff(bencher: Bencher, size: usize) {
    let (src, dst) = pair(size);
    bencher
        .with_inputs(|| (src.clone(), dst.clone()))
        .bench_local_values(|(src, dst)| {
            let report = gumnut::diff_trees(src, dst, &MatchingConfig::default()).unwrap();
            black_box(report)
        });
}

#[divan::bench]
fn diff_all_parallel(bencher: Bencher) {
    let pairs: Vec<_> = (0..32).map(|_| pair(500)).collect();
    bencher.with_inputs(|| pairs.clone()).bench_local_values(|pairs| {
        let reports = gumnut::diff_all(
            pairs,
            &MatchingConfig::default(),
            &gumnut::DefaultComparator,
        )
        .unwrap();
        black_box(reports)
    });
}
