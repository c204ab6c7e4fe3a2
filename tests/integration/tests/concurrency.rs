//! Concurrent use of one bridge from many threads.

mod common;

use std::sync::Arc;
use std::thread;

use common::{init_tracing, python_module, tokens, wide_tree};
use pretty_assertions::assert_eq;
use uast_engine::{Walker, XPathEngine};
use uast_tools::{Bridge, BridgeConfig, TreeOrder};

#[test]
fn test_filters_and_iterators_on_disjoint_trees() {
    init_tracing();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || {
                let root = wide_tree(10 + t, 2);
                let expected = root.subtree_size();
                for _ in 0..20 {
                    let levels = uast_engine::filter(&root, "//Level").unwrap();
                    assert_eq!(levels.len(), 10 + t);

                    let mut iter = uast_engine::iterate(&root, TreeOrder::LevelOrder).unwrap();
                    assert_eq!(iter.nodes().count(), expected);
                    iter.dispose();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_shared_tree_across_threads() {
    let root = python_module();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let root = Arc::clone(&root);
            thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..50 {
                    let nums = uast_engine::filter(&root, "//Num").unwrap();
                    seen.push(tokens(&nums).join(","));
                }
                seen
            })
        })
        .collect();

    for handle in handles {
        let seen = handle.join().unwrap();
        assert!(seen.iter().all(|s| s == "1,2"));
    }
}

#[test]
fn test_iteration_interleaves_with_filtering() {
    let config: BridgeConfig = serde_json::from_str(r#"{"arena_capacity": 256}"#).unwrap();
    let bridge = Bridge::with_config(XPathEngine::new(), Walker::new(), config);
    let root = python_module();

    let mut iter = bridge.iterate(&root, TreeOrder::PreOrder).unwrap();
    let mut visited = 0;
    while let Some(node) = iter.next().unwrap() {
        // A query in the middle of a traversal uses the other lock.
        let query = format!("//{}", node.internal_type);
        let matches = bridge.filter(&root, &query).unwrap();
        assert!(matches.iter().any(|m| Arc::ptr_eq(m, &node)));
        visited += 1;
    }
    iter.dispose();

    assert_eq!(visited, 14);
    assert_eq!(bridge.config().arena_capacity, 256);
}

#[test]
fn test_dedicated_bridge_in_scoped_threads() {
    let bridge = Bridge::new(XPathEngine::new(), Walker::new());
    let root = python_module();

    thread::scope(|s| {
        for order in [TreeOrder::PreOrder, TreeOrder::PostOrder, TreeOrder::LevelOrder] {
            let bridge = &bridge;
            let root = &root;
            s.spawn(move || {
                let mut iter = bridge.iterate(root, order).unwrap();
                assert_eq!(iter.nodes().count(), 14);
            });
        }
        s.spawn(|| {
            let calls = bridge.filter(&root, "//Call").unwrap();
            assert_eq!(calls.len(), 1);
        });
    });
}
