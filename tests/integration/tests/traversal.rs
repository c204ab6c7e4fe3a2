//! Integration tests for incremental traversal through the shared bridge.

mod common;

use std::sync::Arc;

use common::{init_tracing, python_module, types, wide_tree};
use pretty_assertions::assert_eq;
use rstest::rstest;
use uast_tools::{IteratorState, ToolsError, TreeOrder};

#[rstest]
#[case::pre_order(
    TreeOrder::PreOrder,
    vec![
        "Module", "Import", "FunctionDef", "Arguments", "Identifier", "Identifier", "Return",
        "BinOp", "Identifier", "Identifier", "Expr", "Call", "Num", "Num",
    ]
)]
#[case::post_order(
    TreeOrder::PostOrder,
    vec![
        "Import", "Identifier", "Identifier", "Arguments", "Identifier", "Identifier", "BinOp",
        "Return", "FunctionDef", "Num", "Num", "Call", "Expr", "Module",
    ]
)]
#[case::level_order(
    TreeOrder::LevelOrder,
    vec![
        "Module", "Import", "FunctionDef", "Expr", "Arguments", "Return", "Call", "Identifier",
        "Identifier", "BinOp", "Num", "Num", "Identifier", "Identifier",
    ]
)]
fn test_traversal_orders(#[case] order: TreeOrder, #[case] expected: Vec<&str>) {
    init_tracing();
    let root = python_module();
    let mut iter = uast_engine::iterate(&root, order).unwrap();

    let nodes: Vec<_> = iter.nodes().collect();
    iter.dispose();

    assert_eq!(types(&nodes), expected);
}

#[rstest]
#[case(TreeOrder::PreOrder)]
#[case(TreeOrder::PostOrder)]
#[case(TreeOrder::LevelOrder)]
fn test_n_nodes_then_end_then_state_error(#[case] order: TreeOrder) {
    let root = wide_tree(5, 3);
    let total = root.subtree_size();
    assert_eq!(total, 21);

    let mut iter = uast_engine::iterate(&root, order).unwrap();
    for _ in 0..total {
        assert!(iter.next().unwrap().is_some());
    }
    assert!(iter.next().unwrap().is_none());
    assert_eq!(iter.state(), IteratorState::Finished);
    assert!(matches!(iter.next(), Err(ToolsError::State(_))));

    iter.dispose();
    iter.dispose();
    assert_eq!(iter.state(), IteratorState::Disposed);
}

#[test]
fn test_streamed_nodes_are_the_tree_nodes() {
    let root = python_module();
    let mut iter = uast_engine::iterate(&root, TreeOrder::PreOrder).unwrap();

    let nodes: Vec<_> = iter.nodes().collect();

    assert!(Arc::ptr_eq(&nodes[0], &root));
    assert!(Arc::ptr_eq(&nodes[1], &root.children[0]));
    assert!(Arc::ptr_eq(&nodes[13], &root.children[2].children[0].children[1]));
}

#[test]
fn test_iterator_outlives_caller_reference() {
    let root = python_module();
    let mut iter = uast_engine::iterate(&root, TreeOrder::LevelOrder).unwrap();
    drop(root);

    let count = iter.nodes().count();

    assert_eq!(count, 14);
    assert_eq!(iter.root().internal_type, "Module");
}

#[test]
fn test_partial_traversal_then_dispose() {
    let root = python_module();
    let mut iter = uast_engine::iterate(&root, TreeOrder::PreOrder).unwrap();

    let first_three: Vec<_> = iter.nodes().take(3).collect();
    iter.dispose();

    assert_eq!(types(&first_three), vec!["Module", "Import", "FunctionDef"]);
    assert!(matches!(iter.next(), Err(ToolsError::State(_))));
}

#[test]
fn test_unsupported_order_is_iterator_error() {
    let root = python_module();

    let err = uast_engine::bridge().iterate_raw(&root, 99).err().unwrap();

    assert_eq!(err.to_string(), "Iterator creation failed: unsupported traversal order 99");
}

#[test]
fn test_filter_result_can_be_traversed() {
    let root = python_module();
    let functions = uast_engine::filter(&root, "//FunctionDef").unwrap();

    let mut iter = uast_engine::iterate(&functions[0], TreeOrder::PostOrder).unwrap();
    let last = iter.nodes().last().unwrap();

    assert!(Arc::ptr_eq(&last, &functions[0]));
}
