//! Integration tests for path-query filtering through the shared bridge.

mod common;

use std::sync::Arc;

use common::{init_tracing, python_module, tokens, types};
use pretty_assertions::assert_eq;
use rstest::rstest;
use uast_node::Node;
use uast_tools::ToolsError;

#[rstest]
#[case("//Identifier", vec!["Identifier"; 4])]
#[case("/Module/*", vec!["Import", "FunctionDef", "Expr"])]
#[case("//FunctionDef/Arguments/Identifier", vec!["Identifier", "Identifier"])]
#[case("//Return//Identifier/..", vec!["BinOp"])]
#[case("//Num/ancestor::*", vec!["Module", "Expr", "Call"])]
#[case("//Import | //Num", vec!["Import", "Num", "Num"])]
#[case("//Lambda", vec![])]
fn test_filter_paths(#[case] query: &str, #[case] expected: Vec<&str>) {
    init_tracing();
    let root = python_module();

    let result = uast_engine::filter(&root, query).unwrap();

    assert_eq!(types(&result), expected);
}

#[rstest]
#[case("//*[@token = 'add']", vec!["add", "add"])]
#[case("//Call[@token = 'add']/Num", vec!["1", "2"])]
#[case("//Num[@token > 1]", vec!["2"])]
#[case("//*[@role = 5]", vec!["a", "b"])]
#[case("//Identifier[not(@role)]", vec!["a", "b"])]
#[case("//*[@async = 'false' and @startLine = 3]", vec!["add"])]
#[case("//*[count(Identifier) = 2]", vec!["", "+"])]
#[case("//Arguments/Identifier[last()]", vec!["b"])]
fn test_filter_predicates(#[case] query: &str, #[case] expected: Vec<&str>) {
    init_tracing();
    let root = python_module();

    let result = uast_engine::filter(&root, query).unwrap();

    assert_eq!(tokens(&result), expected);
}

#[test]
fn test_empty_query_returns_nothing() {
    let root = python_module();
    assert!(uast_engine::filter(&root, "").unwrap().is_empty());
}

#[test]
fn test_results_are_identical_to_tree_nodes() {
    let root = python_module();

    let result = uast_engine::filter(&root, "//Import").unwrap();

    assert!(Arc::ptr_eq(&result[0], &root.children[0]));
}

#[test]
fn test_results_survive_dropping_the_tree() {
    let root = python_module();
    let result = uast_engine::filter(&root, "//Call").unwrap();
    drop(root);

    let call = &result[0];
    assert_eq!(call.children.len(), 2);
    assert_eq!(call.children[1].token, "2");
}

#[test]
fn test_properties_are_seen_in_key_order() {
    let root = Node::new("N")
        .with_property("b", "2")
        .with_property("a", "1")
        .into_shared();

    // Attribute order is the bridge's key order, repeatable within a query.
    let result = uast_engine::filter(
        &root,
        "/N[name(@*[1]) = 'a' and @*[1] = '1' and name(@*[2]) = 'b' and name(@*[1]) = 'a']",
    )
    .unwrap();

    assert_eq!(result.len(), 1);
}

#[test]
fn test_positions_are_exposed_as_attributes() {
    let root = python_module();

    let module = uast_engine::filter(&root, "/Module[@startOffset = 0 and @endLine = 6]").unwrap();
    assert_eq!(module.len(), 1);

    let without = uast_engine::filter(&root, "//*[not(@startOffset)]").unwrap();
    assert_eq!(without.len(), 12);
}

#[rstest]
#[case("//Identifier[")]
#[case("count(//Num)")]
#[case("//Num/@token")]
#[case("//*[unknown-function()]")]
fn test_invalid_queries_fail_with_query_error(#[case] query: &str) {
    init_tracing();
    let root = python_module();

    let err = uast_engine::filter(&root, query).unwrap_err();

    assert!(matches!(err, ToolsError::Query(ref message) if !message.is_empty()));
}

#[test]
fn test_error_message_is_the_engine_message() {
    let root = python_module();

    let err = uast_engine::filter(&root, "//*[nope()]").unwrap_err();

    assert_eq!(err.to_string(), "Query failed: Unknown function 'nope'");
}
