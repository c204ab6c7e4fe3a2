//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use uast_node::Node;

/// Routes engine logs to the test output. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Loads a tree from a JSON fixture.
pub fn load_fixture(name: &str) -> Arc<Node> {
    let path = fixtures_dir().join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    let node: Node = serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
    node.into_shared()
}

pub fn python_module() -> Arc<Node> {
    load_fixture("python_module.json")
}

pub fn types(nodes: &[Arc<Node>]) -> Vec<&str> {
    nodes.iter().map(|n| n.internal_type.as_str()).collect()
}

pub fn tokens(nodes: &[Arc<Node>]) -> Vec<&str> {
    nodes.iter().map(|n| n.token.as_str()).collect()
}

/// A chain of `depth` nodes, each with `width` leaf siblings.
pub fn wide_tree(depth: usize, width: usize) -> Arc<Node> {
    let mut node = Node::new("Leaf");
    for level in 0..depth {
        let mut parent = Node::new("Level").with_token(level.to_string());
        for i in 0..width {
            parent = parent.with_child(Node::new("Leaf").with_token(i.to_string()));
        }
        node = parent.with_child(node);
    }
    node.into_shared()
}
