//! Path-query engine.

use std::ffi::{CStr, CString};

use tracing::{debug, trace};
use uast_tools::{Handle, NodeAccess, QueryEngine};

use crate::document::{DOCUMENT, Document, NodeRef};
use crate::error::XPathError;
use crate::eval::{self, Context, Value};
use crate::parser::parse_expression;

/// A [`QueryEngine`] for the XPath-flavoured query language.
///
/// Each call loads the tree into a [`Document`], evaluates the query from
/// the document node and keeps the matching elements' handles until the
/// next call.
#[derive(Debug, Default)]
pub struct XPathEngine {
    results: Vec<Handle>,
    last_error: Option<String>,
}

impl XPathEngine {
    /// Creates a new engine with no stored results.
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, doc: &Document, query: &str) -> Result<Vec<Handle>, XPathError> {
        let expr = parse_expression(query)?;
        trace!("Parsed query {:?} into {:?}", query, expr);

        let nodes = match eval::evaluate(&expr, &Context::root(doc))? {
            Value::NodeSet(nodes) => nodes,
            other => {
                return Err(XPathError::type_error(format!(
                    "query must select nodes, got a {}",
                    other.kind()
                )));
            }
        };

        let mut handles = Vec::with_capacity(nodes.len());
        for node in eval::document_order(nodes) {
            match node {
                NodeRef::Node(DOCUMENT) => {}
                NodeRef::Node(id) => handles.extend(doc.node(id).handle),
                NodeRef::Attribute(id, index) => {
                    return Err(XPathError::type_error(format!(
                        "query selected attribute '{}' of {}; only nodes can be returned",
                        doc.attribute(id, index).name,
                        doc.node(id).name
                    )));
                }
            }
        }
        Ok(handles)
    }
}

unsafe impl QueryEngine for XPathEngine {
    fn filter(&mut self, access: &NodeAccess<'_>, root: Handle, query: &CStr) -> bool {
        self.results.clear();
        self.last_error = None;

        let query = query.to_string_lossy();
        // SAFETY: `root` is the handle the bridge passed in with `access`.
        let doc = unsafe { Document::load(access, root) };
        debug!("Loaded {} nodes for query {:?}", doc.len() - 1, query);

        match self.run(&doc, &query) {
            Ok(handles) => {
                self.results = handles;
                true
            }
            Err(e) => {
                debug!("Query {:?} failed: {}", query, e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn result_count(&self) -> usize {
        self.results.len()
    }

    fn result_at(&self, index: usize) -> Option<Handle> {
        self.results.get(index).copied()
    }

    fn last_error(&mut self) -> Option<CString> {
        self.last_error
            .take()
            .and_then(|e| CString::new(e.replace('\0', "")).ok())
    }
}
