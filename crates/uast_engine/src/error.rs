//! Error types for query evaluation.

use thiserror::Error;

/// Errors raised while parsing or evaluating a path query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XPathError {
    #[error("XPath parse error in '{0}': {1}")]
    Parse(String, String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Type error: {0}")]
    Type(String),
}

impl XPathError {
    pub fn parse(query: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Parse(query.into(), detail.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::Type(msg.into())
    }
}
