// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Filter compilation error type
#[derive(Error, Debug, Diagnostic)]
pub enum FilterError {
    /// The expression does not match the filter grammar
    #[error("Syntax error in filter: {message}")]
    #[diagnostic(
        code(query::syntax_error),
        help("Filters look like: cpu >= 4 & (mem < 16 | name ~= 'n2-.*')")
    )]
    SyntaxError {
        message: String,
        #[source_code]
        expression: String,
        #[label("{message}")]
        span: SourceSpan,
    },
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    /// Create a SyntaxError pointing at `len` bytes from `offset` in `expression`
    pub fn syntax_error(
        message: impl Into<String>,
        expression: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        Self::SyntaxError {
            message: message.into(),
            expression: expression.into(),
            span: (offset, len).into(),
        }
    }

    /// Byte offset of the offending input
    pub fn offset(&self) -> usize {
        match self {
            Self::SyntaxError { span, .. } => span.offset(),
        }
    }
}
