use crate::document::Document;

/// A code value: source text, optionally paired with the document of
/// bindings it captured.
///
/// Without a scope (or with an empty one) this encodes as a plain code
/// string; with a non-empty scope it encodes as the combined
/// code-with-scope form carrying its own total length.
#[derive(Clone, Debug, PartialEq)]
pub struct Code {
    pub code: String,
    pub scope: Option<Document>,
}

impl Code {
    /// Code with no captured scope.
    pub fn new(code: impl Into<String>) -> Code {
        Code {
            code: code.into(),
            scope: None,
        }
    }

    /// Code carrying a captured scope document.
    pub fn with_scope(code: impl Into<String>, scope: Document) -> Code {
        Code {
            code: code.into(),
            scope: Some(scope),
        }
    }

    /// True when this value takes the combined code-with-scope wire form.
    pub(crate) fn has_wire_scope(&self) -> bool {
        matches!(&self.scope, Some(s) if !s.is_empty())
    }
}
