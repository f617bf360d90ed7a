//! Per-document parse context
//!
//! One `ParseContext` is created per document import and passed by mutable
//! reference into every section parser invocation. It is the only channel
//! for cross-parser state; there is no global mutable state.

use diesel::sqlite::SqliteConnection;

use crate::types::ImportError;

/// Free-text status callback supplied by the caller.
pub type ProgressFn<'a> = dyn Fn(&str) + Send + Sync + 'a;

/// Identity of the section currently being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCursor {
    pub section_id: i32,
    pub section_guid: String,
    pub section_code: String,
}

/// Identity of the product currently being processed, used for status and
/// log messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCursor {
    pub item_code: String,
    pub product_name: Option<String>,
}

pub struct ParseContext<'a> {
    /// Connection for this document's parse. Not shared between concurrent
    /// parser invocations; parallel imports each get their own context and
    /// pooled connection.
    pub conn: &'a mut SqliteConnection,
    pub file_name: String,
    pub document_id: i32,
    pub current_section: Option<SectionCursor>,
    pub current_product: Option<ProductCursor>,
    pub progress: Option<&'a ProgressFn<'a>>,
}

impl<'a> ParseContext<'a> {
    pub fn new(conn: &'a mut SqliteConnection, file_name: impl Into<String>, document_id: i32) -> Self {
        ParseContext {
            conn,
            file_name: file_name.into(),
            document_id,
            current_section: None,
            current_product: None,
            progress: None,
        }
    }

    pub fn with_section(mut self, cursor: SectionCursor) -> Self {
        self.current_section = Some(cursor);
        self
    }

    pub fn with_product(mut self, cursor: ProductCursor) -> Self {
        self.current_product = Some(cursor);
        self
    }

    pub fn with_progress(mut self, progress: &'a ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The current section, or the structural error that aborts the subtree.
    pub fn require_section(&self) -> Result<SectionCursor, ImportError> {
        self.current_section
            .clone()
            .ok_or(ImportError::MissingContext("current section"))
    }

    /// Forward a status string to the optional progress callback and mirror
    /// it on the debug log.
    pub fn report_progress(&self, msg: &str) {
        tracing::debug!("{}: {}", self.file_name, msg);
        if let Some(progress) = self.progress {
            progress(msg);
        }
    }
}
