//! # pagemd
//!
//! Convert a rendered web page into clean Markdown for language models.
//!
//! The transformer is a pure function of `(html, base_url, options)`. It runs a
//! fixed pipeline over a parsed document arena:
//!
//! 1. parse the HTML into a [`Document`]
//! 2. optionally scope the document to `include_tags`
//! 3. strip configured tags (`script` and `style` always)
//! 4. rewrite `<img>` elements into `![alt](absolute-url)` tokens
//! 5. rewrite `<a href>` elements into `[text](absolute-url)` tokens
//! 6. serialize the body (or the whole document) to Markdown
//! 7. collapse blank-line runs and trim the result
//!
//! Failures on a single element never abort the run; they are collected as
//! [`Diagnostic`]s and logged through `tracing`.
//!
//! ## Example
//!
//! ```rust
//! use pagemd::{transform, TransformOptions};
//!
//! let html = r#"<html><body><script>x()</script>
//!     <p>Hello <a href="/p">world</a></p><img src="a.gif" alt="g"></body></html>"#;
//!
//! let markdown = transform(html, "https://ex.com/", &TransformOptions::default()).unwrap();
//! assert_eq!(markdown, "Hello [world](https://ex.com/p)");
//! ```
//!
//! ## Diagnostics
//!
//! ```rust
//! use pagemd::{Transformer, TransformOptions};
//!
//! let transformer = Transformer::new("https://ex.com/", TransformOptions::default()).unwrap();
//! let result = transformer
//!     .transform_with_diagnostics(r#"<a href="http://[broken">docs</a>"#)
//!     .unwrap();
//! assert_eq!(result.markdown, "docs");
//! assert_eq!(result.diagnostics.len(), 1);
//! ```

mod convert;
pub mod diagnostics;
pub mod dom;
mod filter;
pub mod html;
mod options;
mod rewrite;
mod service;
mod whitespace;

pub use diagnostics::{Diagnostic, Stage, StageReport};
pub use dom::{Document, DomError, Node, NodeId, NodeType};
pub use html::parse_html;
pub use options::{HtmlParser, TransformOptions, ALWAYS_REMOVED_TAGS};
pub use rewrite::resolve_url;
pub use service::{transform, Transformed, Transformer};
pub use whitespace::normalize_whitespace;

/// Error type for transform operations
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTML parsing failed: {0}")]
    Parse(String),

    #[error("Conversion error: {0}")]
    Conversion(String),
}

pub type Result<T> = std::result::Result<T, TransformError>;
