//! pagemd-core - Markdown AST and serialization
//!
//! This crate provides the data structures the `pagemd` transformer builds
//! from a filtered DOM tree, and the serializer that turns them into text.
//!
//! # Architecture
//!
//! ```text
//! HTML String ──parse──▶ Document arena ──filter/rewrite──▶ ┌──────────────┐
//!                                                          │ Markdown AST │ ──▶ Markdown String
//!                                                          └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use pagemd_core::{Block, Inline, Options, serialize};
//!
//! let ast = Block::Document(vec![
//!     Block::Heading {
//!         level: 1,
//!         content: vec![Inline::Text("Hello World".to_string())],
//!     },
//!     Block::Paragraph(vec![
//!         Inline::Text("This is ".to_string()),
//!         Inline::Strong(vec![Inline::Text("bold".to_string())]),
//!         Inline::Text(" text.".to_string()),
//!     ]),
//! ]);
//!
//! let markdown = serialize(&ast, &Options::default());
//! assert!(markdown.starts_with("# Hello World\n\nThis is **bold** text."));
//! ```

mod ast;
mod options;
mod serialize;

pub use ast::{Block, Inline, ListItem};
pub use options::Options;
pub use serialize::serialize;
