//! Source documents with YAML frontmatter.
//!
//! This crate splits raw source files into a frontmatter mapping and a body,
//! and classifies them as HTML or markdown by extension.

pub mod document;
pub mod frontmatter;

pub use document::{Document, SourceKind};
pub use frontmatter::{extract, Extracted, Frontmatter, FrontmatterError};
