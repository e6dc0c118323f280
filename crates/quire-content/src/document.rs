//! Source documents.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::frontmatter::{extract, Frontmatter, FrontmatterError};

/// Format of a source document, decided by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.html` / `.htm`: already markup, never converted
    Html,
    /// `.md`: converted from markdown after template expansion
    Markdown,
}

impl SourceKind {
    /// Recognize a source path by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(Self::Html),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// Whether the markdown conversion pass applies.
    pub fn is_markdown(&self) -> bool {
        matches!(self, Self::Markdown)
    }
}

/// A source document after frontmatter extraction.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the source root
    pub source_path: PathBuf,

    /// Document format
    pub kind: SourceKind,

    /// Full file contents as read
    pub raw_text: String,

    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Content without the frontmatter block
    pub body: String,
}

impl Document {
    /// Split `raw_text` into frontmatter and body.
    pub fn parse(
        source_path: impl Into<PathBuf>,
        kind: SourceKind,
        raw_text: String,
    ) -> Result<Self, FrontmatterError> {
        let extracted = extract(&raw_text)?;

        Ok(Self {
            source_path: source_path.into(),
            kind,
            raw_text,
            frontmatter: extracted.frontmatter,
            body: extracted.body,
        })
    }

    /// Frontmatter, or an empty mapping when the document has none.
    pub fn page(&self) -> Frontmatter {
        self.frontmatter.clone().unwrap_or_default()
    }

    /// Look up a frontmatter value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.frontmatter.as_ref()?.get(key)
    }

    /// Page title from frontmatter, falling back to the file stem.
    pub fn title(&self) -> String {
        self.get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.source_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Untitled")
                    .to_string()
            })
    }

    /// Tags declared in frontmatter.
    pub fn tags(&self) -> Vec<String> {
        self.word_list("tags")
    }

    /// Categories declared in frontmatter.
    pub fn categories(&self) -> Vec<String> {
        self.word_list("categories")
    }

    /// Scalar entries of a sequence, as strings (`[2020, rust]` → `["2020", "rust"]`).
    fn word_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
