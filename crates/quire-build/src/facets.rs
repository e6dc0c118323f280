//! Cross-document tag and category aggregation.

use std::collections::BTreeMap;

use quire_content::Document;
use serde::Serialize;

/// A page listed under a tag or category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRef {
    /// Page title
    pub title: String,
    /// Site-relative URL
    pub url: String,
    /// Source path relative to the source root
    pub source: String,
}

/// Tags and categories observed across the pages written so far.
///
/// Owned by the builder; documents only see it through a shared reference.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Facets {
    /// Tag name to the pages declaring it, in build order
    pub tags: BTreeMap<String, Vec<PageRef>>,
    /// Category name to the pages declaring it, in build order
    pub categories: BTreeMap<String, Vec<PageRef>>,
}

impl Facets {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tags and categories of a written document.
    pub fn record(&mut self, document: &Document, url: &str) {
        let page = PageRef {
            title: document.title(),
            url: url.to_string(),
            source: document.source_path.to_string_lossy().into_owned(),
        };

        for tag in document.tags() {
            self.tags.entry(tag).or_default().push(page.clone());
        }
        for category in document.categories() {
            self.categories
                .entry(category)
                .or_default()
                .push(page.clone());
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_content::SourceKind;

    fn doc(path: &str, raw: &str) -> Document {
        Document::parse(path, SourceKind::Markdown, raw.to_string()).unwrap()
    }

    #[test]
    fn records_tags_and_categories() {
        let mut facets = Facets::new();

        facets.record(
            &doc("a.md", "---\ntitle: A\ntags: rust web\ncategories: dev\n---\n"),
            "/a/",
        );
        facets.record(&doc("b.md", "---\ntitle: B\ntags: [rust]\n---\n"), "/b/");

        let rust: Vec<_> = facets.tags["rust"].iter().map(|p| p.url.as_str()).collect();
        assert_eq!(rust, vec!["/a/", "/b/"]);
        assert_eq!(facets.tags["web"].len(), 1);
        assert_eq!(facets.categories["dev"][0].title, "A");
    }

    #[test]
    fn ignores_documents_without_facets() {
        let mut facets = Facets::new();

        facets.record(&doc("plain.md", "# No frontmatter"), "/plain/");

        assert!(facets.tags.is_empty());
        assert!(facets.categories.is_empty());
    }

    #[test]
    fn numeric_tags_are_recorded_as_strings() {
        let mut facets = Facets::new();

        facets.record(&doc("a.md", "---\ntags: [2020, rust]\n---\n"), "/a/");

        let names: Vec<_> = facets.tags.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["2020", "rust"]);
    }
}
