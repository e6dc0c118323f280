//! Body transformation: template expansion, then markdown conversion.

use std::path::PathBuf;

use pulldown_cmark::{html, Options, Parser};
use quire_content::Document;

use crate::context::RenderContext;
use crate::facets::Facets;
use crate::site::SiteContext;
use crate::templates::TemplateEngine;

/// Errors that can occur while transforming a document body.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Failed to render template {}: {message}", path.display())]
    Template { path: PathBuf, message: String },
}

/// Expand the body as a template, then convert it from markdown when the
/// document is a markdown source. HTML sources skip the conversion.
///
/// Expansion always runs first so that template output may itself contain
/// markdown syntax.
pub fn transform(
    engine: &TemplateEngine,
    document: &Document,
    site: &SiteContext,
    facets: &Facets,
) -> Result<String, TransformError> {
    let page = document.page();
    let context = RenderContext::new(&page, site, facets);

    let expanded = engine
        .render(
            &document.source_path.to_string_lossy(),
            &document.body,
            &context,
        )
        .map_err(|e| TransformError::Template {
            path: document.source_path.clone(),
            message: e.to_string(),
        })?;

    if document.kind.is_markdown() {
        Ok(render_markdown(&expanded))
    } else {
        Ok(expanded)
    }
}

/// Convert markdown to HTML.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::BlockTags;
    use quire_content::SourceKind;
    use serde_yaml::Mapping;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn site() -> SiteContext {
        SiteContext {
            root: PathBuf::from("."),
            config: Mapping::new(),
            data: BTreeMap::new(),
        }
    }

    #[test]
    fn expands_templates_before_markdown() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let raw = "---\nword: \"*loud*\"\n---\nSay {{ page.word }}\n".to_string();
        let doc = Document::parse("post.md", SourceKind::Markdown, raw).unwrap();

        let html = transform(&engine, &doc, &site(), &Facets::new()).unwrap();

        assert_eq!(html, "<p>Say <em>loud</em></p>\n");
    }

    #[test]
    fn skips_markdown_for_html_sources() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let raw = "---\nword: \"*loud*\"\n---\n# Say {{ page.word }}".to_string();
        let doc = Document::parse("page.html", SourceKind::Html, raw).unwrap();

        let html = transform(&engine, &doc, &site(), &Facets::new()).unwrap();

        assert_eq!(html, "# Say *loud*");
    }

    #[test]
    fn highlight_blocks_survive_markdown() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let raw = "{% highlight rust %}\nfn *main*() {}\n{% endhighlight %}\n".to_string();
        let doc = Document::parse("code.md", SourceKind::Markdown, raw).unwrap();

        let html = transform(&engine, &doc, &site(), &Facets::new()).unwrap();

        assert!(html.contains("<pre><code>\nfn *main*() {}\n</code></pre>"));
    }

    #[test]
    fn template_errors_name_the_document() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let doc = Document::parse("broken.md", SourceKind::Markdown, "{% for %}".to_string())
            .unwrap();

        let err = transform(&engine, &doc, &site(), &Facets::new()).unwrap_err();

        let TransformError::Template { path, .. } = err;
        assert_eq!(path, PathBuf::from("broken.md"));
    }

    #[test]
    fn renders_markdown() {
        let html = render_markdown("# Hello\n\nWorld");

        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }
}
