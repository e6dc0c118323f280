//! Layout composition.

use std::fs;
use std::path::{Component, Path, PathBuf};

use quire_content::Document;
use serde_yaml::Value;

use crate::context::RenderContext;
use crate::facets::Facets;
use crate::site::SiteContext;
use crate::templates::TemplateEngine;

/// Errors that can occur while composing a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Layout '{name}' not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    #[error("Failed to render layout '{name}': {message}")]
    Template { name: String, message: String },

    #[error("Failed to read layout {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output of layout composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    /// Final page HTML
    pub html: String,
    /// Layout applied, `None` when the content was left unwrapped
    pub layout: Option<String>,
}

/// Pick the layout for a document.
///
/// `layout` in frontmatter wins over the site default. A frontmatter value of
/// `null`, `none` or an empty string disables the layout for that page.
pub fn layout_name(document: &Document, site: &SiteContext) -> Option<String> {
    match document.get("layout") {
        Some(Value::String(name)) if name.is_empty() || name == "none" => None,
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Null) => None,
        _ => site.default_layout().map(str::to_string),
    }
}

/// Wrap `content` in the document's layout.
///
/// Without a resolvable layout name the content is returned unchanged; the
/// caller decides how to report that. Layout output is never converted from
/// markdown.
pub fn compose(
    engine: &TemplateEngine,
    content: String,
    document: &Document,
    site: &SiteContext,
    facets: &Facets,
) -> Result<Composed, LayoutError> {
    let Some(name) = layout_name(document, site) else {
        return Ok(Composed {
            html: content,
            layout: None,
        });
    };

    let file_name = format!("{name}.html");
    let path = site.layouts_dir().join(&file_name);
    if !stays_inside(Path::new(&file_name)) {
        return Err(LayoutError::NotFound { name, path });
    }

    let template = match fs::read_to_string(&path) {
        Ok(template) => template,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LayoutError::NotFound { name, path });
        }
        Err(source) => return Err(LayoutError::Read { path, source }),
    };

    let page = document.page();
    let context = RenderContext::new(&page, site, facets).with_content(&content);

    let html = engine
        .render(&format!("_layouts/{file_name}"), &template, &context)
        .map_err(|e| LayoutError::Template {
            name: name.clone(),
            message: e.to_string(),
        })?;

    Ok(Composed {
        html,
        layout: Some(name),
    })
}

fn stays_inside(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
