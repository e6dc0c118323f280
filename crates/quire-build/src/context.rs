//! Variables exposed to templates.

use std::collections::BTreeMap;

use quire_content::Frontmatter;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::facets::{Facets, PageRef};
use crate::site::SiteContext;

/// The `site` variable: config keys at the top level plus data and facets.
#[derive(Debug, Serialize)]
pub struct SiteView<'a> {
    #[serde(flatten)]
    pub config: &'a Mapping,
    pub data: &'a BTreeMap<String, Value>,
    pub tags: &'a BTreeMap<String, Vec<PageRef>>,
    pub categories: &'a BTreeMap<String, Vec<PageRef>>,
}

/// Context for rendering a body or a layout.
#[derive(Debug, Serialize)]
pub struct RenderContext<'a> {
    /// Frontmatter of the current document
    pub page: &'a Frontmatter,
    /// Site configuration, data and facet snapshot
    pub site: SiteView<'a>,
    /// Rendered body, only set when composing a layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    /// Context for expanding a document body.
    pub fn new(page: &'a Frontmatter, site: &'a SiteContext, facets: &'a Facets) -> Self {
        Self {
            page,
            site: SiteView {
                config: &site.config,
                data: &site.data,
                tags: &facets.tags,
                categories: &facets.categories,
            },
            content: None,
        }
    }

    /// Add the rendered body for layout composition.
    pub fn with_content(mut self, content: &'a str) -> Self {
        self.content = Some(content);
        self
    }
}
