//! Document build pipeline for quire sites.
//!
//! Builds a static site from HTML and markdown sources: frontmatter is split
//! off, the body is expanded as a template and (for markdown) converted to
//! HTML, the result is wrapped in a layout and written under a
//! permalink-aware output path.

pub mod builder;
pub mod context;
pub mod facets;
pub mod layout;
pub mod output;
pub mod site;
pub mod templates;
pub mod transform;

pub use builder::{
    BuildConfig, BuildError, BuildReport, Diagnostic, DocumentError, DocumentFailure,
    SiteBuilder, Stage, WrittenPage,
};
pub use context::{RenderContext, SiteView};
pub use facets::{Facets, PageRef};
pub use layout::{compose, Composed, LayoutError};
pub use output::{resolve, OutputError, OutputTarget};
pub use site::{SiteContext, SiteError};
pub use templates::{BlockTags, TemplateEngine};
pub use transform::{render_markdown, transform, TransformError};
