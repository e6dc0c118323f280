//! Build orchestration.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use quire_content::{Document, FrontmatterError, SourceKind};
use walkdir::WalkDir;

use crate::facets::Facets;
use crate::layout::{compose, LayoutError};
use crate::output::{resolve, OutputError, OutputTarget};
use crate::site::{SiteContext, SiteError};
use crate::templates::{BlockTags, TemplateEngine};
use crate::transform::{transform, TransformError};

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source directory (holds `_config.yml`, `_layouts`, ...)
    pub source_dir: PathBuf,

    /// Destination directory
    pub output_dir: PathBuf,

    /// Custom block tag pair rendered as `<pre><code>`
    pub block_tags: BlockTags,

    /// HTML snippet injected before `</body>` of every page (dev server only)
    pub live_reload: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("_site"),
            block_tags: BlockTags::default(),
            live_reload: None,
        }
    }
}

/// Stage of the per-document pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Frontmatter,
    Transform,
    Compose,
    Resolve,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Frontmatter => "frontmatter",
            Self::Transform => "transform",
            Self::Compose => "compose",
            Self::Resolve => "resolve",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Errors that fail a single document. The build carries on with the next one.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Failed to read source: {0}")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DocumentError {
    /// Pipeline stage the error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Read(_) => Stage::Load,
            Self::Frontmatter(_) => Stage::Frontmatter,
            Self::Transform(_) => Stage::Transform,
            Self::Layout(_) => Stage::Compose,
            Self::Output(_) => Stage::Resolve,
            Self::Write { .. } => Stage::Write,
        }
    }
}

/// Errors that abort the whole build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Site(#[from] SiteError),

    #[error("Failed to read source directory {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A document that could not be built.
#[derive(Debug)]
pub struct DocumentFailure {
    /// Source path relative to the source root
    pub source_path: PathBuf,
    /// Stage that failed
    pub stage: Stage,
    /// Cause
    pub error: DocumentError,
}

/// A non-fatal observation about a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source path relative to the source root
    pub source_path: PathBuf,
    /// Human-readable message
    pub message: String,
}

/// A page written to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    /// Source path relative to the source root
    pub source_path: PathBuf,
    /// Destination file
    pub output_path: PathBuf,
    /// Site-relative URL
    pub url: String,
}

/// Result of a build operation.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Pages written, in build order
    pub written: Vec<WrittenPage>,

    /// Documents that failed
    pub failures: Vec<DocumentFailure>,

    /// Warnings such as pages written without a layout or over another page
    pub diagnostics: Vec<Diagnostic>,

    /// Tags and categories of the written pages
    pub facets: Facets,

    /// Total build time in milliseconds
    pub duration_ms: u64,
}

impl BuildReport {
    /// Whether every document was written.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A document that made it through every stage.
struct Built {
    document: Document,
    target: OutputTarget,
    layout: Option<String>,
}

/// Static site builder.
pub struct SiteBuilder {
    config: BuildConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Build the site.
    ///
    /// Documents are processed one at a time in file-name order. A failing
    /// document is recorded in the report and the build moves on; only
    /// site-wide problems (missing or broken config, unusable destination)
    /// abort it.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let source_dir = &self.config.source_dir;
        let output_dir = &self.config.output_dir;

        tracing::info!(
            "Building site {} -> {}",
            source_dir.display(),
            output_dir.display()
        );

        let site = SiteContext::load(source_dir)?;
        let engine = TemplateEngine::new(site.includes_dir(), &self.config.block_tags);

        fs::create_dir_all(output_dir).map_err(|source| BuildError::Write {
            path: output_dir.clone(),
            source,
        })?;

        let sources = self.discover_sources()?;
        let mut report = BuildReport::default();
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

        for (source_path, kind) in sources {
            tracing::debug!("Building {}", source_path.display());

            match self.build_document(&engine, &site, &report.facets, &source_path, kind) {
                Ok(built) => {
                    if built.layout.is_none() {
                        let message = "no layout configured; written without one".to_string();
                        tracing::warn!("{}: {}", source_path.display(), message);
                        report.diagnostics.push(Diagnostic {
                            source_path: source_path.clone(),
                            message,
                        });
                    }

                    if let Some(previous) =
                        claimed.insert(built.target.path.clone(), source_path.clone())
                    {
                        let message = format!(
                            "overwrites {} written from {}",
                            built.target.path.display(),
                            previous.display()
                        );
                        tracing::warn!("{}: {}", source_path.display(), message);
                        report.diagnostics.push(Diagnostic {
                            source_path: source_path.clone(),
                            message,
                        });
                    }

                    report.facets.record(&built.document, built.target.url());
                    report.written.push(WrittenPage {
                        source_path,
                        output_path: built.target.path.clone(),
                        url: built.target.url().to_string(),
                    });
                }
                Err(DocumentError::Write { path, source }) if is_fatal(&source) => {
                    return Err(BuildError::Write { path, source });
                }
                Err(error) => {
                    let stage = error.stage();
                    tracing::error!(
                        "Failed to build {} ({} stage): {}",
                        source_path.display(),
                        stage,
                        error
                    );
                    report.failures.push(DocumentFailure {
                        source_path,
                        stage,
                        error,
                    });
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Built {} pages ({} failed) in {}ms",
            report.written.len(),
            report.failures.len(),
            report.duration_ms
        );

        Ok(report)
    }

    /// Source documents directly under the source directory, by file name.
    fn discover_sources(&self) -> Result<Vec<(PathBuf, SourceKind)>, BuildError> {
        let source_dir = &self.config.source_dir;
        let mut sources = Vec::new();

        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| BuildError::ReadSource {
                path: source_dir.clone(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = SourceKind::from_path(entry.path()) else {
                continue;
            };

            sources.push((PathBuf::from(entry.file_name()), kind));
        }

        Ok(sources)
    }

    /// Run one document through every stage, ending with the write.
    fn build_document(
        &self,
        engine: &TemplateEngine,
        site: &SiteContext,
        facets: &Facets,
        source_path: &Path,
        kind: SourceKind,
    ) -> Result<Built, DocumentError> {
        let raw = fs::read_to_string(self.config.source_dir.join(source_path))
            .map_err(DocumentError::Read)?;

        let document = Document::parse(source_path, kind, raw)?;
        let transformed = transform(engine, &document, site, facets)?;
        let composed = compose(engine, transformed, &document, site, facets)?;
        let target = resolve(
            source_path,
            document.frontmatter.as_ref(),
            &self.config.output_dir,
        )?;

        let html = match &self.config.live_reload {
            Some(snippet) => inject_before_body_end(&composed.html, snippet),
            None => composed.html,
        };

        let write_error = |source| DocumentError::Write {
            path: target.path.clone(),
            source,
        };
        target.prepare().map_err(write_error)?;
        fs::write(&target.path, html).map_err(write_error)?;

        tracing::debug!(
            "Wrote {} -> {}",
            source_path.display(),
            target.path.display()
        );

        Ok(Built {
            document,
            layout: composed.layout,
            target,
        })
    }
}

/// Filesystem conditions no later document can recover from.
fn is_fatal(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::StorageFull | io::ErrorKind::ReadOnlyFilesystem | io::ErrorKind::OutOfMemory
    )
}

/// Insert `snippet` before the last `</body>`, or append it.
fn inject_before_body_end(html: &str, snippet: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => format!("{}{}{}", &html[..pos], snippet, &html[pos..]),
        None => format!("{html}{snippet}"),
    }
}
