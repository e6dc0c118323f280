//! Output path resolution.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use quire_content::{Frontmatter, SourceKind};
use serde_yaml::Value;

/// File written for directory-style ("pretty") URLs.
const INDEX_FILE: &str = "index.html";

/// Errors that can occur while resolving an output path.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Permalink escapes the destination directory: {0}")]
    EscapesDestination(String),

    #[error("Permalink must be a string, found {0}")]
    InvalidPermalink(String),
}

/// Where a document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Destination file path
    pub path: PathBuf,
    /// Whether the parent directories must be created before writing
    pub create_dirs: bool,
    url: String,
}

impl OutputTarget {
    /// Site-relative URL of the page.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create the parent directory when required. Existing directories are fine.
    pub fn prepare(&self) -> io::Result<()> {
        if !self.create_dirs {
            return Ok(());
        }
        match self.path.parent() {
            Some(parent) => fs::create_dir_all(parent),
            None => Ok(()),
        }
    }
}

/// Compute the destination of a document.
///
/// A permalink ending in `.html`/`.htm` is written verbatim; any other
/// permalink is a directory receiving `index.html`. Without a permalink, HTML
/// sources keep their path and markdown sources get a pretty URL
/// (`post.md` → `post/index.html`).
pub fn resolve(
    source_path: &Path,
    frontmatter: Option<&Frontmatter>,
    destination: &Path,
) -> Result<OutputTarget, OutputError> {
    match frontmatter.and_then(|fm| fm.get("permalink")) {
        None | Some(Value::Null) => Ok(from_source(source_path, destination)),
        Some(Value::String(permalink)) => from_permalink(permalink, destination),
        Some(other) => Err(OutputError::InvalidPermalink(
            serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        )),
    }
}

fn from_permalink(permalink: &str, destination: &Path) -> Result<OutputTarget, OutputError> {
    let relative = permalink.trim_start_matches('/');
    let relative_path = Path::new(relative);

    if !relative_path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(OutputError::EscapesDestination(permalink.to_string()));
    }

    if !permalink.ends_with('/') && is_html_like(relative_path) {
        return Ok(OutputTarget {
            path: destination.join(relative_path),
            create_dirs: false,
            url: format!("/{relative}"),
        });
    }

    let directory = relative.trim_end_matches('/');
    Ok(OutputTarget {
        path: destination.join(directory).join(INDEX_FILE),
        create_dirs: true,
        url: directory_url(Path::new(directory)),
    })
}

fn from_source(source_path: &Path, destination: &Path) -> OutputTarget {
    if SourceKind::from_path(source_path) == Some(SourceKind::Html) {
        return OutputTarget {
            path: destination.join(source_path),
            create_dirs: false,
            url: format!("/{}", url_segments(source_path)),
        };
    }

    let directory = source_path.with_extension("");

    OutputTarget {
        path: destination.join(&directory).join(INDEX_FILE),
        create_dirs: true,
        url: directory_url(&directory),
    }
}

fn is_html_like(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

fn url_segments(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn directory_url(directory: &Path) -> String {
    let segments = url_segments(directory);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{segments}/")
    }
}
