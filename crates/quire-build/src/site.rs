//! Site-wide configuration and data sets.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use walkdir::WalkDir;

/// Base name of the global configuration file.
pub const CONFIG_STEM: &str = "_config";

/// Directory holding auxiliary data tables.
pub const DATA_DIR: &str = "_data";

/// Directory holding layout templates.
pub const LAYOUTS_DIR: &str = "_layouts";

/// Root for template includes.
pub const INCLUDES_DIR: &str = "_includes";

/// Config extensions, in lookup order.
const CONFIG_EXTENSIONS: [&str; 4] = ["yml", "yaml", "toml", "json"];

/// Errors that can occur while loading the site context.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse configuration {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("Failed to parse data file {}: {message}", path.display())]
    DataParse { path: PathBuf, message: String },

    #[error("Duplicate data set name: {0}")]
    DuplicateData(String),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Structured data formats accepted for config and data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Yaml,
    Json,
    Toml,
}

impl DataFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    fn parse(self, text: &str) -> Result<Value, String> {
        match self {
            Self::Yaml if text.trim().is_empty() => Ok(Value::Null),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        }
    }
}

/// Read-only site state shared by every document of one build.
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// Source root the context was loaded from
    pub root: PathBuf,

    /// Global configuration mapping
    pub config: Mapping,

    /// Data sets keyed by file base name
    pub data: BTreeMap<String, Value>,
}

impl SiteContext {
    /// Load the global configuration and all data sets under `root`.
    pub fn load(root: &Path) -> Result<Self, SiteError> {
        let config = load_config(root)?;
        let data = load_data(&root.join(DATA_DIR))?;

        Ok(Self {
            root: root.to_path_buf(),
            config,
            data,
        })
    }

    /// Site-wide default layout name (`layout` key of the config).
    pub fn default_layout(&self) -> Option<&str> {
        self.config
            .get("layout")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Directory containing layout templates.
    pub fn layouts_dir(&self) -> PathBuf {
        self.root.join(LAYOUTS_DIR)
    }

    /// Root directory for template includes.
    pub fn includes_dir(&self) -> PathBuf {
        self.root.join(INCLUDES_DIR)
    }
}

fn load_config(root: &Path) -> Result<Mapping, SiteError> {
    let Some(path) = CONFIG_EXTENSIONS
        .iter()
        .map(|ext| root.join(format!("{CONFIG_STEM}.{ext}")))
        .find(|path| path.is_file())
    else {
        return Err(SiteError::ConfigNotFound(
            root.join(format!("{CONFIG_STEM}.yml")),
        ));
    };

    let text = fs::read_to_string(&path).map_err(|source| SiteError::Read {
        path: path.clone(),
        source,
    })?;

    let format = DataFormat::from_path(&path).unwrap_or(DataFormat::Yaml);
    let value = format.parse(&text).map_err(|message| SiteError::ConfigParse {
        path: path.clone(),
        message,
    })?;

    let config = match value {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(SiteError::ConfigParse {
                path,
                message: "expected a mapping at the top level".to_string(),
            })
        }
    };

    tracing::info!("Loaded config from {}", path.display());

    Ok(config)
}

fn load_data(data_dir: &Path) -> Result<BTreeMap<String, Value>, SiteError> {
    let mut data = BTreeMap::new();

    if !data_dir.is_dir() {
        return Ok(data);
    }

    for entry in WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| SiteError::Read {
            path: data_dir.to_path_buf(),
            source: e.into(),
        })?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(format) = DataFormat::from_path(path) else {
            continue;
        };
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let text = fs::read_to_string(path).map_err(|source| SiteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value = format.parse(&text).map_err(|message| SiteError::DataParse {
            path: path.to_path_buf(),
            message,
        })?;

        if data.insert(name.to_string(), value).is_some() {
            return Err(SiteError::DuplicateData(name.to_string()));
        }

        tracing::debug!("Loaded data set '{}' from {}", name, path.display());
    }

    Ok(data)
}
