//! Reads kubelet configuration files.
//!
//! The decoder is chosen strictly from the file extension, never by looking at the content.

use crate::document::ParsedDocument;
use crate::error::{self, Result};
use log::debug;
use serde_json::Value;
use snafu::{ensure, OptionExt, ResultExt};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from the trailing extension: `.json`, `.yaml` or `.yml`, matched
    /// case-sensitively. Anything else is an `UnsupportedFormat` error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure!(!path.as_os_str().is_empty(), error::EmptyConfigPathSnafu);

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .context(error::UnsupportedFormatSnafu {
                path,
                extension: "",
            })?;
        match extension {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            other => error::UnsupportedFormatSnafu {
                path,
                extension: format!(".{}", other),
            }
            .fail(),
        }
    }
}

/// Loads and parses the config file at `path`.
pub fn read<P: AsRef<Path>>(path: P) -> Result<ParsedDocument> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let contents = fs::read_to_string(path).context(error::ConfigReadSnafu { path })?;
    let document = parse(&contents, format, path)?;
    debug!("Parsed {:?} kubelet config from {}", format, path.display());
    Ok(document)
}

fn parse(contents: &str, format: ConfigFormat, path: &Path) -> Result<ParsedDocument> {
    let root: Value = match format {
        ConfigFormat::Json => {
            serde_json::from_str(contents).context(error::JsonParseSnafu { path })?
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_str(contents).context(error::YamlParseSnafu { path })?
        }
    };
    Ok(ParsedDocument::new(root))
}
