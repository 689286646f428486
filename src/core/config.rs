use crate::base64::{Base64Options, LastChunkHandling};
use crate::core::encoding::Encoding;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure to read or parse a settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// `[transcode]` defaults for the command-line tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscodeSettings {
    pub from: Option<Encoding>,
    pub to: Option<Encoding>,
    /// Replace malformed input instead of failing
    pub lossy: Option<bool>,
    /// Drop a leading byte-order mark from the input
    pub strip_bom: Option<bool>,
    /// Write a byte-order mark before the output
    pub emit_bom: Option<bool>,
}

/// `[base64]` defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Base64Settings {
    pub options: Option<Base64Options>,
    pub last_chunk: Option<LastChunkHandling>,
    /// Characters per output line; 0 disables wrapping
    pub line_length: Option<usize>,
}

/// `[dispatch]` settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSettings {
    /// Backend to use instead of the detected one
    pub implementation: Option<String>,
}

/// Layered settings for the `utf-d` tool.
///
/// Every field is optional so that a later file only overrides what it
/// names. The built-in defaults fill in everything except the backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub transcode: TranscodeSettings,
    #[serde(default)]
    pub base64: Base64Settings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

impl Settings {
    /// Parses settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The settings bundled with the library.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_toml(include_str!("../../defaults.toml"))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Loads settings with overrides from the standard locations.
    ///
    /// Applied in order, later winning:
    /// 1. Built-in defaults
    /// 2. `~/.config/utf-d/config.toml` (user)
    /// 3. `./utf-d.toml` (project-local)
    /// 4. `explicit`, if given (`~` is expanded)
    ///
    /// A broken user or local file is skipped with a warning. A broken
    /// explicit file is an error.
    pub fn load_with_overrides(explicit: Option<&str>) -> Result<Self, ConfigError> {
        let mut settings = Self::load_default()?;

        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("utf-d").join("config.toml"));
        }
        candidates.push(PathBuf::from("utf-d.toml"));

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(overrides) => {
                    debug!(path = %path.display(), "loaded settings");
                    settings.merge(overrides);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring settings file"),
            }
        }

        if let Some(explicit) = explicit {
            let path = PathBuf::from(shellexpand::tilde(explicit).as_ref());
            settings.merge(Self::load_from_file(&path)?);
            debug!(path = %path.display(), "loaded settings");
        }

        Ok(settings)
    }

    /// Overrides every field that `other` sets.
    pub fn merge(&mut self, other: Settings) {
        let t = other.transcode;
        self.transcode.from = t.from.or(self.transcode.from);
        self.transcode.to = t.to.or(self.transcode.to);
        self.transcode.lossy = t.lossy.or(self.transcode.lossy);
        self.transcode.strip_bom = t.strip_bom.or(self.transcode.strip_bom);
        self.transcode.emit_bom = t.emit_bom.or(self.transcode.emit_bom);

        let b = other.base64;
        self.base64.options = b.options.or(self.base64.options);
        self.base64.last_chunk = b.last_chunk.or(self.base64.last_chunk);
        self.base64.line_length = b.line_length.or(self.base64.line_length);

        if other.dispatch.implementation.is_some() {
            self.dispatch.implementation = other.dispatch.implementation;
        }
    }
}
