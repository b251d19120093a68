//! # Arena Configuration
//!
//! Startup tuning for arenas. Like every other engine knob, arena sizing is
//! loaded from an external TOML file once at boot, never hardcoded at call
//! sites.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::memory::DEFAULT_ALIGNMENT;

/// Construction settings for an [`Arena`](crate::Arena).
///
/// Both fields are hints: the arena clamps them to its minimum floors and
/// rounds them up to powers of two before use.
///
/// ```toml
/// chunk_capacity = 4194304
/// alignment = 16
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Capacity hint in bytes for each backing chunk.
    pub chunk_capacity: usize,
    /// Byte alignment hint applied to the start of every allocation.
    /// Optional in the file.
    #[serde(default = "default_alignment")]
    pub alignment: usize,
}

fn default_alignment() -> usize {
    DEFAULT_ALIGNMENT
}

impl ArenaConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not a valid arena
    /// config.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are not a valid arena
    /// config.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Default for ArenaConfig {
    /// 64 KiB chunks, default alignment.
    fn default() -> Self {
        Self {
            chunk_capacity: 64 * 1024,
            alignment: DEFAULT_ALIGNMENT,
        }
    }
}
