// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rendering and swapping options.
//!
//! Defaults cover the common case; hosts that need other conventions build
//! an [`Options`] programmatically or, with the `config-loaders` feature,
//! load one from YAML:
//!
//! ```yaml
//! csv:
//!   separator: ","
//!   null_marker: "nil"
//! swap:
//!   swap_pointers: false
//! ```
//!
//! Missing keys keep their default value.

#[cfg(feature = "config-loaders")]
use crate::error::{ConfigSource, Error, Result};
#[cfg(feature = "config-loaders")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "config-loaders")]
use std::path::Path;

/// Default CSV token separator.
pub const DEFAULT_SEPARATOR: &str = " ";
/// Default rendering of a null pointer.
pub const DEFAULT_NULL_MARKER: &str = "NULL";
/// Default rendering of an opaque leaf.
pub const DEFAULT_OPAQUE_PLACEHOLDER: &str = "<opaque>";

/// CSV flattening conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct CsvOptions {
    /// Token separator.
    pub separator: String,
    /// Value text for a null pointer.
    pub null_marker: String,
    /// Value text for an opaque leaf.
    pub opaque_placeholder: String,
    /// Render enums by symbol (falls back to the integer when unnamed).
    pub enum_symbols: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            null_marker: DEFAULT_NULL_MARKER.to_string(),
            opaque_placeholder: DEFAULT_OPAQUE_PLACEHOLDER.to_string(),
            enum_symbols: true,
        }
    }
}

impl CsvOptions {
    /// Default options with another separator.
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }
}

/// Endian swap policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct SwapPolicy {
    /// Reverse pointer-sized address fields too. Off by default: addresses
    /// are not portable across byte orders.
    pub swap_pointers: bool,
}

impl SwapPolicy {
    /// Swap numeric and enum leaves only.
    pub const fn data_only() -> Self {
        Self {
            swap_pointers: false,
        }
    }

    /// Swap pointer fields as well.
    pub const fn with_pointers() -> Self {
        Self {
            swap_pointers: true,
        }
    }
}

/// Aggregated options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct Options {
    pub csv: CsvOptions,
    pub swap: SwapPolicy,
}

#[cfg(feature = "config-loaders")]
impl Options {
    /// Parse options from a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Config {
            op: "Options::from_yaml_str",
            source: ConfigSource::from(e),
        })
    }

    /// Load options from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            op: "Options::load",
            source: ConfigSource::from(e),
        })?;
        log::debug!("[config] loading options from {}", path.display());
        Self::from_yaml_str(&text)
    }
}
