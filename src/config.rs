//! Configuration file loading for service credentials and endpoints.
//!
//! The configuration is a sectioned `key = "value"` file, loaded once per
//! invocation from the path given on the command line and read-only
//! afterwards. Sections are per collaborator:
//!
//! ```text
//! [claim]
//! base_url = "https://www.example-publisher.com"
//! email = "user@example.com"
//! password = "secret"
//! download_dir = "/var/books"
//!
//! [dropbox]
//! access_token = "..."
//! ```
//!
//! All sections are optional at load time; a missing key only becomes an
//! error when the service that needs it is actually selected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading or consulting the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line did not match the `key = "value"` / `[section]` grammar.
    #[error("invalid config syntax on line {line}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What was expected.
        message: &'static str,
    },

    /// A key appeared before any `[section]` header.
    #[error("config key '{key}' on line {line} appears outside any section")]
    OrphanKey {
        /// The offending key.
        key: String,
        /// 1-based line number.
        line: usize,
    },

    /// A selected service needs a key the file does not supply.
    #[error("missing config key `{section}.{key}`")]
    MissingKey {
        /// Section the key belongs to.
        section: &'static str,
        /// The missing key.
        key: &'static str,
    },

    /// A key's value could not be parsed as the selected service expects.
    #[error("invalid value for config key `{section}.{key}`: {message}")]
    InvalidValue {
        /// Section the key belongs to.
        section: &'static str,
        /// The offending key.
        key: &'static str,
        /// What was expected.
        message: String,
    },
}

/// Parsed configuration: section name to key/value map.
///
/// Process-wide and read-only after load; shared by reference across all
/// pipeline stages within one run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    /// Loads the configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parses configuration text.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (line_index, raw_line) in raw.lines().enumerate() {
            let line = strip_inline_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            let line_number = line_index + 1;

            if let Some(section) = line.strip_prefix('[') {
                let Some(name) = section.strip_suffix(']') else {
                    return Err(ConfigError::Syntax {
                        line: line_number,
                        message: "expected closing ']' on section header",
                    });
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::Syntax {
                        line: line_number,
                        message: "expected non-empty section name",
                    });
                }
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let Some((raw_key, raw_value)) = line.split_once('=') else {
                return Err(ConfigError::Syntax {
                    line: line_number,
                    message: "expected key = \"value\"",
                });
            };
            let key = raw_key.trim();
            let Some(section) = current.as_deref() else {
                return Err(ConfigError::OrphanKey {
                    key: key.to_string(),
                    line: line_number,
                });
            };
            let value = parse_string_literal(raw_value.trim()).ok_or(ConfigError::Syntax {
                line: line_number,
                message: "expected double-quoted string value",
            })?;

            if let Some(table) = sections.get_mut(section) {
                table.insert(key.to_string(), value);
            }
        }

        Ok(Self { sections })
    }

    /// Looks up an optional key.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }

    /// Looks up a key a selected service requires.
    pub fn require(
        &self,
        section: &'static str,
        key: &'static str,
    ) -> Result<&str, ConfigError> {
        self.get(section, key)
            .ok_or(ConfigError::MissingKey { section, key })
    }

    /// True when the file carries the given section at all.
    #[must_use]
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Option<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        return None;
    }
    Some(raw_value[1..raw_value.len() - 1].to_string())
}
