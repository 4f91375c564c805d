//! Replay configuration.

use regex::Regex;
use reel_core::CoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Attribute names never replayed
    pub ignored_attributes: Vec<String>,
    /// Pattern a replayed attribute name must match in full
    pub attribute_name_pattern: String,
    /// Placeholder character for masked input values
    pub mask_char: char,
    /// Origin of rewritten stylesheet assets; their query separators are escaped
    pub asset_origin: Option<String>,
    /// Recording came from a mobile device; the body is scroll-locked
    pub mobile: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            ignored_attributes: vec!["autocomplete".to_string(), "name".to_string()],
            attribute_name_pattern: r#"^[^\s/>"'=]+$"#.to_string(),
            mask_char: '*',
            asset_origin: None,
            mobile: false,
        }
    }
}

impl ReplayConfig {
    /// Load from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(data).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Set the asset origin
    #[must_use]
    pub fn with_asset_origin(mut self, origin: impl Into<String>) -> Self {
        self.asset_origin = Some(origin.into());
        self
    }

    /// Enable mobile mode
    #[must_use]
    pub fn with_mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    /// Compile the attribute rules
    ///
    /// # Errors
    ///
    /// Returns error if the name pattern is not a valid regex
    pub fn attribute_filter(&self) -> Result<AttributeFilter, ConfigError> {
        let pattern = Regex::new(&self.attribute_name_pattern).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: self.attribute_name_pattern.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(AttributeFilter {
            ignored: self.ignored_attributes.clone(),
            pattern,
        })
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// JSON did not decode
    #[error("Malformed configuration: {0}")]
    Malformed(String),
    /// Attribute name pattern did not compile
    #[error("Invalid attribute name pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Pattern as configured
        pattern: String,
        /// Compiler message
        reason: String,
    },
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        let field = match err {
            ConfigError::Malformed(_) => "config",
            ConfigError::InvalidPattern { .. } => "attribute_name_pattern",
        };
        CoreError::Config {
            field: field.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Why an attribute was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRejection {
    /// Name is on the ignore list
    Ignored,
    /// Name fails the name pattern
    UnsafeName,
}

/// Compiled attribute rules
#[derive(Debug, Clone)]
pub struct AttributeFilter {
    ignored: Vec<String>,
    pattern: Regex,
}

impl AttributeFilter {
    /// Check an attribute name
    ///
    /// # Errors
    ///
    /// Returns the reason the name must not be replayed
    pub fn check(&self, name: &str) -> Result<(), AttributeRejection> {
        if self.ignored.iter().any(|ignored| ignored == name) {
            return Err(AttributeRejection::Ignored);
        }
        if !self.pattern.is_match(name) {
            return Err(AttributeRejection::UnsafeName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = ReplayConfig::default().attribute_filter().unwrap();
        assert_eq!(filter.check("class"), Ok(()));
        assert_eq!(filter.check("data-id"), Ok(()));
        assert_eq!(filter.check("autocomplete"), Err(AttributeRejection::Ignored));
        assert_eq!(filter.check("name"), Err(AttributeRejection::Ignored));
        for bad in ["", "a b", "a\tb", "x=y", "a/b", "a>b", "\"q\"", "it's"] {
            assert_eq!(filter.check(bad), Err(AttributeRejection::UnsafeName), "{bad:?}");
        }
    }

    #[test]
    fn test_from_json_partial() {
        let config = ReplayConfig::from_json(br##"{"mobile": true, "mask_char": "#"}"##).unwrap();
        assert!(config.mobile);
        assert_eq!(config.mask_char, '#');
        assert_eq!(config.ignored_attributes, ReplayConfig::default().ignored_attributes);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            ReplayConfig::from_json(b"{"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let config = ReplayConfig {
            attribute_name_pattern: "([".to_string(),
            ..Default::default()
        };
        let err = config.attribute_filter().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Config { ref field, .. } if field == "attribute_name_pattern"));
    }

    #[test]
    fn test_custom_denylist() {
        let config = ReplayConfig {
            ignored_attributes: vec!["data-secret".to_string()],
            ..Default::default()
        };
        let filter = config.attribute_filter().unwrap();
        assert_eq!(filter.check("name"), Ok(()));
        assert_eq!(filter.check("data-secret"), Err(AttributeRejection::Ignored));
    }
}
