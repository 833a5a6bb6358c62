#[cfg(feature = "napi")]
use napi_derive::napi;
use crate::emitter::Channel;
use crate::entry::Visibility;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const W_SCRIPT_SYNTAX: &str = "W-SCRIPT-SYNTAX";
pub const W_EXPORT_UNRESOLVED: &str = "W-EXPORT-UNRESOLVED";
pub const W_EXPORT_KIND: &str = "W-EXPORT-KIND";
pub const W_DUPLICATE_OPTION: &str = "W-DUPLICATE-OPTION";
pub const W_DUPLICATE_MEMBER: &str = "W-DUPLICATE-MEMBER";
pub const W_TYPE_UNION: &str = "W-TYPE-UNION";
pub const W_NAME_UNRESOLVED: &str = "W-NAME-UNRESOLVED";

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Invalid configuration. Raised before any analysis starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("options.filename or options.filecontent is required")]
    MissingSource,
    #[error("options.filename and options.filecontent cannot be used together")]
    ConflictingSource,
    #[error("options.features must be an array")]
    FeaturesNotArray,
    #[error("Unknown '{0}' feature. Supported features: name, description, keywords, model, props, data, computed, methods, events, slots")]
    UnknownFeature(String),
    #[error("Unknown '{0}' visibility. Supported visibilities: public, protected, private")]
    UnknownVisibility(String),
    #[error("Unable to read '{path}': {reason}")]
    Unreadable { path: String, reason: String },
    #[error("Invalid options: {0}")]
    Malformed(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserOptions {
    #[serde(default)]
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub filecontent: Option<String>,
    /// `None` enables every category.
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub ignored_visibilities: Vec<String>,
}

impl ParserOptions {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            filecontent: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = Some(features.iter().map(|f| f.to_string()).collect());
        self
    }

    pub fn ignoring(mut self, visibilities: &[&str]) -> Self {
        self.ignored_visibilities = visibilities.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Reads options from a JSON object, rejecting a non-array `features` value
    /// before deserializing the rest.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        if let Some(features) = value.get("features") {
            if !features.is_null() && !features.is_array() {
                return Err(ConfigError::FeaturesNotArray);
            }
        }
        serde_json::from_value(value.clone()).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Checks every option and loads the source text.
    pub fn validate(self) -> Result<ValidatedOptions, ConfigError> {
        let features = match &self.features {
            None => FeatureSet::all(),
            Some(names) => FeatureSet::from_names(names)?,
        };

        let mut ignored_visibilities = HashSet::new();
        for name in &self.ignored_visibilities {
            let visibility =
                Visibility::parse(name).ok_or_else(|| ConfigError::UnknownVisibility(name.clone()))?;
            ignored_visibilities.insert(visibility);
        }

        let source = match (&self.filename, self.filecontent) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingSource),
            (None, None) => return Err(ConfigError::MissingSource),
            (None, Some(content)) => content,
            (Some(path), None) => {
                std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        Ok(ValidatedOptions {
            source,
            filename: self.filename,
            features,
            ignored_visibilities,
        })
    }
}

/// Options that passed validation, with the source already loaded.
#[derive(Debug, Clone)]
pub struct ValidatedOptions {
    pub source: String,
    pub filename: Option<PathBuf>,
    pub features: FeatureSet,
    pub ignored_visibilities: HashSet<Visibility>,
}

impl ValidatedOptions {
    /// File name without directory or extension.
    pub fn file_stem(&self) -> Option<String> {
        self.filename
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FEATURES
// ═══════════════════════════════════════════════════════════════════════════════

/// Categories that are extracted and emitted for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSet {
    enabled: HashSet<Channel>,
}

impl FeatureSet {
    pub fn all() -> Self {
        Self {
            enabled: Channel::CATEGORIES.iter().copied().collect(),
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let mut enabled = HashSet::new();
        for name in names {
            let name = name.as_ref();
            match Channel::parse(name) {
                Some(Channel::End) | None => {
                    return Err(ConfigError::UnknownFeature(name.to_string()))
                }
                Some(channel) => {
                    enabled.insert(channel);
                }
            }
        }
        Ok(Self { enabled })
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.enabled.contains(&channel)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// A construct that was recognized but only partially understood.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "napi", napi(object))]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn new(code: &str, message: &str, line: u32, column: u32) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            line,
            column,
        }
    }

    /// Diagnostic positioned at byte `offset` of `source`.
    pub fn at(code: &str, message: &str, source: &str, offset: usize) -> Self {
        let (line, column) = line_column(source, offset);
        Self::new(code, message, line, column)
    }
}

/// 1-based line and column of byte `offset`.
pub fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|i| before[i + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count())
        + 1;
    (line as u32, column as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_source() {
        let err = ParserOptions::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "options.filename or options.filecontent is required"
        );
    }

    #[test]
    fn test_both_sources_rejected() {
        let mut options = ParserOptions::from_source("<template></template>");
        options.filename = Some("a.vue".into());
        assert_eq!(options.validate().unwrap_err(), ConfigError::ConflictingSource);
    }

    #[test]
    fn test_unknown_feature() {
        let err = ParserOptions::from_source("")
            .with_features(&["props", "unknown"])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown 'unknown' feature. Supported features: name, description, keywords, model, props, data, computed, methods, events, slots"
        );
    }

    #[test]
    fn test_features_must_be_array() {
        let value = serde_json::json!({ "filecontent": "", "features": "props" });
        assert_eq!(
            ParserOptions::from_json(&value).unwrap_err(),
            ConfigError::FeaturesNotArray
        );
    }

    #[test]
    fn test_json_options() {
        let value = serde_json::json!({
            "filecontent": "<template></template>",
            "features": ["props", "events"],
            "ignoredVisibilities": ["private"]
        });
        let validated = ParserOptions::from_json(&value).unwrap().validate().unwrap();
        assert!(validated.features.contains(Channel::Prop));
        assert!(validated.features.contains(Channel::Event));
        assert!(!validated.features.contains(Channel::Data));
        assert!(validated.ignored_visibilities.contains(&Visibility::Private));
    }

    #[test]
    fn test_empty_features_disable_everything() {
        let validated = ParserOptions::from_source("").with_features(&[]).validate().unwrap();
        for channel in Channel::CATEGORIES {
            assert!(!validated.features.contains(channel));
        }
    }

    #[test]
    fn test_unknown_visibility() {
        let err = ParserOptions::from_source("")
            .ignoring(&["internal"])
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownVisibility("internal".into()));
    }

    #[test]
    fn test_reads_file_source() {
        let mut file = tempfile::Builder::new().suffix(".vue").tempfile().unwrap();
        write!(file, "<template><div/></template>").unwrap();
        let validated = ParserOptions::from_path(file.path()).validate().unwrap();
        assert_eq!(validated.source, "<template><div/></template>");
        assert!(validated.file_stem().is_some());
    }

    #[test]
    fn test_unreadable_file() {
        let err = ParserOptions::from_path("/definitely/not/here.vue")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("ab\ncd", 0), (1, 1));
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
    }
}
