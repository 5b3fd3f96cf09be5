//! Declarative settings consumed by the setup passes.
//!
//! These are plain serde types so front ends can load them from any format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Settings for building a generation plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Exchangeable set settings.
    pub exchange: ExchangeSettings,

    /// Per-type overrides, applied with precedence over code-declared attributes.
    pub types: Vec<TypeOverride>,

    /// Extra family aliases: alias name → qualified type name.
    pub families: BTreeMap<String, String>,
}

/// Exchangeable set settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    /// When false the target language opts out of exchange and the result is empty.
    pub enabled: bool,

    /// Unsupported structural leaf types, by data type name.
    pub exclude: Vec<String>,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            exclude: Vec::new(),
        }
    }
}

/// Configuration entry overriding the placement of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeOverride {
    /// Name of the configured type (qualified, or a family alias).
    #[serde(rename = "type")]
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Exported name of the generated type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_folder_as: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_file_as: Option<String>,
}

impl TypeOverride {
    /// Override for the type named `target` (qualified name or family alias).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Place the artifact in `folder`.
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Write the artifact to `file_name`.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Export the generated type as `type_name`.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Share the folder of the named type.
    pub fn same_folder_as(mut self, target: impl Into<String>) -> Self {
        self.same_folder_as = Some(target.into());
        self
    }

    /// Share the folder and file of the named type.
    pub fn same_file_as(mut self, target: impl Into<String>) -> Self {
        self.same_file_as = Some(target.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PlanSettings::default();
        assert!(settings.exchange.enabled);
        assert!(settings.exchange.exclude.is_empty());
        assert!(settings.types.is_empty());
    }

    #[test]
    fn test_parse_json_override() {
        let json = r#"{
            "exchange": { "enabled": false },
            "types": [{ "type": "app.User", "folder": "models", "file_name": "user.out" }]
        }"#;
        let settings: PlanSettings = serde_json::from_str(json).unwrap();
        assert!(!settings.exchange.enabled);
        assert_eq!(
            settings.types,
            vec![TypeOverride::new("app.User")
                .folder("models")
                .file_name("user.out")]
        );
    }

    #[test]
    fn test_override_rejects_unknown_fields() {
        let json = r#"{ "type": "app.User", "colour": "red" }"#;
        assert!(serde_json::from_str::<TypeOverride>(json).is_err());
    }

    #[test]
    fn test_override_serializes_only_set_fields() {
        let entry = TypeOverride::new("app.User").same_file_as("app.Role");
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"type":"app.User","same_file_as":"app.Role"}"#
        );
    }
}
