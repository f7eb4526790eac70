//! Catalog entity types.
//!
//! These types are the single source of truth for the shapes crossing the
//! façade boundary; serialized field names are snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-defined project owning classification rules and files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Only rules of active projects participate in classification.
    pub is_active: bool,
    /// UI hint only.
    #[serde(default)]
    pub is_favourite: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// A fresh active project; the store assigns id and timestamps on create.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            is_active: true,
            is_favourite: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How a rule's texts are matched against a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    StartsWith,
    Contains,
    EndsWith,
    Extension,
    Regex,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartsWith => "starts_with",
            Self::Contains => "contains",
            Self::EndsWith => "ends_with",
            Self::Extension => "extension",
            Self::Regex => "regex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starts_with" => Some(Self::StartsWith),
            "contains" => Some(Self::Contains),
            "ends_with" => Some(Self::EndsWith),
            "extension" => Some(Self::Extension),
            "regex" => Some(Self::Regex),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A name-matching rule assigning files to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub kind: RuleKind,
    /// JSON array of match texts, normalized by validation before storage.
    pub texts: String,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Lower values are evaluated first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// A fresh rule; `texts` is the stored JSON-array form, see [`texts_to_json`].
    pub fn new(
        project_id: impl Into<String>,
        name: impl Into<String>,
        kind: RuleKind,
        texts: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            project_id: project_id.into(),
            kind,
            texts: texts.into(),
            case_sensitive: false,
            priority: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Serialize a list of match texts into the stored JSON-array form.
pub fn texts_to_json(texts: &[&str]) -> String {
    serde_json::to_string(texts).unwrap_or_else(|_| "[]".to_string())
}

/// A file recorded by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default)]
    pub id: String,
    /// Absolute path; unique across the catalog.
    pub path: String,
    /// Leaf file name, original case preserved.
    pub name: String,
    /// Lower-cased extension without the leading dot; empty when absent.
    pub ext: String,
    pub size: i64,
    pub mtime: DateTime<Utc>,
    /// Owning project: a matched rule's project or the Incoming project.
    pub project_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        ext: impl Into<String>,
        size: i64,
        mtime: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            path: path.into(),
            name: name.into(),
            ext: ext.into(),
            size,
            mtime,
            project_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_kind_roundtrip() {
        for kind in [
            RuleKind::StartsWith,
            RuleKind::Contains,
            RuleKind::EndsWith,
            RuleKind::Extension,
            RuleKind::Regex,
        ] {
            assert_eq!(RuleKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RuleKind::parse("glob"), None);
    }

    #[test]
    fn rule_kind_serializes_snake_case() {
        let json = serde_json::to_string(&RuleKind::StartsWith).unwrap();
        assert_eq!(json, "\"starts_with\"");
    }

    #[test]
    fn texts_to_json_produces_a_json_array() {
        assert_eq!(texts_to_json(&["pdf", "docx"]), r#"["pdf","docx"]"#);
        assert_eq!(texts_to_json(&[]), "[]");
    }
}
