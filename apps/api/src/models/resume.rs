use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Canonical resume representation.
///
/// Built only through `normalize` (never deserialized directly), so the
/// preservable list fields are always present as lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub summary: String,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,
    pub languages: Vec<Language>,
}

impl Document {
    /// True when no field carries any content.
    pub fn is_blank(&self) -> bool {
        self == &Document::default()
    }

    /// Whether a request body carries enough to stand in for the stored
    /// resume. Contact details or preservable lists alone do not.
    pub fn has_core_content(&self) -> bool {
        [&self.name, &self.email, &self.summary]
            .iter()
            .any(|s| !s.trim().is_empty())
            || !self.experiences.is_empty()
            || !self.education.is_empty()
            || !self.skills.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub period: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: String,
    pub gpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    /// Comma-separated; list input is joined with ", ".
    pub technologies: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub year: String,
}

/// Languages keep the caller's shape: a bare name or a name with a level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Language {
    Plain(String),
    Detailed { name: String, level: String },
}

impl Language {
    /// "Spanish (C1)" or just "Spanish".
    pub fn display(&self) -> String {
        match self {
            Language::Plain(name) => name.clone(),
            Language::Detailed { name, level } if level.is_empty() => name.clone(),
            Language::Detailed { name, level } => format!("{name} ({level})"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Versioning
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Raw,
    Improved,
    Tailored,
}

impl VersionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Raw => "raw",
            VersionType::Improved => "improved",
            VersionType::Tailored => "tailored",
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(VersionType::Raw),
            "improved" => Ok(VersionType::Improved),
            "tailored" => Ok(VersionType::Tailored),
            other => Err(format!(
                "Unknown version type '{other}'. Expected one of: latest, raw, improved, tailored"
            )),
        }
    }
}

/// Which snapshot "latest" resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFilter {
    /// Most recent snapshot of any type.
    Latest,
    Only(VersionType),
}

impl FromStr for VersionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("latest") {
            return Ok(VersionFilter::Latest);
        }
        s.parse().map(VersionFilter::Only)
    }
}

impl fmt::Display for VersionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionFilter::Latest => f.write_str("latest"),
            VersionFilter::Only(t) => t.fmt(f),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rows
// ────────────────────────────────────────────────────────────────────────────

/// The originating raw record. Created once per resume id, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// A stored snapshot. `content` is kept as JSON and normalised on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredVersion {
    pub resume_id: Uuid,
    pub content: Value,
    pub version_type: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_content_ignores_contact_and_lists() {
        let partial = Document {
            phone: "555".into(),
            github: "ada".into(),
            projects: vec![Project::default()],
            ..Default::default()
        };
        assert!(!partial.is_blank());
        assert!(!partial.has_core_content());

        let with_skills = Document {
            skills: vec!["Rust".into()],
            ..Default::default()
        };
        assert!(with_skills.has_core_content());
    }

    #[test]
    fn test_version_filter_parses_latest_and_types() {
        assert_eq!("latest".parse::<VersionFilter>(), Ok(VersionFilter::Latest));
        assert_eq!("".parse::<VersionFilter>(), Ok(VersionFilter::Latest));
        assert_eq!(
            "Tailored".parse::<VersionFilter>(),
            Ok(VersionFilter::Only(VersionType::Tailored))
        );
        assert!("final".parse::<VersionFilter>().is_err());
    }

    #[test]
    fn test_language_display() {
        assert_eq!(Language::Plain("German".into()).display(), "German");
        let detailed = Language::Detailed {
            name: "Spanish".into(),
            level: "C1".into(),
        };
        assert_eq!(detailed.display(), "Spanish (C1)");
    }

    #[test]
    fn test_language_serializes_untagged() {
        let langs = vec![
            Language::Plain("French".into()),
            Language::Detailed {
                name: "Hindi".into(),
                level: "Native".into(),
            },
        ];
        let json = serde_json::to_value(&langs).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["French", {"name": "Hindi", "level": "Native"}])
        );
    }

    #[test]
    fn test_blank_document() {
        assert!(Document::default().is_blank());
        let doc = Document {
            name: "Ada".into(),
            ..Default::default()
        };
        assert!(!doc.is_blank());
    }
}
