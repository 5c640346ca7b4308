//! Field Normalizer: reshapes loosely-typed resume JSON into a canonical `Document`.
//!
//! Every value is classified once into a [`Shape`], and the shape selects one
//! adapter per representation (`from_text`, `from_record`, `from_scalar`).
//! Normalisation reshapes, it never filters: the only entries ever dropped are
//! skills that stringify to whitespace.

pub mod merge;

use serde_json::{Map, Value};

use crate::models::resume::{
    Certification, Document, Education, Experience, Language, Project,
};

// ────────────────────────────────────────────────────────────────────────────
// Input classification
// ────────────────────────────────────────────────────────────────────────────

/// The input kinds a raw field may arrive as.
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Absent,
    Null,
    Text(&'a str),
    Record(&'a Map<String, Value>),
    List(&'a [Value]),
    /// Numbers and booleans.
    Scalar(&'a Value),
}

impl<'a> Shape<'a> {
    pub fn of(value: Option<&'a Value>) -> Self {
        match value {
            None => Shape::Absent,
            Some(Value::Null) => Shape::Null,
            Some(Value::String(s)) => Shape::Text(s),
            Some(Value::Object(map)) => Shape::Record(map),
            Some(Value::Array(items)) => Shape::List(items),
            Some(other) => Shape::Scalar(other),
        }
    }
}

/// One adapter per source representation.
pub trait Normalize: Sized {
    /// Bare string: used as the primary display field.
    fn from_text(text: &str) -> Self;

    /// Mapping: recognised keys with aliases, missing keys default to "".
    fn from_record(record: &Map<String, Value>) -> Self;

    /// Numbers, booleans and nested lists are stringified.
    fn from_scalar(value: &Value) -> Self {
        Self::from_text(&stringify(value))
    }
}

/// Normalises a single list entry. Null entries become blank entries so that
/// list length is preserved.
pub fn normalize_entry<T: Normalize>(value: &Value) -> T {
    match Shape::of(Some(value)) {
        Shape::Text(text) => T::from_text(text),
        Shape::Record(record) => T::from_record(record),
        Shape::Absent | Shape::Null => T::from_text(""),
        Shape::List(_) | Shape::Scalar(_) => T::from_scalar(value),
    }
}

/// Normalises a list-typed field: null/absent → `[]`, a single value → one
/// entry, a list → each entry independently, order preserved.
pub fn normalize_list<T: Normalize>(value: Option<&Value>) -> Vec<T> {
    match Shape::of(value) {
        Shape::Absent | Shape::Null => Vec::new(),
        Shape::List(items) => items.iter().map(normalize_entry).collect(),
        Shape::Text(text) => vec![T::from_text(text)],
        Shape::Record(record) => vec![T::from_record(record)],
        Shape::Scalar(scalar) => vec![T::from_scalar(scalar)],
    }
}

/// Skills are the one field where blank entries are dropped.
pub fn normalize_skills(value: Option<&Value>) -> Vec<String> {
    normalize_list::<String>(value)
        .into_iter()
        .filter(|skill| !skill.trim().is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// Normalises a whole resume mapping.
pub fn document(record: &Map<String, Value>) -> Document {
    Document {
        name: text_field(record, &["name", "full_name"]),
        email: text_field(record, &["email"]),
        phone: text_field(record, &["phone"]),
        linkedin: text_field(record, &["linkedin"]),
        github: text_field(record, &["github"]),
        website: text_field(record, &["website"]),
        summary: text_field(record, &["summary"]),
        experiences: normalize_list(record.get("experiences")),
        education: normalize_list(record.get("education")),
        skills: normalize_skills(record.get("skills")),
        projects: normalize_list(record.get("projects")),
        certifications: normalize_list(record.get("certifications")),
        languages: normalize_list(record.get("languages")),
    }
}

/// Normalises any JSON value; anything but an object yields an empty document.
pub fn document_from_value(value: &Value) -> Document {
    match Shape::of(Some(value)) {
        Shape::Record(record) => document(record),
        _ => Document::default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-type adapters
// ────────────────────────────────────────────────────────────────────────────

impl Normalize for String {
    fn from_text(text: &str) -> Self {
        text.to_string()
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        text_field(record, &["name", "skill", "technology"])
    }
}

impl Normalize for Experience {
    fn from_text(text: &str) -> Self {
        Experience {
            title: text.to_string(),
            ..Default::default()
        }
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        let bullets = match Shape::of(record.get("bullets")) {
            Shape::Absent | Shape::Null => legacy_bullets(record),
            _ => normalize_list::<String>(record.get("bullets")),
        };
        Experience {
            title: text_field(record, &["title", "role", "position"]),
            company: text_field(record, &["company", "employer"]),
            period: text_field(record, &["period", "duration"]),
            bullets,
        }
    }
}

/// `description` becomes the first bullet, followed by any `achievements`.
fn legacy_bullets(record: &Map<String, Value>) -> Vec<String> {
    let mut bullets = Vec::new();
    let description = text_field(record, &["description"]);
    if !description.is_empty() {
        bullets.push(description);
    }
    bullets.extend(
        normalize_list::<String>(record.get("achievements"))
            .into_iter()
            .filter(|a| !a.is_empty()),
    );
    bullets
}

impl Normalize for Education {
    fn from_text(text: &str) -> Self {
        Education {
            degree: text.to_string(),
            ..Default::default()
        }
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        Education {
            degree: text_field(record, &["degree", "qualification"]),
            institution: text_field(record, &["institution", "school", "university"]),
            year: text_field(record, &["year", "graduation_year"]),
            gpa: text_field(record, &["gpa"]),
        }
    }
}

impl Normalize for Project {
    fn from_text(text: &str) -> Self {
        Project {
            name: text.to_string(),
            ..Default::default()
        }
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        let technologies = match record.get("technologies").or_else(|| record.get("tech_stack")) {
            Some(Value::Array(items)) => items
                .iter()
                .map(normalize_entry::<String>)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            other => other.map(stringify).unwrap_or_default(),
        };
        Project {
            name: text_field(record, &["name", "title"]),
            description: text_field(record, &["description"]),
            technologies,
            url: text_field(record, &["url", "link"]),
        }
    }
}

impl Normalize for Certification {
    fn from_text(text: &str) -> Self {
        Certification {
            name: text.to_string(),
            ..Default::default()
        }
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        Certification {
            name: text_field(record, &["name", "certification"]),
            issuer: text_field(record, &["issuer", "issuing_organization"]),
            year: text_field(record, &["year"]),
        }
    }
}

impl Normalize for Language {
    fn from_text(text: &str) -> Self {
        Language::Plain(text.to_string())
    }

    fn from_record(record: &Map<String, Value>) -> Self {
        Language::Detailed {
            name: text_field(record, &["name", "language"]),
            level: text_field(record, &["level", "proficiency"]),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads the first alias holding a non-empty value.
fn text_field(record: &Map<String, Value>, aliases: &[&str]) -> String {
    aliases
        .iter()
        .filter_map(|key| record.get(*key))
        .map(stringify)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
