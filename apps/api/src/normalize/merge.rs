//! Decides which side owns each preservable field after a generation call.
//!
//! Precedence per field (projects, certifications, languages), highest first:
//! 1. the caller's original list, when non-empty;
//! 2. the candidate's value, when the field is present (even if empty);
//! 3. an empty list.
//! A resolved value that is not a list is coerced to an empty list.
//!
//! Non-empty caller contact fields always overwrite the candidate's.
//! The resolver never fails.

use serde_json::{Map, Value};
use tracing::info;

use crate::models::resume::Document;
use crate::normalize::{self, normalize_entry, Normalize};

/// Where a resolved field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Original,
    Candidate,
    Empty,
}

/// Merges an untrusted generation candidate with the caller's original document.
pub fn resolve(original: &Document, candidate: &Map<String, Value>) -> Document {
    let mut merged = normalize::document(candidate);

    let (projects, projects_src) = resolve_field(&original.projects, candidate.get("projects"));
    let (certifications, certs_src) =
        resolve_field(&original.certifications, candidate.get("certifications"));
    let (languages, langs_src) = resolve_field(&original.languages, candidate.get("languages"));

    info!(
        "Merged preservable fields: projects={} ({:?}), certifications={} ({:?}), languages={} ({:?})",
        projects.len(),
        projects_src,
        certifications.len(),
        certs_src,
        languages.len(),
        langs_src
    );

    merged.projects = projects;
    merged.certifications = certifications;
    merged.languages = languages;

    apply_contact(&mut merged, original);
    merged
}

/// Resolves one preservable field.
pub fn resolve_field<T: Normalize + Clone>(
    original: &[T],
    candidate: Option<&Value>,
) -> (Vec<T>, Source) {
    if !original.is_empty() {
        return (original.to_vec(), Source::Original);
    }
    match candidate {
        Some(Value::Array(items)) => (
            items.iter().map(normalize_entry).collect(),
            Source::Candidate,
        ),
        // absent, or present but not a list
        _ => (Vec::new(), Source::Empty),
    }
}

/// Contact data supplied by the caller is never replaced by generated text.
fn apply_contact(merged: &mut Document, original: &Document) {
    let pairs = [
        (&mut merged.email, &original.email),
        (&mut merged.phone, &original.phone),
        (&mut merged.linkedin, &original.linkedin),
        (&mut merged.github, &original.github),
        (&mut merged.website, &original.website),
    ];
    for (target, supplied) in pairs {
        if !supplied.is_empty() {
            target.clone_from(supplied);
        }
    }
}

/// Fills empty preservable fields of `primary` from `fallback`.
///
/// Used when a caller supplies a document whose lists may be empty while a
/// stored version still holds them.
pub fn backfill_preservable(primary: &mut Document, fallback: &Document) {
    if primary.projects.is_empty() {
        primary.projects.clone_from(&fallback.projects);
    }
    if primary.certifications.is_empty() {
        primary.certifications.clone_from(&fallback.certifications);
    }
    if primary.languages.is_empty() {
        primary.languages.clone_from(&fallback.languages);
    }
}
