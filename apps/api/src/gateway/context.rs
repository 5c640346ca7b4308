use std::fmt::Write as _;

use crate::models::resume::Document;

/// Renders a document as the plain-text context block fed to the model.
/// Empty fields and sections are omitted.
pub fn render_context(doc: &Document) -> String {
    let mut out = String::new();

    for (label, value) in [
        ("Name", &doc.name),
        ("Email", &doc.email),
        ("Phone", &doc.phone),
        ("LinkedIn", &doc.linkedin),
        ("GitHub", &doc.github),
        ("Website", &doc.website),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "{label}: {value}");
        }
    }

    if !doc.summary.is_empty() {
        let _ = write!(out, "\nSummary:\n{}\n", doc.summary);
    }

    if !doc.experiences.is_empty() {
        out.push_str("\nWork Experience:\n");
        for exp in &doc.experiences {
            let _ = write!(out, "- {} at {}", exp.title, exp.company);
            if !exp.period.is_empty() {
                let _ = write!(out, " ({})", exp.period);
            }
            out.push('\n');
            for bullet in &exp.bullets {
                let _ = writeln!(out, "  • {bullet}");
            }
        }
    }

    if !doc.education.is_empty() {
        out.push_str("\nEducation:\n");
        for edu in &doc.education {
            let _ = write!(out, "- {} from {}", edu.degree, edu.institution);
            if !edu.year.is_empty() {
                let _ = write!(out, " ({})", edu.year);
            }
            if !edu.gpa.is_empty() {
                let _ = write!(out, " - GPA: {}", edu.gpa);
            }
            out.push('\n');
        }
    }

    if !doc.skills.is_empty() {
        let _ = writeln!(out, "\nSkills: {}", doc.skills.join(", "));
    }

    if !doc.projects.is_empty() {
        out.push_str("\nProjects:\n");
        for proj in &doc.projects {
            let name = if proj.name.is_empty() { "Project" } else { proj.name.as_str() };
            let _ = write!(out, "- {name}");
            if !proj.description.is_empty() {
                let _ = write!(out, ": {}", proj.description);
            }
            if !proj.technologies.is_empty() {
                let _ = write!(out, " (Tech: {})", proj.technologies);
            }
            out.push('\n');
        }
    }

    if !doc.certifications.is_empty() {
        let certs: Vec<String> = doc
            .certifications
            .iter()
            .map(|c| {
                if c.issuer.is_empty() {
                    c.name.clone()
                } else {
                    format!("{} ({})", c.name, c.issuer)
                }
            })
            .collect();
        let _ = writeln!(out, "\nCertifications: {}", certs.join(", "));
    }

    if !doc.languages.is_empty() {
        let langs: Vec<String> = doc.languages.iter().map(|l| l.display()).collect();
        let _ = writeln!(out, "\nLanguages: {}", langs.join(", "));
    }

    out.trim_end().to_string()
}
