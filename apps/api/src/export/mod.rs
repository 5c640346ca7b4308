//! Exporter: renders a normalised `Document` to PDF bytes with a named template.
//!
//! Pages are US letter and use only base-14 fonts with WinAnsiEncoding, so no
//! font files are embedded. Text is wrapped with the static width tables in
//! `font_metrics`; content that runs past the bottom margin continues on a
//! new page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::debug;

use crate::models::resume::{Certification, Document, Education, Experience, Project};

pub mod archive;
pub mod font_metrics;
pub mod templates;

use font_metrics::FontMetricTable;
use templates::{Align, TemplateStyle};

pub use templates::{style, template_names, DEFAULT_TEMPLATE, TEMPLATES};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const BULLET_INDENT: f32 = 12.0;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

/// Renders `doc` with `template`; unknown template names use `default`.
pub fn render(doc: &Document, template: &str) -> Result<Vec<u8>, ExportError> {
    let style = style(template);
    let mut writer = PageWriter::new(style);

    writer.header(doc);

    if !doc.summary.trim().is_empty() {
        writer.heading("Professional Summary");
        writer.paragraph(&doc.summary, false);
    }

    if !doc.experiences.is_empty() {
        writer.heading("Professional Experience");
        for exp in &doc.experiences {
            writer.experience(exp);
        }
    }

    if !doc.education.is_empty() {
        writer.heading("Education");
        for edu in &doc.education {
            writer.education(edu);
        }
    }

    let skills: Vec<&str> = doc
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        writer.heading("Skills");
        writer.paragraph(&skills.join(", "), false);
    }

    if !doc.projects.is_empty() {
        writer.heading("Projects");
        for project in &doc.projects {
            writer.project(project);
        }
    }

    if !doc.certifications.is_empty() {
        writer.heading("Certifications");
        for cert in &doc.certifications {
            writer.certification(cert);
        }
    }

    let languages: Vec<String> = doc
        .languages
        .iter()
        .map(|l| l.display())
        .filter(|l| !l.trim().is_empty())
        .collect();
    if !languages.is_empty() {
        writer.heading("Languages");
        writer.paragraph(&languages.join(", "), false);
    }

    writer.finish()
}

/// Lays out text top to bottom, starting a new page when the cursor reaches
/// the bottom margin.
struct PageWriter {
    style: &'static TemplateStyle,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl PageWriter {
    fn new(style: &'static TemplateStyle) -> Self {
        Self {
            style,
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - style.margin,
        }
    }

    fn content_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * self.style.margin
    }

    fn metrics(&self, bold: bool) -> &'static FontMetricTable {
        self.style.family.metrics(bold)
    }

    fn line_height(&self, size: f32) -> f32 {
        size * self.style.leading
    }

    /// Moves to a new page when `height` does not fit above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height < self.style.margin && !self.ops.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
            self.y = PAGE_HEIGHT - self.style.margin;
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn draw_text(&mut self, x: f32, size: f32, bold: bool, color: (f32, f32, f32), text: &str) {
        let font = if bold { BOLD } else { REGULAR };
        let baseline = self.y - size;
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![real(color.0), real(color.1), real(color.2)]),
            Operation::new("Tf", vec![font.into(), real(size)]),
            Operation::new("Td", vec![real(x), real(baseline)]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Wrapped text block at `indent` from the left margin.
    fn lines(&mut self, text: &str, size: f32, bold: bool, color: (f32, f32, f32), indent: f32) {
        let width = self.content_width() - indent;
        let line_height = self.line_height(size);
        let wrapped = self.metrics(bold).wrap(text, size, width);
        for line in wrapped {
            self.reserve(line_height);
            self.draw_text(self.style.margin + indent, size, bold, color, &line);
            self.y -= line_height;
        }
    }

    fn aligned_line(&mut self, text: &str, size: f32, bold: bool, color: (f32, f32, f32)) {
        let line_height = self.line_height(size);
        let width = self.content_width();
        let wrapped = self.metrics(bold).wrap(text, size, width);
        for line in wrapped {
            let x = match self.style.header_align {
                Align::Left => self.style.margin,
                Align::Center => {
                    let w = self.metrics(bold).measure(&line, size);
                    self.style.margin + (width - w).max(0.0) / 2.0
                }
            };
            self.reserve(line_height);
            self.draw_text(x, size, bold, color, &line);
            self.y -= line_height;
        }
    }

    fn paragraph(&mut self, text: &str, bold: bool) {
        self.lines(text, self.style.body_size, bold, BLACK, 0.0);
    }

    fn bullet(&mut self, text: &str) {
        let size = self.style.body_size;
        let line_height = self.line_height(size);
        let width = self.content_width() - BULLET_INDENT;
        let wrapped = self.metrics(false).wrap(text, size, width);
        for (i, line) in wrapped.iter().enumerate() {
            self.reserve(line_height);
            if i == 0 {
                self.draw_text(self.style.margin + 2.0, size, false, BLACK, "•");
            }
            self.draw_text(self.style.margin + BULLET_INDENT, size, false, BLACK, line);
            self.y -= line_height;
        }
    }

    fn header(&mut self, doc: &Document) {
        let style = self.style;
        if !doc.name.trim().is_empty() {
            self.aligned_line(doc.name.trim(), style.name_size, true, style.accent);
            self.gap(2.0);
        }

        let mut contact: Vec<String> = Vec::new();
        for (label, value) in [
            ("", &doc.email),
            ("", &doc.phone),
            ("LinkedIn: ", &doc.linkedin),
            ("GitHub: ", &doc.github),
            ("", &doc.website),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                contact.push(format!("{label}{value}"));
            }
        }
        if !contact.is_empty() {
            self.aligned_line(&contact.join(" | "), style.body_size, false, MUTED);
        }
        self.gap(style.body_size * 0.6);
    }

    fn heading(&mut self, title: &str) {
        let style = self.style;
        let text = if style.uppercase_headings {
            title.to_uppercase()
        } else {
            title.to_string()
        };
        let line_height = self.line_height(style.heading_size);
        // keep a heading together with at least one body line
        self.reserve(line_height + self.line_height(style.body_size) + 4.0);
        self.gap(style.heading_size * 0.5);
        self.draw_text(style.margin, style.heading_size, true, style.accent, &text);
        self.y -= line_height;

        if style.heading_rule {
            let y = self.y + 2.0;
            let (r, g, b) = style.accent;
            self.ops.extend([
                Operation::new("RG", vec![real(r), real(g), real(b)]),
                Operation::new("w", vec![real(0.6)]),
                Operation::new("m", vec![real(style.margin), real(y)]),
                Operation::new("l", vec![real(PAGE_WIDTH - style.margin), real(y)]),
                Operation::new("S", vec![]),
            ]);
            self.gap(3.0);
        }
    }

    fn experience(&mut self, exp: &Experience) {
        let mut title = exp.title.trim().to_string();
        if !exp.company.trim().is_empty() {
            if title.is_empty() {
                title = exp.company.trim().to_string();
            } else {
                title = format!("{title} - {}", exp.company.trim());
            }
        }
        if !exp.period.trim().is_empty() {
            title = format!("{title} ({})", exp.period.trim());
        }
        if !title.is_empty() {
            self.paragraph(&title, true);
        }
        for bullet in exp.bullets.iter().filter(|b| !b.trim().is_empty()) {
            self.bullet(bullet);
        }
        self.gap(self.style.body_size * 0.5);
    }

    fn education(&mut self, edu: &Education) {
        let line = join_parts(&edu.degree, &edu.institution, &edu.year);
        if !line.is_empty() {
            self.paragraph(&line, true);
        }
        if !edu.gpa.trim().is_empty() {
            self.paragraph(&format!("GPA: {}", edu.gpa.trim()), false);
        }
        self.gap(self.style.body_size * 0.3);
    }

    fn project(&mut self, project: &Project) {
        let mut title = project.name.trim().to_string();
        if !project.technologies.trim().is_empty() {
            title = if title.is_empty() {
                project.technologies.trim().to_string()
            } else {
                format!("{title} - {}", project.technologies.trim())
            };
        }
        if !title.is_empty() {
            self.paragraph(&title, true);
        }
        if !project.description.trim().is_empty() {
            self.paragraph(&project.description, false);
        }
        if !project.url.trim().is_empty() {
            self.paragraph(&format!("URL: {}", project.url.trim()), false);
        }
        self.gap(self.style.body_size * 0.5);
    }

    fn certification(&mut self, cert: &Certification) {
        let line = join_parts(&cert.name, &cert.issuer, &cert.year);
        if !line.is_empty() {
            self.paragraph(&line, false);
        }
    }

    fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
        }
        debug!(
            "Rendering {} page(s) with template '{}'",
            self.pages.len(),
            self.style.name
        );
        assemble(self.style, self.pages)
    }
}

const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);
const MUTED: (f32, f32, f32) = (0.33, 0.33, 0.33);

fn real(v: f32) -> Object {
    Object::Real(v)
}

/// "first - second (third)", skipping empty parts.
fn join_parts(first: &str, second: &str, third: &str) -> String {
    let (first, second, third) = (first.trim(), second.trim(), third.trim());
    let mut out = match (first.is_empty(), second.is_empty()) {
        (false, false) => format!("{first} - {second}"),
        (false, true) => first.to_string(),
        (true, false) => second.to_string(),
        (true, true) => String::new(),
    };
    if !third.is_empty() {
        if out.is_empty() {
            out = third.to_string();
        } else {
            out = format!("{out} ({third})");
        }
    }
    out
}

/// Maps text onto WinAnsiEncoding bytes. Unmappable characters become '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

fn assemble(style: &TemplateStyle, pages: Vec<Vec<Operation>>) -> Result<Vec<u8>, ExportError> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(style.family.base_font(false)));
    let bold_id = doc.add_object(font_dictionary(style.family.base_font(true)));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(buf)
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Built-in data rendered by the template preview endpoint.
pub fn sample_document() -> Document {
    use crate::models::resume::Language;

    Document {
        name: "John Doe".into(),
        email: "john.doe@email.com".into(),
        phone: "+1 (555) 123-4567".into(),
        linkedin: "linkedin.com/in/johndoe".into(),
        summary: "Experienced software engineer with expertise in full-stack development. \
                  Passionate about building scalable applications and leading technical teams."
            .into(),
        experiences: vec![
            Experience {
                title: "Senior Software Engineer".into(),
                company: "Tech Company Inc.".into(),
                period: "2020 - Present".into(),
                bullets: vec![
                    "Led development of microservices architecture".into(),
                    "Improved system performance by 40%".into(),
                    "Mentored team of 5 junior developers".into(),
                ],
            },
            Experience {
                title: "Software Engineer".into(),
                company: "Startup Solutions".into(),
                period: "2018 - 2020".into(),
                bullets: vec![
                    "Developed RESTful APIs".into(),
                    "Implemented CI/CD pipelines".into(),
                    "Collaborated with cross-functional teams".into(),
                ],
            },
        ],
        education: vec![Education {
            degree: "Bachelor of Science in Computer Science".into(),
            institution: "University of Technology".into(),
            year: "2018".into(),
            gpa: String::new(),
        }],
        skills: ["Python", "JavaScript", "React", "Node.js", "AWS", "Docker"]
            .into_iter()
            .map(String::from)
            .collect(),
        projects: vec![Project {
            name: "E-Commerce Platform".into(),
            description: "Built scalable e-commerce platform handling 10K+ daily transactions"
                .into(),
            technologies: "React, Node.js, MongoDB".into(),
            url: String::new(),
        }],
        certifications: vec![Certification {
            name: "AWS Certified Solutions Architect".into(),
            issuer: "Amazon Web Services".into(),
            year: "2021".into(),
        }],
        languages: vec![
            Language::Plain("English".into()),
            Language::Detailed {
                name: "Spanish".into(),
                level: "Conversational".into(),
            },
        ],
        ..Default::default()
    }
}
