use super::font_metrics::FontFamily;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A static visual style. Every template draws the same sections in the same
/// order; only typography, colour and spacing differ.
#[derive(Debug, Clone)]
pub struct TemplateStyle {
    pub name: &'static str,
    pub description: &'static str,
    pub family: FontFamily,
    pub name_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    /// RGB in 0.0..=1.0, used for the name, headings and rules.
    pub accent: (f32, f32, f32),
    pub header_align: Align,
    /// Thin rule under each section heading.
    pub heading_rule: bool,
    pub uppercase_headings: bool,
    /// Page margin in points on all sides.
    pub margin: f32,
    /// Baseline-to-baseline distance as a multiple of the font size.
    pub leading: f32,
}

pub const DEFAULT_TEMPLATE: &str = "default";

pub static TEMPLATES: [TemplateStyle; 8] = [
    TemplateStyle {
        name: "default",
        description: "Standard professional resume with clean layout",
        family: FontFamily::Helvetica,
        name_size: 22.0,
        heading_size: 13.0,
        body_size: 10.0,
        accent: (0.17, 0.24, 0.31),
        header_align: Align::Left,
        heading_rule: false,
        uppercase_headings: false,
        margin: 54.0,
        leading: 1.35,
    },
    TemplateStyle {
        name: "modern",
        description: "Contemporary design with a coloured header and modern styling",
        family: FontFamily::Helvetica,
        name_size: 26.0,
        heading_size: 13.0,
        body_size: 10.0,
        accent: (0.09, 0.47, 0.55),
        header_align: Align::Left,
        heading_rule: true,
        uppercase_headings: true,
        margin: 50.0,
        leading: 1.4,
    },
    TemplateStyle {
        name: "classic",
        description: "Traditional Times format, perfect for conservative industries",
        family: FontFamily::Times,
        name_size: 22.0,
        heading_size: 12.0,
        body_size: 11.0,
        accent: (0.0, 0.0, 0.0),
        header_align: Align::Center,
        heading_rule: true,
        uppercase_headings: true,
        margin: 60.0,
        leading: 1.3,
    },
    TemplateStyle {
        name: "minimal",
        description: "Clean, minimalist design with focus on content",
        family: FontFamily::Helvetica,
        name_size: 20.0,
        heading_size: 11.0,
        body_size: 10.0,
        accent: (0.35, 0.35, 0.35),
        header_align: Align::Left,
        heading_rule: false,
        uppercase_headings: false,
        margin: 64.0,
        leading: 1.45,
    },
    TemplateStyle {
        name: "professional",
        description: "Corporate blue design, perfect for business and corporate roles",
        family: FontFamily::Times,
        name_size: 24.0,
        heading_size: 13.0,
        body_size: 11.0,
        accent: (0.0, 0.2, 0.5),
        header_align: Align::Left,
        heading_rule: true,
        uppercase_headings: false,
        margin: 54.0,
        leading: 1.3,
    },
    TemplateStyle {
        name: "executive",
        description: "Elegant serif design for senior and executive positions",
        family: FontFamily::Times,
        name_size: 28.0,
        heading_size: 14.0,
        body_size: 11.0,
        accent: (0.45, 0.1, 0.15),
        header_align: Align::Center,
        heading_rule: true,
        uppercase_headings: true,
        margin: 60.0,
        leading: 1.35,
    },
    TemplateStyle {
        name: "tech",
        description: "Developer-focused design with monospace fonts and tech aesthetics",
        family: FontFamily::Courier,
        name_size: 20.0,
        heading_size: 12.0,
        body_size: 9.0,
        accent: (0.0, 0.45, 0.25),
        header_align: Align::Left,
        heading_rule: true,
        uppercase_headings: false,
        margin: 48.0,
        leading: 1.35,
    },
    TemplateStyle {
        name: "compact",
        description: "Dense single-page layout with tight spacing, clean and ATS-friendly",
        family: FontFamily::Helvetica,
        name_size: 18.0,
        heading_size: 11.0,
        body_size: 9.0,
        accent: (0.1, 0.1, 0.1),
        header_align: Align::Left,
        heading_rule: true,
        uppercase_headings: true,
        margin: 40.0,
        leading: 1.25,
    },
];

/// Looks up a template by name; unknown names resolve to `default`.
pub fn style(name: &str) -> &'static TemplateStyle {
    let name = name.trim();
    TEMPLATES
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or(&TEMPLATES[0])
}

pub fn template_names() -> Vec<&'static str> {
    TEMPLATES.iter().map(|t| t.name).collect()
}
