// Shared prompt fragments. Operation-specific prompts live in
// `gateway/prompts.rs`.

/// Shape every resume-producing call must return.
pub const RESUME_JSON_SHAPE: &str = r#"{
    "name": "Full Name",
    "email": "",
    "phone": "",
    "linkedin": "",
    "github": "",
    "website": "",
    "summary": "2-3 sentence professional summary highlighting key achievements and value proposition",
    "experiences": [
        {
            "title": "Job Title",
            "company": "Company Name",
            "period": "Start Date - End Date",
            "bullets": ["Achievement with quantifiable metrics", "Achievement with impact"]
        }
    ],
    "skills": ["Skill 1", "Skill 2", "Skill 3"],
    "education": [
        {
            "degree": "Degree Name",
            "institution": "Institution Name",
            "year": "Year",
            "gpa": "GPA if notable"
        }
    ],
    "projects": [
        {
            "name": "Project Name",
            "description": "Project description with impact",
            "technologies": "Tech stack used"
        }
    ],
    "certifications": [
        {
            "name": "Certification Name",
            "issuer": "Issuing Organization",
            "year": "Year"
        }
    ],
    "languages": ["Language 1", "Language 2"]
}"#;

/// Appended to every resume-producing prompt.
pub const PRESERVATION_INSTRUCTION: &str = "\
    CRITICAL: Preserve all contact information exactly as provided; never invent contact details. \
    Include ALL projects, certifications, and languages from the provided data, unchanged. \
    Keep every factual detail (employers, dates, degrees) accurate.";
