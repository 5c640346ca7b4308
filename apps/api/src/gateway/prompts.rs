use crate::llm_client::prompts::{PRESERVATION_INSTRUCTION, RESUME_JSON_SHAPE};

pub const WRITER_SYSTEM: &str = "You are a professional resume writer. \
    Rewrite resumes to be concise, measurable, and action-driven. \
    Always return a single valid JSON object and nothing else.";

pub const ATS_SYSTEM: &str = "You are an expert ATS (Applicant Tracking System) analyzer. \
    Analyze resumes against job descriptions and provide detailed scoring. \
    Always return a single valid JSON object and nothing else.";

const NONE_PROVIDED: &str = "None provided";

pub fn generate_prompt(context: &str, job_description: Option<&str>) -> String {
    let context = if context.is_empty() { NONE_PROVIDED } else { context };
    let job_context = match job_description {
        Some(jd) if !jd.trim().is_empty() => {
            format!("\nTailor the resume for this job description:\n{jd}\n")
        }
        _ => String::new(),
    };
    format!(
        r#"Create a professional, ATS-friendly resume from the following information.

{context}
{job_context}
Return valid JSON with this structure:
{RESUME_JSON_SHAPE}

IMPORTANT:
- Extract and list ALL skills mentioned
- Create impactful, metric-driven bullet points
- Make the summary compelling and ATS-optimized
- If a contact field is not provided, return an empty string for it
{PRESERVATION_INSTRUCTION}"#
    )
}

pub fn improve_prompt(context: &str, instructions: &[String], tone: &str) -> String {
    let tone = if tone.trim().is_empty() { "professional" } else { tone.trim() };
    let improvements = if instructions.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = instructions.iter().map(|i| format!("- {i}")).collect();
        format!("\nFocus on these improvements:\n{}\n", lines.join("\n"))
    };
    format!(
        r#"Improve and enhance this resume to make it more professional, impactful, and ATS-friendly.
Write in a {tone} tone.
{improvements}
Return valid JSON with this structure:
{RESUME_JSON_SHAPE}

IMPORTANT:
- Extract and list ALL skills mentioned
- Enhance achievements with quantifiable metrics where possible
{PRESERVATION_INSTRUCTION}

Resume data:
{context}"#
    )
}

pub fn tailor_prompt(context: &str, job_description: &str) -> String {
    format!(
        r#"Tailor this resume for the job description below. Reorder and reword content to
emphasise the most relevant experience and mirror the job's keywords where truthful.

Return valid JSON with this structure:
{RESUME_JSON_SHAPE}

IMPORTANT:
- Prioritise skills and bullets that match the job requirements
- Do not invent experience, employers, or qualifications
{PRESERVATION_INSTRUCTION}

Resume data:
{context}

Job Description:
{job_description}"#
    )
}

pub fn ats_prompt(resume_text: &str, job_description: &str) -> String {
    format!(
        r#"Analyze this resume against the job description and calculate an ATS compatibility score.

Resume:
{resume_text}

Job Description:
{job_description}

Return valid JSON with this structure:
{{
    "overall_score": 85,
    "score_breakdown": {{
        "skills_match": {{"score": 90, "max_score": 100, "description": "Percentage of required skills found in resume"}},
        "keyword_match": {{"score": 80, "max_score": 100, "description": "Relevance of keywords and phrases from job description"}},
        "experience_relevance": {{"score": 85, "max_score": 100, "description": "How well work experience matches job requirements"}},
        "education_match": {{"score": 90, "max_score": 100, "description": "Education qualifications matching job requirements"}},
        "formatting": {{"score": 95, "max_score": 100, "description": "ATS-friendly formatting and structure"}}
    }},
    "matched_skills": ["Skill"],
    "missing_skills": ["Skill"],
    "recommendations": ["Actionable recommendation"],
    "strengths": ["Strength"],
    "weaknesses": ["Weakness"]
}}

The overall score is a weighted average of the breakdown, with skills and keywords weighted most.
Provide specific, actionable recommendations."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prompt_includes_job_context_only_when_given() {
        let with_jd = generate_prompt("Name: Ada", Some("Rust engineer"));
        assert!(with_jd.contains("Tailor the resume for this job description:\nRust engineer"));

        let without = generate_prompt("Name: Ada", Some("   "));
        assert!(!without.contains("Tailor the resume"));
    }

    #[test]
    fn test_improve_prompt_lists_instructions_and_tone() {
        let prompt = improve_prompt("Name: Ada", &["Add metrics".into()], "confident");
        assert!(prompt.contains("Write in a confident tone."));
        assert!(prompt.contains("- Add metrics"));
        assert!(prompt.ends_with("Name: Ada"));
    }

    #[test]
    fn test_empty_tone_defaults_to_professional() {
        assert!(improve_prompt("x", &[], " ").contains("Write in a professional tone."));
    }
}
