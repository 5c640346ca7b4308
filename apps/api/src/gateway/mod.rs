//! Generation Gateway: the seam between resume pipelines and the model.
//!
//! Every resume-producing call returns an untrusted JSON object (the
//! candidate). Candidates are never stored directly; they go through
//! `normalize::merge::resolve` first.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::llm_client::{LlmClient, LlmError};
use crate::models::resume::Document;

pub mod context;
pub mod prompts;

use context::render_context;

/// What an improve/tailor call works from.
#[derive(Debug, Clone)]
pub enum ResumeSource {
    Structured(Document),
    /// Text of the original upload, used when no structured version exists.
    RawText(String),
}

impl ResumeSource {
    /// The text block handed to the model.
    pub fn context(&self) -> String {
        match self {
            ResumeSource::Structured(doc) => render_context(doc),
            ResumeSource::RawText(text) => text.trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            ResumeSource::Structured(doc) => doc.is_blank(),
            ResumeSource::RawText(text) => text.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreComponent {
    pub score: f64,
    pub max_score: f64,
    pub description: String,
}

/// ATS compatibility analysis. Missing keys in the model output default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsReport {
    pub overall_score: f64,
    pub score_breakdown: BTreeMap<String, ScoreComponent>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl AtsReport {
    pub fn from_candidate(candidate: Map<String, Value>) -> Result<Self, LlmError> {
        let report: AtsReport = serde_json::from_value(Value::Object(candidate))?;
        Ok(report)
    }
}

#[async_trait]
pub trait ResumeGateway: Send + Sync {
    /// Writes a full resume from user-entered information.
    async fn generate(
        &self,
        info: &Document,
        job_description: Option<&str>,
    ) -> Result<Map<String, Value>, LlmError>;

    async fn improve(
        &self,
        source: &ResumeSource,
        instructions: &[String],
        tone: &str,
    ) -> Result<Map<String, Value>, LlmError>;

    async fn tailor(
        &self,
        source: &ResumeSource,
        job_description: &str,
    ) -> Result<Map<String, Value>, LlmError>;

    async fn ats_score(&self, document: &Document, job_description: &str)
        -> Result<AtsReport, LlmError>;
}

/// Gateway backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmGateway {
    llm: LlmClient,
}

impl LlmGateway {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeGateway for LlmGateway {
    async fn generate(
        &self,
        info: &Document,
        job_description: Option<&str>,
    ) -> Result<Map<String, Value>, LlmError> {
        info!(
            "Generating resume (job description: {})",
            job_description.is_some()
        );
        let prompt = prompts::generate_prompt(&render_context(info), job_description);
        self.llm.call_object(&prompt, prompts::WRITER_SYSTEM).await
    }

    async fn improve(
        &self,
        source: &ResumeSource,
        instructions: &[String],
        tone: &str,
    ) -> Result<Map<String, Value>, LlmError> {
        info!(
            "Improving resume (tone: {tone}, instructions: {})",
            instructions.len()
        );
        let prompt = prompts::improve_prompt(&source.context(), instructions, tone);
        self.llm.call_object(&prompt, prompts::WRITER_SYSTEM).await
    }

    async fn tailor(
        &self,
        source: &ResumeSource,
        job_description: &str,
    ) -> Result<Map<String, Value>, LlmError> {
        info!("Tailoring resume to job description");
        let prompt = prompts::tailor_prompt(&source.context(), job_description);
        self.llm.call_object(&prompt, prompts::WRITER_SYSTEM).await
    }

    async fn ats_score(
        &self,
        document: &Document,
        job_description: &str,
    ) -> Result<AtsReport, LlmError> {
        let prompt = prompts::ats_prompt(&render_context(document), job_description);
        let candidate = self.llm.call_object(&prompt, prompts::ATS_SYSTEM).await?;
        AtsReport::from_candidate(candidate)
    }
}
