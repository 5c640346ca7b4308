//! Resume pipelines: create, improve, tailor, score, export.
//!
//! Each save follows the same order: gateway call, merge against the
//! caller's original, then one version write.

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export;
use crate::gateway::{context::render_context, AtsReport, ResumeGateway, ResumeSource};
use crate::models::resume::{Document, ResumeRecord, StoredVersion, VersionFilter, VersionType};
use crate::normalize::{
    self,
    merge::{backfill_preservable, resolve},
};
use crate::store::VersionStore;

#[derive(Debug)]
pub struct Created {
    pub resume_id: Uuid,
    pub version_type: VersionType,
    pub document: Document,
}

#[derive(Debug)]
pub struct Improved {
    pub resume_id: Uuid,
    pub document: Document,
    /// True when the id was unknown and a new record was created.
    pub created: bool,
}

pub struct ImproveRequest<'a> {
    pub resume_id: Uuid,
    pub tone: &'a str,
    pub improvements: &'a [String],
    /// Resume data from the request body. Used as the source only when it
    /// has core content; otherwise the stored version is improved.
    pub data: Option<Document>,
}

pub async fn create(
    store: &dyn VersionStore,
    gateway: &dyn ResumeGateway,
    info: &Document,
    job_description: Option<&str>,
) -> Result<Created, AppError> {
    let job_description = job_description.filter(|jd| !jd.trim().is_empty());

    let candidate = gateway.generate(info, job_description).await?;
    let document = resolve(info, &candidate);

    let mut raw_lines = vec![format!("Name: {}", info.name)];
    if !info.email.trim().is_empty() {
        raw_lines.push(format!("Email: {}", info.email));
    }
    raw_lines.push(format!("\nSummary: {}", document.summary));
    let raw_text = raw_lines.join("\n");

    let resume_id = store.create_resume(&raw_text).await?;
    let version_type = if job_description.is_some() {
        VersionType::Tailored
    } else {
        VersionType::Improved
    };
    store.save_version(resume_id, &document, version_type).await?;

    info!("Created resume {resume_id} ({version_type})");
    Ok(Created {
        resume_id,
        version_type,
        document,
    })
}

pub async fn improve(
    store: &dyn VersionStore,
    gateway: &dyn ResumeGateway,
    req: ImproveRequest<'_>,
) -> Result<Improved, AppError> {
    let record = store.get_resume(req.resume_id).await?;
    let data = req.data.filter(Document::has_core_content);

    let (resume_id, created, original, source) = match (record, data) {
        (None, None) => {
            return Err(AppError::NotFound(format!(
                "Resume {} not found",
                req.resume_id
            )))
        }
        (None, Some(data)) => {
            let new_id = store.create_resume(&render_context(&data)).await?;
            info!(
                "Resume {} not found; created {new_id} from supplied data",
                req.resume_id
            );
            (new_id, true, data.clone(), ResumeSource::Structured(data))
        }
        (Some(record), Some(mut data)) => {
            if let Some(stored) = latest_document(store, record.id).await? {
                backfill_preservable(&mut data, &stored);
            }
            (record.id, false, data.clone(), ResumeSource::Structured(data))
        }
        (Some(record), None) => {
            let (original, source) = stored_source(store, &record).await?;
            (record.id, false, original, source)
        }
    };

    if source.is_blank() {
        return Err(AppError::Validation(
            "Resume has no content to improve".to_string(),
        ));
    }

    let candidate = gateway
        .improve(&source, req.improvements, req.tone)
        .await?;
    let document = resolve(&original, &candidate);
    store
        .save_version(resume_id, &document, VersionType::Improved)
        .await?;

    info!("Saved improved version for resume {resume_id}");
    Ok(Improved {
        resume_id,
        document,
        created,
    })
}

pub async fn tailor(
    store: &dyn VersionStore,
    gateway: &dyn ResumeGateway,
    resume_id: Uuid,
    job_description: &str,
) -> Result<Document, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }
    let record = require_record(store, resume_id).await?;
    let (original, source) = stored_source(store, &record).await?;
    if source.is_blank() {
        return Err(AppError::Validation(
            "Resume has no content to tailor".to_string(),
        ));
    }

    let candidate = gateway.tailor(&source, job_description).await?;
    let document = resolve(&original, &candidate);
    store
        .save_version(resume_id, &document, VersionType::Tailored)
        .await?;

    info!("Saved tailored version for resume {resume_id}");
    Ok(document)
}

pub async fn ats_score(
    store: &dyn VersionStore,
    gateway: &dyn ResumeGateway,
    resume_id: Uuid,
    job_description: &str,
) -> Result<AtsReport, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }
    let document = latest_document(store, resume_id).await?.ok_or_else(|| {
        AppError::NotFound(format!("No resume version found for {resume_id}"))
    })?;
    Ok(gateway.ats_score(&document, job_description).await?)
}

/// Loads the version selected by `filter` and renders it.
pub async fn export(
    store: &dyn VersionStore,
    resume_id: Uuid,
    filter: VersionFilter,
    template: &str,
) -> Result<Vec<u8>, AppError> {
    require_record(store, resume_id).await?;
    let version = store
        .latest_version(resume_id, filter)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No {filter} version found for resume {resume_id}"
            ))
        })?;
    let document = stored_document(&version);
    render_pdf(document, template).await
}

/// PDF layout is CPU-bound, so it runs on the blocking pool.
pub async fn render_pdf(document: Document, template: &str) -> Result<Vec<u8>, AppError> {
    let template = template.to_string();
    tokio::task::spawn_blocking(move || export::render(&document, &template))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))?
        .map_err(AppError::from)
}

pub async fn require_record(
    store: &dyn VersionStore,
    resume_id: Uuid,
) -> Result<ResumeRecord, AppError> {
    store
        .get_resume(resume_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {resume_id} not found")))
}

async fn latest_document(
    store: &dyn VersionStore,
    resume_id: Uuid,
) -> Result<Option<Document>, AppError> {
    let version = store
        .latest_version(resume_id, VersionFilter::Latest)
        .await?;
    Ok(version.as_ref().map(stored_document))
}

/// Latest structured version, or the raw upload text when none exists.
/// The first element is the document the merge treats as the original.
async fn stored_source(
    store: &dyn VersionStore,
    record: &ResumeRecord,
) -> Result<(Document, ResumeSource), AppError> {
    Ok(match latest_document(store, record.id).await? {
        Some(doc) => (doc.clone(), ResumeSource::Structured(doc)),
        None => (
            Document::default(),
            ResumeSource::RawText(record.raw_text.clone()),
        ),
    })
}

/// Stored content may be a JSON object or a string holding one.
pub fn stored_document(version: &StoredVersion) -> Document {
    match &version.content {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => normalize::document_from_value(&value),
            Err(e) => {
                warn!(
                    "Stored content for resume {} is not JSON: {e}",
                    version.resume_id
                );
                Document::default()
            }
        },
        other => normalize::document_from_value(other),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::resume::{Experience, Project};
    use crate::store::MemoryVersionStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Map};
    use std::sync::Mutex;

    /// Gateway that returns canned candidates and records what it was given.
    #[derive(Default)]
    pub(crate) struct StubGateway {
        pub candidate: Map<String, Value>,
        pub seen_context: Mutex<Vec<String>>,
    }

    impl StubGateway {
        pub(crate) fn returning(candidate: Value) -> Self {
            let Value::Object(candidate) = candidate else {
                panic!("candidate must be an object")
            };
            Self {
                candidate,
                ..Default::default()
            }
        }

        fn record(&self, source: &ResumeSource) {
            self.seen_context.lock().unwrap().push(source.context());
        }
    }

    #[async_trait]
    impl ResumeGateway for StubGateway {
        async fn generate(
            &self,
            _info: &Document,
            _job_description: Option<&str>,
        ) -> Result<Map<String, Value>, LlmError> {
            Ok(self.candidate.clone())
        }

        async fn improve(
            &self,
            source: &ResumeSource,
            _instructions: &[String],
            _tone: &str,
        ) -> Result<Map<String, Value>, LlmError> {
            self.record(source);
            Ok(self.candidate.clone())
        }

        async fn tailor(
            &self,
            source: &ResumeSource,
            _job_description: &str,
        ) -> Result<Map<String, Value>, LlmError> {
            self.record(source);
            Ok(self.candidate.clone())
        }

        async fn ats_score(
            &self,
            _document: &Document,
            _job_description: &str,
        ) -> Result<AtsReport, LlmError> {
            Ok(AtsReport {
                overall_score: 80.0,
                matched_skills: vec!["Rust".into()],
                ..Default::default()
            })
        }
    }

    struct FailingGateway;

    #[async_trait]
    impl ResumeGateway for FailingGateway {
        async fn generate(
            &self,
            _info: &Document,
            _job_description: Option<&str>,
        ) -> Result<Map<String, Value>, LlmError> {
            Err(LlmError::Shape("array"))
        }

        async fn improve(
            &self,
            _source: &ResumeSource,
            _instructions: &[String],
            _tone: &str,
        ) -> Result<Map<String, Value>, LlmError> {
            Err(LlmError::EmptyContent)
        }

        async fn tailor(
            &self,
            _source: &ResumeSource,
            _job_description: &str,
        ) -> Result<Map<String, Value>, LlmError> {
            Err(LlmError::EmptyContent)
        }

        async fn ats_score(
            &self,
            _document: &Document,
            _job_description: &str,
        ) -> Result<AtsReport, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    fn with_project(name: &str) -> Document {
        Document {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            projects: vec![Project {
                name: name.into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    async fn latest(store: &MemoryVersionStore, id: Uuid) -> StoredVersion {
        store
            .latest_version(id, VersionFilter::Latest)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_improve_keeps_projects() {
        let store = MemoryVersionStore::new();
        let info = with_project("P1");

        // generation drops projects entirely
        let created = create(
            &store,
            &StubGateway::returning(json!({"name": "Ada", "summary": "Builder"})),
            &info,
            None,
        )
        .await
        .unwrap();
        assert_eq!(created.version_type, VersionType::Improved);
        assert_eq!(created.document.projects[0].name, "P1");

        // improvement returns an empty projects list
        let gateway = StubGateway::returning(json!({"name": "Ada", "projects": []}));
        let improved = improve(
            &store,
            &gateway,
            ImproveRequest {
                resume_id: created.resume_id,
                tone: "professional",
                improvements: &[],
                data: None,
            },
        )
        .await
        .unwrap();
        assert!(!improved.created);

        let saved = latest(&store, created.resume_id).await;
        assert_eq!(saved.version_type, "improved");
        assert_eq!(
            saved.content["projects"],
            json!([{"name": "P1", "description": "", "technologies": "", "url": ""}])
        );
    }

    #[tokio::test]
    async fn test_create_with_job_description_is_tailored() {
        let store = MemoryVersionStore::new();
        let created = create(
            &store,
            &StubGateway::returning(json!({"summary": "Rustacean"})),
            &with_project("P1"),
            Some("Rust engineer"),
        )
        .await
        .unwrap();
        assert_eq!(created.version_type, VersionType::Tailored);

        let record = store.get_resume(created.resume_id).await.unwrap().unwrap();
        assert_eq!(
            record.raw_text,
            "Name: Ada\nEmail: ada@example.com\n\nSummary: Rustacean"
        );
    }

    #[tokio::test]
    async fn test_create_keeps_caller_contact() {
        let store = MemoryVersionStore::new();
        let created = create(
            &store,
            &StubGateway::returning(json!({"email": "invented@example.com"})),
            &with_project("P1"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(created.document.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_create_raw_text_omits_missing_email() {
        let store = MemoryVersionStore::new();
        let info = Document {
            name: "Ada".into(),
            ..Default::default()
        };
        let created = create(
            &store,
            &StubGateway::returning(json!({"email": "invented@example.com", "summary": "Builder"})),
            &info,
            None,
        )
        .await
        .unwrap();

        let record = store.get_resume(created.resume_id).await.unwrap().unwrap();
        assert_eq!(record.raw_text, "Name: Ada\n\nSummary: Builder");
    }

    #[tokio::test]
    async fn test_gateway_failure_saves_nothing() {
        let store = MemoryVersionStore::new();
        let err = create(&store, &FailingGateway, &with_project("P1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_improve_unknown_id_without_data_is_not_found() {
        let store = MemoryVersionStore::new();
        let err = improve(
            &store,
            &StubGateway::default(),
            ImproveRequest {
                resume_id: Uuid::new_v4(),
                tone: "professional",
                improvements: &[],
                data: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_improve_unknown_id_with_data_creates_record() {
        let store = MemoryVersionStore::new();
        let unknown = Uuid::new_v4();
        let improved = improve(
            &store,
            &StubGateway::returning(json!({"summary": "Sharper"})),
            ImproveRequest {
                resume_id: unknown,
                tone: "professional",
                improvements: &[],
                data: Some(with_project("P9")),
            },
        )
        .await
        .unwrap();
        assert!(improved.created);
        assert_ne!(improved.resume_id, unknown);
        assert_eq!(improved.document.projects[0].name, "P9");
        assert!(store.get_resume(improved.resume_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_improve_supplied_data_backfills_from_stored_version() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("raw").await.unwrap();
        store
            .save_version(id, &with_project("Stored"), VersionType::Improved)
            .await
            .unwrap();

        let supplied = Document {
            name: "Ada".into(),
            summary: "New summary".into(),
            ..Default::default()
        };
        let improved = improve(
            &store,
            &StubGateway::returning(json!({"projects": []})),
            ImproveRequest {
                resume_id: id,
                tone: "professional",
                improvements: &[],
                data: Some(supplied),
            },
        )
        .await
        .unwrap();
        assert_eq!(improved.document.projects[0].name, "Stored");
    }

    #[tokio::test]
    async fn test_improve_contact_only_body_keeps_stored_content() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("raw").await.unwrap();
        let stored = Document {
            summary: "Stored summary".into(),
            experiences: vec![Experience {
                title: "Analyst".into(),
                company: "Babbage & Co".into(),
                ..Default::default()
            }],
            ..with_project("Stored")
        };
        store
            .save_version(id, &stored, VersionType::Improved)
            .await
            .unwrap();

        let gateway = StubGateway::returning(json!({"summary": "Sharper"}));
        let improved = improve(
            &store,
            &gateway,
            ImproveRequest {
                resume_id: id,
                tone: "professional",
                improvements: &[],
                data: Some(Document {
                    phone: "555".into(),
                    ..Default::default()
                }),
            },
        )
        .await
        .unwrap();

        let context = gateway.seen_context.lock().unwrap()[0].clone();
        assert!(context.contains("Stored summary"));
        assert!(context.contains("Analyst"));
        assert!(!improved.created);
        assert_eq!(improved.resume_id, id);
        assert_eq!(improved.document.projects[0].name, "Stored");
        assert_eq!(improved.document.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_improve_unknown_id_with_contact_only_body_is_not_found() {
        let store = MemoryVersionStore::new();
        let err = improve(
            &store,
            &StubGateway::default(),
            ImproveRequest {
                resume_id: Uuid::new_v4(),
                tone: "professional",
                improvements: &[],
                data: Some(Document {
                    github: "ada".into(),
                    ..Default::default()
                }),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_improve_uses_raw_text_when_no_version() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("Jane Doe\nBackend engineer").await.unwrap();
        let gateway = StubGateway::returning(json!({"name": "Jane Doe"}));
        improve(
            &store,
            &gateway,
            ImproveRequest {
                resume_id: id,
                tone: "professional",
                improvements: &[],
                data: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            gateway.seen_context.lock().unwrap()[0],
            "Jane Doe\nBackend engineer"
        );
    }

    #[tokio::test]
    async fn test_improve_blank_source_is_rejected() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("   ").await.unwrap();
        let err = improve(
            &store,
            &StubGateway::default(),
            ImproveRequest {
                resume_id: id,
                tone: "professional",
                improvements: &[],
                data: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_tailor_saves_tailored_version() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("raw").await.unwrap();
        store
            .save_version(id, &with_project("P1"), VersionType::Improved)
            .await
            .unwrap();

        let doc = tailor(
            &store,
            &StubGateway::returning(json!({"summary": "Tailored", "projects": "none"})),
            id,
            "Rust engineer",
        )
        .await
        .unwrap();
        assert_eq!(doc.summary, "Tailored");
        assert_eq!(doc.projects[0].name, "P1");
        assert_eq!(latest(&store, id).await.version_type, "tailored");
    }

    #[tokio::test]
    async fn test_ats_requires_a_version() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("raw").await.unwrap();
        let err = ats_score(&store, &StubGateway::default(), id, "Rust")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        store
            .save_version(id, &with_project("P1"), VersionType::Improved)
            .await
            .unwrap();
        let report = ats_score(&store, &StubGateway::default(), id, "Rust")
            .await
            .unwrap();
        assert_eq!(report.overall_score, 80.0);
    }

    #[tokio::test]
    async fn test_export_renders_requested_version() {
        let store = MemoryVersionStore::new();
        let id = store.create_resume("raw").await.unwrap();
        store
            .save_version(id, &with_project("P1"), VersionType::Improved)
            .await
            .unwrap();

        let pdf = export(&store, id, VersionFilter::Latest, "modern")
            .await
            .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let err = export(&store, id, VersionFilter::Only(VersionType::Tailored), "modern")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_stored_document_accepts_json_string() {
        let version = StoredVersion {
            resume_id: Uuid::nil(),
            content: Value::String(r#"{"name": "Ada", "projects": null}"#.into()),
            version_type: "improved".into(),
            created_at: Utc::now(),
        };
        let doc = stored_document(&version);
        assert_eq!(doc.name, "Ada");
        assert!(doc.projects.is_empty());

        let garbage = StoredVersion {
            content: Value::String("not json".into()),
            ..version
        };
        assert!(stored_document(&garbage).is_blank());
    }
}
