use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{self, DEFAULT_TEMPLATE};
use crate::extract::ValidatedJson;
use crate::gateway::AtsReport;
use crate::models::resume::{Document, ResumeRecord, VersionFilter, VersionType};
use crate::normalize;
use crate::resumes::service::{self, ImproveRequest};
use crate::state::AppState;
use crate::upload;

#[derive(Deserialize)]
pub struct CreateResumeRequest {
    #[serde(default)]
    pub job_description: Option<String>,
    /// Every resume field; normalised into a `Document`.
    #[serde(flatten)]
    pub resume: Map<String, Value>,
}

#[derive(Serialize)]
pub struct CreateResumeResponse {
    pub resume_id: Uuid,
    /// The generated resume as saved.
    pub version: Document,
    pub version_type: VersionType,
    pub status: &'static str,
    pub message: String,
}

#[derive(Deserialize)]
pub struct ImproveResumeRequest {
    pub resume_id: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default)]
    pub improvements: Vec<String>,
    /// Optional full resume data sent alongside the id.
    #[serde(flatten)]
    pub resume: Map<String, Value>,
}

fn default_tone() -> String {
    "professional".to_string()
}

#[derive(Serialize)]
pub struct ImproveResumeResponse {
    pub resume_id: Uuid,
    pub improved: Document,
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct JobDescriptionRequest {
    pub resume_id: String,
    pub job_description: String,
}

#[derive(Serialize)]
pub struct TailorResumeResponse {
    pub resume_id: Uuid,
    pub tailored: Document,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct AtsScoreResponse {
    pub resume_id: Uuid,
    pub ats_score: AtsReport,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub resume_id: Uuid,
    pub parsed_text: String,
    pub status: &'static str,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub version_type: Option<String>,
    pub template: Option<String>,
}

pub fn parse_resume_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        AppError::Validation(format!("Invalid resume id '{raw}': expected a UUID"))
    })
}

/// POST /api/v1/resumes/create
pub async fn handle_create(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateResumeRequest>,
) -> Result<Json<CreateResumeResponse>, AppError> {
    let info = normalize::document(&req.resume);
    if info.name.trim().is_empty() {
        return Err(AppError::UnprocessableEntity {
            message: "Field 'name' is required".to_string(),
            details: Some(json!({ "field": "name" })),
        });
    }

    let created = service::create(
        state.store.as_ref(),
        state.gateway.as_ref(),
        &info,
        req.job_description.as_deref(),
    )
    .await?;

    Ok(Json(CreateResumeResponse {
        resume_id: created.resume_id,
        version: created.document,
        version_type: created.version_type,
        status: "success",
        message: "Resume created successfully".to_string(),
    }))
}

/// POST /api/v1/resumes/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if !upload::is_accepted_field(&name) {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        file = Some((content_type, file_name, bytes));
        break;
    }

    let Some((content_type, file_name, bytes)) = file else {
        return Err(AppError::UnprocessableEntity {
            message: format!(
                "No file found. Send the PDF in one of these fields: {}",
                upload::ACCEPTED_FIELDS.join(", ")
            ),
            details: Some(json!({ "accepted_fields": upload::ACCEPTED_FIELDS })),
        });
    };

    if !upload::is_pdf_content_type(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported file type '{content_type}'. Only PDF files are accepted"
        )));
    }

    info!("Extracting text from upload '{file_name}' ({} bytes)", bytes.len());
    let text = upload::extract_text(&bytes).await?;
    let resume_id = state.store.create_resume(&text).await?;

    Ok(Json(UploadResponse {
        resume_id,
        parsed_text: upload::preview(&text),
        status: "success",
    }))
}

/// POST /api/v1/resumes/improve
pub async fn handle_improve(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ImproveResumeRequest>,
) -> Result<Json<ImproveResumeResponse>, AppError> {
    let resume_id = parse_resume_id(&req.resume_id)?;
    let supplied = normalize::document(&req.resume);
    let data = (!supplied.is_blank()).then_some(supplied);

    let improved = service::improve(
        state.store.as_ref(),
        state.gateway.as_ref(),
        ImproveRequest {
            resume_id,
            tone: &req.tone,
            improvements: &req.improvements,
            data,
        },
    )
    .await?;

    Ok(Json(ImproveResumeResponse {
        resume_id: improved.resume_id,
        improved: improved.document,
        status: "success",
    }))
}

/// POST /api/v1/resumes/tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<JobDescriptionRequest>,
) -> Result<Json<TailorResumeResponse>, AppError> {
    let resume_id = parse_resume_id(&req.resume_id)?;
    let tailored = service::tailor(
        state.store.as_ref(),
        state.gateway.as_ref(),
        resume_id,
        &req.job_description,
    )
    .await?;

    Ok(Json(TailorResumeResponse {
        resume_id,
        tailored,
        status: "success",
    }))
}

/// POST /api/v1/resumes/ats-score
pub async fn handle_ats_score(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<JobDescriptionRequest>,
) -> Result<Json<AtsScoreResponse>, AppError> {
    let resume_id = parse_resume_id(&req.resume_id)?;
    let report = service::ats_score(
        state.store.as_ref(),
        state.gateway.as_ref(),
        resume_id,
        &req.job_description,
    )
    .await?;

    Ok(Json(AtsScoreResponse {
        resume_id,
        ats_score: report,
        status: "success",
    }))
}

/// GET /api/v1/resumes/templates
pub async fn handle_templates() -> Json<Value> {
    let info: Vec<Value> = export::TEMPLATES
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "preview_url": format!("/api/v1/resumes/preview/{}", t.name),
                "description": t.description,
            })
        })
        .collect();

    Json(json!({
        "templates": export::template_names(),
        "template_info": info,
        "status": "success",
    }))
}

/// GET /api/v1/resumes/preview/:template
pub async fn handle_preview(Path(template): Path<String>) -> Result<Response, AppError> {
    let style = export::style(&template);
    let pdf = service::render_pdf(export::sample_document(), style.name).await?;
    Ok(pdf_response(
        pdf,
        &format!("inline; filename=\"preview_{}.pdf\"", style.name),
    ))
}

/// GET /api/v1/resumes/export/:resume_id?version_type=latest&template=default
pub async fn handle_export(
    State(state): State<AppState>,
    Path(resume_id): Path<String>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let resume_id = parse_resume_id(&resume_id)?;
    let filter: VersionFilter = params
        .version_type
        .as_deref()
        .unwrap_or("latest")
        .parse()
        .map_err(AppError::Validation)?;
    let template = export::style(params.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)).name;

    info!("Exporting resume {resume_id} ({filter}) with template '{template}'");
    let pdf = service::export(state.store.as_ref(), resume_id, filter, template).await?;

    if let Some(archive) = &state.archive {
        archive.spawn_put(resume_id, template, pdf.clone());
    }

    Ok(pdf_response(
        pdf,
        &format!("attachment; filename=\"resume_{resume_id}_{template}.pdf\""),
    ))
}

/// GET /api/v1/resumes/:resume_id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<String>,
) -> Result<Json<ResumeRecord>, AppError> {
    let resume_id = parse_resume_id(&resume_id)?;
    let record = service::require_record(state.store.as_ref(), resume_id).await?;
    Ok(Json(record))
}

/// Fallback for non-POST requests to action routes.
pub async fn post_only() -> AppError {
    AppError::MethodNotAllowed { allowed: "POST" }
}

/// Fallback for non-GET requests to read routes.
pub async fn get_only() -> AppError {
    AppError::MethodNotAllowed { allowed: "GET" }
}

fn pdf_response(pdf: Vec<u8>, disposition: &str) -> Response {
    let disposition = HeaderValue::from_str(disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response()
}
