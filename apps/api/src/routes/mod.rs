pub mod health;

use axum::{routing::get, Router};

use crate::resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/v1/resumes", resumes::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::resumes::service::tests::StubGateway;
    use crate::store::MemoryVersionStore;

    fn app() -> Router {
        let gateway = StubGateway::returning(json!({
            "name": "Ada Lovelace",
            "summary": "Mathematician and first programmer",
            "skills": ["Analysis"],
            "projects": []
        }));
        build_router(AppState {
            store: Arc::new(MemoryVersionStore::new()),
            gateway: Arc::new(gateway),
            archive: None,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Body) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_resume(app: &Router) -> String {
        let body = json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "projects": [{"name": "Analytical Engine notes", "tech_stack": ["Punch cards"]}],
            "certifications": ["Royal Society"]
        });
        let response = send(
            app,
            Method::POST,
            "/api/v1/resumes/create",
            Body::from(body.to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["version_type"], "improved");
        assert_eq!(body["version"]["projects"][0]["name"], "Analytical Engine notes");
        assert_eq!(body["version"]["summary"], "Mathematician and first programmer");
        body["resume_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(&app(), Method::GET, "/health", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_on_action_route_is_405() {
        let response = send(&app(), Method::GET, "/api/v1/resumes/create", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
        assert_eq!(body["error"]["details"]["allowed_method"], "POST");
    }

    #[tokio::test]
    async fn test_invalid_and_unknown_ids() {
        let app = app();
        let response = send(&app, Method::GET, "/api/v1/resumes/not-a-uuid", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let unknown = format!("/api/v1/resumes/{}", uuid::Uuid::new_v4());
        let response = send(&app, Method::GET, &unknown, Body::empty()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_reports_position() {
        let response = send(
            &app(),
            Method::POST,
            "/api/v1/resumes/create",
            Body::from(r#"{"name": "Ada",}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["details"]["error_position"], 15);
        assert!(body["error"]["details"]["context_around_error"]
            .as_str()
            .unwrap()
            .contains("<-- ERROR HERE -->"));
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let response = send(
            &app(),
            Method::POST,
            "/api/v1/resumes/create",
            Body::from(r#"{"email": "a@b.com"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_create_improve_export_flow() {
        let app = app();
        let id = create_resume(&app).await;

        let response = send(&app, Method::GET, &format!("/api/v1/resumes/{id}"), Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record = json_body(response).await;
        assert!(record["raw_text"]
            .as_str()
            .unwrap()
            .starts_with("Name: Ada Lovelace\nEmail: ada@example.com"));

        let response = send(
            &app,
            Method::POST,
            "/api/v1/resumes/improve",
            Body::from(json!({"resume_id": id, "improvements": ["Add metrics"]}).to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let projects = &body["improved"]["projects"];
        assert_eq!(projects[0]["name"], "Analytical Engine notes");
        assert_eq!(projects[0]["technologies"], "Punch cards");
        assert_eq!(body["improved"]["certifications"][0]["name"], "Royal Society");
        assert_eq!(body["improved"]["email"], "ada@example.com");

        let response = send(
            &app,
            Method::GET,
            &format!("/api/v1/resumes/export/{id}?template=tech"),
            Body::empty(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"resume_{id}_tech.pdf\"").as_str()
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_improve_with_only_contact_fields_uses_stored_version() {
        let app = app();
        let id = create_resume(&app).await;

        let response = send(
            &app,
            Method::POST,
            "/api/v1/resumes/improve",
            Body::from(json!({"resume_id": id, "phone": "555"}).to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["resume_id"], id.as_str());
        assert_eq!(body["improved"]["email"], "ada@example.com");
        assert_eq!(body["improved"]["projects"][0]["name"], "Analytical Engine notes");
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_version_type() {
        let app = app();
        let id = create_resume(&app).await;
        let response = send(
            &app,
            Method::GET,
            &format!("/api/v1/resumes/export/{id}?version_type=final"),
            Body::empty(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tailor_and_ats_score() {
        let app = app();
        let id = create_resume(&app).await;
        let payload = json!({"resume_id": id, "job_description": "Rust engineer"}).to_string();

        let response = send(&app, Method::POST, "/api/v1/resumes/tailor", Body::from(payload.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["tailored"]["projects"][0]["name"], "Analytical Engine notes");

        let response = send(&app, Method::POST, "/api/v1/resumes/ats-score", Body::from(payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ats_score"]["overall_score"], 80.0);
        assert_eq!(body["ats_score"]["matched_skills"][0], "Rust");
    }

    #[tokio::test]
    async fn test_templates_and_preview() {
        let app = app();
        let response = send(&app, Method::GET, "/api/v1/resumes/templates", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["templates"].as_array().unwrap().len(), 8);
        assert_eq!(
            body["template_info"][0]["preview_url"],
            "/api/v1/resumes/preview/default"
        );

        let response = send(&app, Method::GET, "/api/v1/resumes/preview/unknown", Body::empty()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"preview_default.pdf\""
        );
    }

    fn multipart(field: &str, content_type: &str, data: &str) -> Request<Body> {
        let body = format!(
            "--BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"cv.pdf\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {data}\r\n\
             --BOUNDARY--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/resumes/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_without_accepted_field_is_422() {
        let response = app()
            .oneshot(multipart("attachment", "application/pdf", "%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["details"]["accepted_fields"],
            json!(["file", "pdf", "document", "resume"])
        );
    }

    #[tokio::test]
    async fn test_upload_wrong_content_type_is_400() {
        let response = app()
            .oneshot(multipart("resume", "text/plain", "hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
