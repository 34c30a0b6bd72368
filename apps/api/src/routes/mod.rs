pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::profile::handlers;
use crate::state::AppState;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_resume_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless parsing
        .route("/api/v1/resume/parse", post(handlers::handle_parse_resume))
        .route(
            "/api/v1/resume/parse-url",
            post(handlers::handle_parse_resume_url),
        )
        // Profile
        .route(
            "/api/v1/profile",
            get(handlers::handle_get_profile)
                .post(handlers::handle_provision_profile)
                .put(handlers::handle_update_profile),
        )
        // Resume → profile
        .route(
            "/api/v1/profile/resume",
            post(handlers::handle_upload_resume),
        )
        .route(
            "/api/v1/profile/resume/reparse",
            post(handlers::handle_reparse_resume),
        )
        .route(
            "/api/v1/profile/resume/preview",
            post(handlers::handle_preview_merge),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::parser::test_pdf;

    fn test_state() -> AppState {
        AppState::for_tests().0
    }

    fn multipart_request(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let boundary = "X-ALUMNI-BOUNDARY";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_parse_endpoint_returns_structured_resume() {
        let app = build_router(test_state());
        let request = multipart_request("/api/v1/resume/parse", "jane.pdf", &test_pdf::jane_doe());
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["name"], "Jane Doe");
        assert_eq!(body["educations"][0]["degree"], "B.E. Computer Science");
        assert_eq!(body["workExperiences"], json!([]));
    }

    #[tokio::test]
    async fn test_parse_endpoint_rejects_non_pdf() {
        let app = build_router(test_state());
        let request = multipart_request("/api/v1/resume/parse", "notes.txt", b"just some text");
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNREADABLE_INPUT");
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf_before_storage() {
        let app = build_router(test_state());
        let uri = format!("/api/v1/profile/resume?user_id={}", Uuid::new_v4());
        let request = multipart_request(&uri, "notes.txt", b"just some text");
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let uri = format!("/api/v1/profile?user_id={user_id}");

        let (status, _) = send(
            build_router(state.clone()),
            Request::get(&uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            build_router(state.clone()),
            Request::post(&uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["version"], 0);
        assert_eq!(body["completeness"]["complete"], false);

        let (status, body) = send(
            build_router(state.clone()),
            json_request(
                "PUT",
                &uri,
                json!({
                    "version": 0,
                    "graduationYear": 2023,
                    "department": "Computer Science",
                    "contactNumber": "+91 98765 43210",
                    "linkedinProfile": "linkedin.com/in/jdoe"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["profile"]["version"], 1);
        assert_eq!(body["profile"]["profileComplete"], true);
        assert_eq!(
            body["profile"]["linkedinProfile"],
            "https://linkedin.com/in/jdoe"
        );

        let (status, body) = send(
            build_router(state.clone()),
            json_request("PUT", &uri, json!({ "version": 0, "bio": "stale edit" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn test_update_validation_error() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        state.profiles.provision(user_id).await.unwrap();
        let uri = format!("/api/v1/profile?user_id={user_id}");

        let (status, body) = send(
            build_router(state),
            json_request("PUT", &uri, json!({ "version": 0, "graduationYear": 1800 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_preview_respects_replace_existing() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let mut profile = state.profiles.provision(user_id).await.unwrap();
        profile.contact_number = Some("111-222-3333".into());
        state.profiles.save(&profile).await.unwrap();

        let resume = json!({ "profile": { "phone": "+91 98765 43210", "location": "Pune, India" } });

        let uri = format!("/api/v1/profile/resume/preview?user_id={user_id}&replace_existing=false");
        let (status, body) = send(
            build_router(state.clone()),
            json_request("POST", &uri, resume.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contactNumber"], "111-222-3333");
        assert_eq!(body["location"], "Pune, India");

        let uri = format!("/api/v1/profile/resume/preview?user_id={user_id}");
        let (_, body) = send(build_router(state.clone()), json_request("POST", &uri, resume)).await;
        assert_eq!(body["contactNumber"], "+91 98765 43210");

        let stored = state.profiles.fetch(user_id).await.unwrap().unwrap();
        assert_eq!(stored.contact_number.as_deref(), Some("111-222-3333"));
        assert!(stored.location.is_none());
    }

    #[tokio::test]
    async fn test_upload_links_stored_resume() {
        let (state, _, resumes) = AppState::for_tests();
        let uri = format!("/api/v1/profile/resume?user_id={}", Uuid::new_v4());
        let request = multipart_request(&uri, "jane.pdf", &test_pdf::jane_doe());
        let (status, body) = send(build_router(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parseOutcome"], "parsed");
        assert_eq!(body["profile"]["email"], "jane@example.com");
        let key = body["profile"]["resumeKey"].as_str().unwrap().to_string();
        assert_eq!(resumes.keys().await, vec![key]);
    }

    #[tokio::test]
    async fn test_reparse_without_stored_resume_is_not_found() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        state.profiles.provision(user_id).await.unwrap();
        let uri = format!("/api/v1/profile/resume/reparse?user_id={user_id}");
        let (status, _) = send(
            build_router(state),
            Request::post(&uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_url_requires_http_scheme() {
        let app = build_router(test_state());
        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/api/v1/resume/parse-url",
                json!({ "url": "file:///etc/passwd" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
