//! Integration tests: build the router on in-memory stores and drive it
//! through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use journal::{
    AppState,
    config::{AppConfig, StorageBackend},
    create_router,
    repositories::{MemoryEntryRepository, MemoryUserRepository},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "journal-test-boundary";

struct TestApp {
    router: Router,
    dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig {
            access_token_secret: "integration-secret".into(),
            host: "127.0.0.1".into(),
            port: 0,
            storage_backend: StorageBackend::Memory,
            public_base_url: "http://localhost:8000".into(),
            upload_dir: dir.path().join("uploads"),
            assets_dir: dir.path().join("assets"),
            max_upload_bytes: 1024 * 1024,
            token_ttl_hours: 72,
        };

        let state = AppState::new(
            config,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryEntryRepository::new()),
        );

        Self {
            router: create_router(state),
            dir,
        }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };

        (status, json)
    }

    async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.raw(method, uri, token, "application/json", &body.to_string())
            .await
    }

    async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Register an account and return its access token
    async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .json(
                "POST",
                "/create-account",
                None,
                json!({ "fullName": "Ada", "email": email, "password": "p4ss" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn add_entry(&self, token: &str, title: &str, date_ms: i64) -> Value {
        let (status, body) = self
            .json(
                "POST",
                "/add-journal-entry",
                Some(token),
                json!({
                    "title": title,
                    "notes": format!("Notes about {}", title),
                    "tag": ["travel"],
                    "journalDate": date_ms,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        body["entry"].clone()
    }

    async fn upload(&self, content_type: &str, file_name: &str, bytes: &[u8]) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/image-upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        self.send(req).await
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_login_and_favourite_flow() {
    let app = TestApp::new();
    app.register("a@x.io").await;

    let (status, body) = app
        .json(
            "POST",
            "/login",
            None,
            json!({ "email": "a@x.io", "password": "p4ss" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login Successful");
    assert_eq!(body["user"]["fullName"], "Ada");
    assert!(body["user"].get("password").is_none());
    let token = body["accessToken"].as_str().unwrap().to_string();

    let (status, body) = app.get("/get-user", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "a@x.io");

    let first = app.add_entry(&token, "Lisbon", 1_717_200_000_000).await;
    assert_eq!(
        first["imageUrl"],
        "http://localhost:8000/assets/placeholder.png"
    );
    assert_eq!(first["isFavourite"], false);
    assert_eq!(first["journalDate"], "2024-06-01T00:00:00Z");

    let second = app.add_entry(&token, "Porto", 1_717_286_400_000).await;
    let id = second["id"].as_str().unwrap();

    let (status, body) = app
        .json(
            "PUT",
            &format!("/update-is-favourite/{}", id),
            Some(&token),
            json!({ "isFavourite": true }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entry"]["isFavourite"], true);
    assert_eq!(body["message"], "Update Successful");

    let (status, body) = app.get("/get-all-entries", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["title"], "Porto");
    assert_eq!(entries[1]["title"], "Lisbon");
}

#[tokio::test]
async fn test_duplicate_registration_and_bad_login() {
    let app = TestApp::new();
    app.register("dup@x.io").await;

    let (status, body) = app
        .json(
            "POST",
            "/create-account",
            None,
            json!({ "fullName": "Other", "email": "dup@x.io", "password": "x" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["message"], "User already exists");

    let (status, body) = app
        .json(
            "POST",
            "/login",
            None,
            json!({ "email": "dup@x.io", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid Credentials");

    let (status, body) = app
        .json("POST", "/create-account", None, json!({ "email": "n@x.io" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new();

    let (status, _) = app.get("/get-all-entries", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/get-user", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_entries_are_isolated_between_users() {
    let app = TestApp::new();
    let alice = app.register("alice@x.io").await;
    let bob = app.register("bob@x.io").await;

    let entry = app.add_entry(&alice, "Kyoto", 1_700_000_000_000).await;
    let id = entry["id"].as_str().unwrap();

    let (status, body) = app
        .json(
            "PUT",
            &format!("/edit-entry/{}", id),
            Some(&bob),
            json!({
                "title": "Hijacked",
                "notes": "n",
                "tag": [],
                "journalDate": 1_700_000_000_000i64,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Journal entry not found");

    let (status, _) = app
        .json("DELETE", &format!("/delete-entry/{}", id), Some(&bob), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/get-all-entries", Some(&bob)).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 0);

    let (_, body) = app.get("/get-all-entries", Some(&alice)).await;
    assert_eq!(body["entries"][0]["title"], "Kyoto");

    let (status, body) = app
        .json(
            "DELETE",
            &format!("/delete-entry/{}", id),
            Some(&alice),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Journal entry deleted successfully");

    let (status, _) = app
        .json("DELETE", "/delete-entry/not-a-uuid", Some(&alice), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_and_date_filter() {
    let app = TestApp::new();
    let token = app.register("s@x.io").await;

    app.add_entry(&token, "Paris in spring", 1_711_929_600_000).await;
    app.add_entry(&token, "Oslo", 1_717_200_000_000).await;

    let (status, body) = app.get("/search?query=PARIS", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let stories = body["stories"].as_array().unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["title"], "Paris in spring");

    let (status, body) = app.get("/search?query=", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Query is required");

    let (status, body) = app
        .get(
            "/journal-entries/filter?startDate=1717000000000&endDate=1718000000000",
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["title"], "Oslo");

    let (status, body) = app
        .get(
            "/journal-entries/filter?startDate=1718000000000&endDate=1717000000000",
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 0);

    let (status, _) = app
        .get("/journal-entries/filter?startDate=abc", Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_upload_is_served_and_deleted() {
    let app = TestApp::new();

    let (status, body) = app.upload("image/png", "beach.png", b"\x89PNG\r\n").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let url = body["imageUrl"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://localhost:8000/uploads/"));
    assert!(url.ends_with(".png"));

    let path = url.trim_start_matches("http://localhost:8000");
    let resp = app
        .router
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let name = url.rsplit('/').next().unwrap();
    assert!(app.dir.path().join("uploads").join(name).exists());

    let (status, body) = app
        .json(
            "DELETE",
            &format!("/delete-image?imageUrl={}", url),
            None,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image deleted successfully");
    assert!(!app.dir.path().join("uploads").join(name).exists());

    let (status, body) = app
        .json(
            "DELETE",
            &format!("/delete-image?imageUrl={}", url),
            None,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image not found");
}

#[tokio::test]
async fn test_non_image_upload_and_missing_image_url() {
    let app = TestApp::new();

    let (status, body) = app.upload("text/plain", "notes.txt", b"hello").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"], true);

    let (status, body) = app.json("DELETE", "/delete-image", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "imageUrl parameter is required");
}

#[tokio::test]
async fn test_malformed_bodies_use_the_error_shape() {
    let app = TestApp::new();
    let token = app.register("m@x.io").await;
    let entry = app.add_entry(&token, "Rome", 1_700_000_000_000).await;
    let id = entry["id"].as_str().unwrap();

    let (status, body) = app
        .json(
            "PUT",
            &format!("/update-is-favourite/{}", id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert!(body["message"].as_str().unwrap().contains("isFavourite"));

    let (status, body) = app
        .json(
            "POST",
            "/add-journal-entry",
            Some(&token),
            json!({
                "title": "Rome",
                "notes": "n",
                "tag": "travel",
                "journalDate": 1_700_000_000_000i64,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (status, body) = app
        .json(
            "POST",
            "/add-journal-entry",
            Some(&token),
            json!({
                "title": "Rome",
                "notes": "n",
                "tag": [],
                "journalDate": 1_700_000_000_000.5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (status, body) = app
        .raw("POST", "/login", None, "application/json", "not json")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (status, body) = app
        .raw("POST", "/login", None, "text/plain", "{}")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    let (status, body) = app
        .raw("POST", "/image-upload", None, "text/plain", "hello")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);

    // Nothing was stored by the rejected requests
    let (_, body) = app.get("/get-all-entries", Some(&token)).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert_eq!(body["entries"][0]["isFavourite"], false);
}

#[tokio::test]
async fn test_journal_date_outside_storable_range_is_rejected() {
    let app = TestApp::new();
    let token = app.register("d@x.io").await;

    let (status, body) = app
        .json(
            "POST",
            "/add-journal-entry",
            Some(&token),
            json!({
                "title": "Pangea",
                "notes": "n",
                "tag": [],
                "journalDate": -8_000_000_000_000_000i64,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid journal date");
}
