#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config;
    use crate::routes;
    use crate::state::AppState;
    use crate::tests::fixtures::{mp4_bytes, write_file, SRT_BODY};

    const AUTH_SECTION: &str = "[auth]\nalgorithm = 'HS256'\nsecret = 'api-test-secret'\n\
allowed_audiences = ['plex']\nallowed_subjects = ['node-1']\n";

    fn setup_test_app(extra_toml: &str) -> (Router, AppState, TempDir) {
        let root = TempDir::new().unwrap();
        write_file(root.path(), "a.mp4", &mp4_bytes(2000));
        write_file(root.path(), "a.srt", SRT_BODY.as_bytes());

        let toml = format!(
            "[files]\nroot_dir = '{}'\nthread_count = 2\nmax_batch_size = 3\n{}",
            root.path().display(),
            extra_toml
        );
        let state = AppState::new(config::from_toml_str(&toml).unwrap()).unwrap();
        (routes::router(state.clone()), state, root)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder =
            Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn issue_token(app: &Router) -> String {
        let response = send(
            app,
            send_json(Method::POST, "/token", None, json!({"source_platform": "plex", "source_id": "node-1"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let (app, _, _root) = setup_test_app("");
        let response = send(&app, get("/healthz", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_endpoint() {
        let (app, _, root) = setup_test_app("");
        assert_eq!(send(&app, get("/readyz", None)).await.status(), StatusCode::OK);

        drop(root);
        assert_eq!(send(&app, get("/readyz", None)).await.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let (app, _, _root) = setup_test_app("");
        let response = send(&app, get("/files/list", None)).await;

        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(headers.contains_key("x-frame-options"));
        assert!(headers.contains_key("referrer-policy"));
        assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_version_endpoint() {
        let (app, _, _root) = setup_test_app("");
        let json = body_json(send(&app, get("/version", None)).await).await;
        assert_eq!(json["name"], "atlas-files");
        assert!(json.get("build").is_some());
    }

    #[tokio::test]
    async fn test_list_without_auth_section_is_open() {
        let (app, _, root) = setup_test_app("");
        let response = send(&app, get("/files/list", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["name"], "a.mp4");
        assert_eq!(files[0]["path"], root.path().to_str().unwrap());
        assert_eq!(files[0]["size"], 2000);
        assert_eq!(files[0]["mime_type"], "video/mp4");
        assert!(files[0]["modified_at"].is_string());
        assert!(files[0].get("hash").is_none());
    }

    #[tokio::test]
    async fn test_list_with_subtitles_and_hashes() {
        let (app, _, _root) = setup_test_app("");
        let json = body_json(send(&app, get("/files/list?subtitles=true&hashes=true", None)).await).await;

        let files = json["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f["hash"].as_str().map(str::len) == Some(64)));
    }

    #[tokio::test]
    async fn test_token_endpoint_without_auth_section() {
        let (app, _, _root) = setup_test_app("");
        let response = send(
            &app,
            send_json(Method::POST, "/token", None, json!({"source_platform": "plex", "source_id": "node-1"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_files_require_bearer_token() {
        let (app, _, _root) = setup_test_app(AUTH_SECTION);

        let response = send(&app, get("/files/list", None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let basic = Request::builder()
            .uri("/files/list")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, basic).await.status(), StatusCode::FORBIDDEN);

        let response = send(&app, get("/files/list", Some("not-a-token"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");

        // Open endpoints stay open
        assert_eq!(send(&app, get("/healthz", None)).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_token_flow() {
        let (app, state, _root) = setup_test_app(AUTH_SECTION);
        let token = issue_token(&app).await;

        let response = send(&app, get("/files/list", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.metrics.get_snapshot().tokens_issued, 1);
        assert_eq!(state.metrics.get_snapshot().listings_served, 1);
    }

    #[tokio::test]
    async fn test_token_refused_for_unknown_source() {
        let (app, _, _root) = setup_test_app(AUTH_SECTION);
        let response = send(
            &app,
            send_json(Method::POST, "/token", None, json!({"source_platform": "plex", "source_id": "intruder"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_rename_reports_outcomes_in_order() {
        let (app, state, root) = setup_test_app(AUTH_SECTION);
        let token = issue_token(&app).await;
        let dir = root.path().to_str().unwrap();

        let body = json!({"files": [
            {"name": "a.mp4", "path": dir, "size": 2000, "new_name": "b.mp4"},
            {"name": "a.srt", "path": dir, "size": 8, "new_name": "b.srt"},
        ]});
        let response = send(&app, send_json(Method::PATCH, "/files/rename", Some(&token), body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let outcomes = json["files"].as_array().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0]["name"], "a.mp4");
        assert_eq!(outcomes[0]["new_name"], "b.mp4");
        assert_eq!(outcomes[0]["success"], true);
        assert!(outcomes[0].get("detail").is_none());
        assert_eq!(outcomes[1]["success"], false);
        assert!(outcomes[1]["detail"].as_str().unwrap().starts_with("size mismatch (delta: "));

        assert!(root.path().join("b.mp4").exists());
        assert!(root.path().join("a.srt").exists());

        let snapshot = state.metrics.get_snapshot();
        assert_eq!(snapshot.renames_succeeded, 1);
        assert_eq!(snapshot.renames_failed, 1);
    }

    #[tokio::test]
    async fn test_move_accepts_legacy_field_names() {
        let (app, _, root) = setup_test_app("");
        let target = root.path().join("archive");
        std::fs::create_dir(&target).unwrap();
        let listed = body_json(send(&app, get("/files/list", None)).await).await;
        let mod_date = listed["files"][0]["modified_at"].clone();

        let body = json!({"files": [{
            "name": "a.mp4",
            "path": root.path().to_str().unwrap(),
            "mod_date": mod_date,
            "new_path": target.to_str().unwrap(),
        }]});
        let response = send(&app, send_json(Method::PATCH, "/files/move", None, body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["files"][0]["success"], true, "{}", json);
        assert_eq!(json["files"][0]["new_destination_path"], target.to_str().unwrap());
        assert!(target.join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_invalid_new_name_rejects_whole_batch() {
        let (app, _, root) = setup_test_app("");
        let dir = root.path().to_str().unwrap();
        let body = json!({"files": [
            {"name": "a.mp4", "path": dir, "new_name": "b.mp4"},
            {"name": "a.srt", "path": dir, "new_name": "../escape.srt"},
        ]});

        let response = send(&app, send_json(Method::PATCH, "/files/rename", None, body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["details"]["field"], "files[1].new_name");
        assert!(root.path().join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_offsetless_mod_date_fails_only_its_own_request() {
        let (app, _, root) = setup_test_app("");
        write_file(root.path(), "c.mp4", &mp4_bytes(500));
        let dir = root.path().to_str().unwrap();

        let body = json!({"files": [
            {"name": "c.mp4", "path": dir, "size": 500, "new_name": "d.mp4"},
            {"name": "a.mp4", "path": dir, "mod_date": "2024-01-01T12:00:00.123456", "new_name": "e.mp4"},
        ]});
        let response = send(&app, send_json(Method::PATCH, "/files/rename", None, body)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let outcomes = json["files"].as_array().unwrap();
        assert_eq!(outcomes[0]["success"], true, "{}", json);
        assert_eq!(outcomes[1]["success"], false);
        assert_eq!(outcomes[1]["modified_at"], "2024-01-01T12:00:00.123456Z");
        assert!(outcomes[1]["detail"].as_str().unwrap().starts_with("modification time mismatch (delta: "));

        assert!(root.path().join("d.mp4").exists());
        assert!(root.path().join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let (app, _, _root) = setup_test_app("");
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/files/rename")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"files\": [{\"name\": "))
            .unwrap();

        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");

        // Well-formed JSON of the wrong shape goes through the same envelope
        let response =
            send(&app, send_json(Method::PATCH, "/files/move", None, json!({"files": [{"name": 7}]}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected() {
        let (app, _, root) = setup_test_app("");
        let dir = root.path().to_str().unwrap();
        let files: Vec<Value> = (0..4)
            .map(|i| json!({"name": format!("{}.mp4", i), "path": dir, "new_name": format!("{}-x.mp4", i)}))
            .collect();

        let response = send(&app, send_json(Method::PATCH, "/files/rename", None, json!({"files": files}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty_outcomes() {
        let (app, _, _root) = setup_test_app("");
        let response = send(&app, send_json(Method::PATCH, "/files/move", None, json!({"files": []}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"files": []}));
    }

    #[tokio::test]
    async fn test_path_traversal_in_uri_is_rejected() {
        let (app, _, _root) = setup_test_app("");
        let response = send(&app, get("/files/%2e%2e/list", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_prometheus_metrics() {
        let (app, _, _root) = setup_test_app("");
        send(&app, get("/files/list", None)).await;

        let response = send(&app, get("/metrics/prometheus", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("atlas_files_listings_served 1"));
        assert!(text.contains("atlas_files_files_listed 1"));
    }
}
