pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::generation::handlers as generation;
use crate::prompts::handlers as prompts;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Anything not matched by the API is served from the static frontend directory
    let frontend = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/generate", post(generation::handle_generate))
        .route("/api/prompts/random", get(prompts::handle_random_prompt))
        .route("/api/prompts/:character", get(prompts::handle_get_prompt))
        .fallback_service(frontend)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::generation::handlers::{DEFAULT_DIMENSION, DEFAULT_PROMPT};

    struct TestApp {
        router: Router,
        _dir: tempfile::TempDir,
    }

    fn app_with_prompts(prompts: &str) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let static_dir = dir.path().join("public");
        std::fs::create_dir_all(&static_dir).unwrap();
        std::fs::write(static_dir.join("index.html"), "<h1>imagegen</h1>").unwrap();
        let prompts_path = dir.path().join("prompts.json");
        std::fs::write(&prompts_path, prompts).unwrap();

        let static_dir = static_dir.to_string_lossy().into_owned();
        let prompts_path = prompts_path.to_string_lossy().into_owned();
        let config = Config::from_lookup(|key| match key {
            "STATIC_DIR" => Some(static_dir.clone()),
            "PROMPTS_PATH" => Some(prompts_path.clone()),
            _ => None,
        })
        .unwrap();

        TestApp {
            router: build_router(AppState::from_config(config)),
            _dir: dir,
        }
    }

    fn app() -> TestApp {
        app_with_prompts(r#"{"prompts": [{"character": "hero", "prompt": "a hero", "width": 512}]}"#)
    }

    async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn post_generate(app: &TestApp, body: &str) -> (StatusCode, Value) {
        let request = Request::post("/api/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = send(app, request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn decode_data_url(url: &str) -> image::DynamicImage {
        let encoded = url
            .strip_prefix("data:image/png;base64,")
            .expect("png data url");
        let bytes = STANDARD.decode(encoded).unwrap();
        image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["remote_model"], false);
    }

    #[tokio::test]
    async fn test_generate_returns_png_data_url() {
        let app = app();
        let (status, body) =
            post_generate(&app, r#"{"prompt": "a red fox", "width": 100, "height": 120}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["prompt"], "a red fox");
        let img = decode_data_url(body["image"].as_str().unwrap());
        assert_eq!((img.width(), img.height()), (100, 120));
    }

    #[tokio::test]
    async fn test_generate_empty_body_uses_defaults() {
        let app = app();
        let (status, body) = post_generate(&app, "{}").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prompt"], DEFAULT_PROMPT);
        let img = decode_data_url(body["image"].as_str().unwrap());
        assert_eq!((img.width(), img.height()), (DEFAULT_DIMENSION, DEFAULT_DIMENSION));
    }

    #[tokio::test]
    async fn test_generate_accepts_string_dimensions() {
        let app = app();
        let (status, body) =
            post_generate(&app, r#"{"prompt": "x", "width": "80", "height": "60"}"#).await;

        assert_eq!(status, StatusCode::OK);
        let img = decode_data_url(body["image"].as_str().unwrap());
        assert_eq!((img.width(), img.height()), (80, 60));
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_dimensions() {
        let app = app();
        for body in [
            r#"{"width": 0, "height": 100}"#,
            r#"{"width": 100, "height": -1}"#,
            r#"{"width": 100000, "height": 100}"#,
            r#"{"width": "wide"}"#,
        ] {
            let (status, json) = post_generate(&app, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json["success"], false);
            assert!(json["error"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_malformed_json() {
        let app = app();
        let (status, json) = post_generate(&app, "{ nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_get_prompt() {
        let app = app();
        let (status, body) = send(
            &app,
            Request::get("/api/prompts/hero").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["character"], "hero");
        assert_eq!(body["prompt"], "a hero");
        assert_eq!(body["width"], 512);
        assert_eq!(body["height"], 768);
    }

    #[tokio::test]
    async fn test_get_prompt_none_available_is_404() {
        let app = app_with_prompts(&json!({"prompts": []}).to_string());
        let (status, body) = send(
            &app,
            Request::get("/api/prompts/hero").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_random_prompt_ignores_character() {
        let app = app_with_prompts(
            &json!({"prompts": [
                {"character": "hero", "prompt": "a hero"},
                {"character": "villain", "prompt": "a villain"}
            ]})
            .to_string(),
        );

        let mut seen = std::collections::HashSet::new();
        for _ in 0..60 {
            let (status, body) = send(
                &app,
                Request::get("/api/prompts/random").body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            let body: Value = serde_json::from_slice(&body).unwrap();
            seen.insert(body["character"].as_str().unwrap().to_string());
        }
        assert_eq!(seen.len(), 2, "{seen:?}");
    }

    #[tokio::test]
    async fn test_random_prompt_without_text_uses_default() {
        let app = app_with_prompts(&json!({"prompts": [{"character": "blank"}]}).to_string());
        let (status, body) = send(
            &app,
            Request::get("/api/prompts/random").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["prompt"], DEFAULT_PROMPT);
        assert_eq!(body["character"], "blank");
    }

    #[tokio::test]
    async fn test_random_prompt_none_available_is_404() {
        let app = app_with_prompts(&json!({"prompts": []}).to_string());
        let (status, _) = send(
            &app,
            Request::get("/api/prompts/random").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_shipped_frontend_matches_routes() {
        let page = include_str!("../../../../public/index.html");
        assert!(page.contains("fetch('/api/generate'"));
        assert!(page.contains("fetch('/api/prompts/random')"));
        assert!(page.contains("id=\"download\""));
        assert!(page.contains("id=\"share\""));
    }

    #[tokio::test]
    async fn test_serves_static_frontend() {
        let app = app();
        let (status, body) = send(&app, Request::get("/index.html").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>imagegen</h1>");

        let (status, _) = send(&app, Request::get("/missing.js").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
