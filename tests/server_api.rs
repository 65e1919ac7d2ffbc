//! End-to-end tests against a running service on an ephemeral port.
//!
//! Each test starts its own server with an in-memory store and, where pages
//! are exercised, a stub generator that answers instantly without network.
//!
//! Run with: cargo test --test server_api

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use std::io::Cursor;
use std::sync::Arc;
use style_morph::app::AppState;
use style_morph::config::ServerConfig;
use style_morph::data_uri::DataUri;
use style_morph::generation::{GenerationError, GenerationService};
use style_morph::server;
use style_morph::store::{HttpStore, MemoryStore, PostStore};
use style_morph::types::Post;

/// Captions echo their inputs; restyles relabel the original as PNG.
struct StubGenerator;

#[async_trait]
impl GenerationService for StubGenerator {
    async fn caption(
        &self,
        _image: &DataUri,
        instruction: &str,
        language: &str,
    ) -> Result<String, GenerationError> {
        Ok(format!("{instruction} ({language})"))
    }

    async fn restyle(&self, image: &DataUri, _style: &str) -> Result<DataUri, GenerationError> {
        Ok(DataUri::new("image/png", image.payload()))
    }
}

fn state(with_generator: bool) -> AppState {
    state_with_store(Arc::new(MemoryStore::new()), with_generator)
}

fn state_with_store(store: Arc<dyn PostStore>, with_generator: bool) -> AppState {
    let generator: Option<Arc<dyn GenerationService>> = if with_generator {
        Some(Arc::new(StubGenerator))
    } else {
        None
    };
    AppState::new(store, generator)
}

/// A remote store on a port nothing listens on.
fn dead_remote_store() -> Arc<dyn PostStore> {
    Arc::new(HttpStore::new("http://127.0.0.1:9"))
}

async fn spawn(state: AppState, config: ServerConfig) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(state, &config);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

fn sample_post(id: &str) -> Post {
    Post {
        id: id.to_string(),
        original_image: "data:image/jpeg;base64,AAAA".to_string(),
        transformed_image: "data:image/png;base64,BBBB".to_string(),
        output_text: "A lighthouse at dusk.".to_string(),
        output_prompt: "Describe the scene".to_string(),
        output_language: "English".to_string(),
        style_prompt: "Watercolor".to_string(),
        timestamp: 1_700_000_000_000,
        minimal_view: false,
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn photo_part(bytes: Vec<u8>) -> Part {
    Part::bytes(bytes)
        .file_name("photo.png")
        .mime_str("image/png")
        .unwrap()
}

// ============================================================================
// JSON API
// ============================================================================

#[tokio::test]
async fn health_reports_post_count() {
    let base = spawn(state(false), ServerConfig::default()).await;
    let body: serde_json::Value = client()
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({"ok": true, "count": 0}));
}

#[tokio::test]
async fn http_store_round_trips_through_service() {
    let base = spawn(state(false), ServerConfig::default()).await;
    let store = HttpStore::new(&base);

    store.save(&sample_post("round001")).await.unwrap();

    assert_eq!(
        store.get("round001").await.unwrap(),
        Some(sample_post("round001"))
    );
    assert_eq!(store.get("missing1").await.unwrap(), None);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn http_store_round_trips_ids_with_reserved_characters() {
    let base = spawn(state(false), ServerConfig::default()).await;
    let store = HttpStore::new(&base);

    for id in ["a%20b", "a?b", "a#b", "a b"] {
        store.save(&sample_post(id)).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), Some(sample_post(id)), "{id}");
    }
    assert_eq!(store.list().await.unwrap().len(), 4);
}

#[tokio::test]
async fn health_without_countable_store_is_still_ok() {
    let base = spawn(
        state_with_store(dead_remote_store(), false),
        ServerConfig::default(),
    )
    .await;
    let response = client()
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"ok": true}));
}

#[tokio::test]
async fn save_returns_receipt() {
    let base = spawn(state(false), ServerConfig::default()).await;
    let response = client()
        .post(format!("{base}/api/posts"))
        .json(&sample_post("receipt1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok", "id": "receipt1"}));
}

#[tokio::test]
async fn missing_post_is_404_with_detail() {
    let base = spawn(state(false), ServerConfig::default()).await;
    let response = client()
        .get(format!("{base}/api/posts/nothere1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Post not found");
}

#[tokio::test]
async fn unknown_api_path_is_404_json() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let response = client()
        .get(format!("{base}/api/does/not/exist"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Not found");
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn root_redirects_to_fresh_id() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let response = client().get(format!("{base}/")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[LOCATION].to_str().unwrap();
    let id = location.strip_prefix("/id/").unwrap();
    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
}

#[tokio::test]
async fn unknown_id_shows_creation_form() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let response = client()
        .get(format!("{base}/id/unused01"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Create Magic"));
    assert!(html.contains(r#"action="/id/unused01""#));
}

#[tokio::test]
async fn prompt_link_shows_capture_form() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let html = client()
        .get(format!("{base}/Write%20a%20plot/id/unused02"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Quick Capture"));
    assert!(html.contains("Write a plot"));
}

#[tokio::test]
async fn stored_id_shows_post() {
    let state = state(true);
    state.store.save(&sample_post("stored01")).await.unwrap();
    let base = spawn(state, ServerConfig::default()).await;

    let html = client()
        .get(format!("{base}/id/stored01"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("A lighthouse at dusk."));
    assert!(html.contains("Style: Watercolor"));
}

#[tokio::test]
async fn missing_credential_blocks_pages_but_not_api() {
    let base = spawn(state(false), ServerConfig::default()).await;

    let page = client()
        .get(format!("{base}/id/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(page.text().await.unwrap().contains("Configuration Error"));

    let api = client()
        .get(format!("{base}/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_creates_post_and_redirects() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let form = Form::new()
        .part("image", photo_part(png_bytes(2000, 1000)))
        .text("style_prompt", "Made of Lego")
        .text("output_prompt", "Describe it")
        .text("output_language", "French");

    let response = client()
        .post(format!("{base}/id/upload01"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/id/upload01");

    let post: Post = client()
        .get(format!("{base}/api/posts/upload01"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(post.style_prompt, "Made of Lego");
    assert_eq!(post.output_text, "Describe it (French)");
    assert_eq!(post.output_language, "French");
    assert!(post.original_image.starts_with("data:image/jpeg;base64,"));
    assert!(post.transformed_image.starts_with("data:image/png;base64,"));
    assert!(!post.minimal_view);
}

#[tokio::test]
async fn prompt_upload_creates_minimal_caption_only_post() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let form = Form::new().part("image", photo_part(png_bytes(64, 48)));

    let response = client()
        .post(format!("{base}/Write%20a%20haiku/id/prompt01"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let post: Post = client()
        .get(format!("{base}/api/posts/prompt01"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(post.minimal_view);
    assert_eq!(post.style_prompt, "Original");
    assert_eq!(post.output_prompt, "Write a haiku");
    assert_eq!(post.output_text, "Write a haiku (English)");
    assert_eq!(post.transformed_image, post.original_image);
}

#[tokio::test]
async fn upload_to_encoded_id_is_readable_through_api() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let form = Form::new()
        .part("image", photo_part(png_bytes(32, 32)))
        .text("output_prompt", "Describe it");

    let response = client()
        .post(format!("{base}/id/a%20b"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let api = client()
        .get(format!("{base}/api/posts/a%20b"))
        .send()
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::OK);
    let post: Post = api.json().await.unwrap();
    assert_eq!(post.id, "a b");

    let page = client()
        .get(format!("{base}/id/a%20b"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Describe it (English)"));
}

#[tokio::test]
async fn failed_save_rerenders_form_with_error() {
    let base = spawn(
        state_with_store(dead_remote_store(), true),
        ServerConfig::default(),
    )
    .await;
    let form = Form::new()
        .part("image", photo_part(png_bytes(64, 48)))
        .text("style_prompt", "Made of Lego");

    let response = client()
        .post(format!("{base}/id/nosave01"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = response.text().await.unwrap();
    assert!(html.contains("Failed to save. Please try again."));
    assert!(html.contains("Create Magic"));
    assert!(html.contains(r#"action="/id/nosave01""#));
}

#[tokio::test]
async fn undecodable_upload_rerenders_form_with_error() {
    let base = spawn(state(true), ServerConfig::default()).await;
    let form = Form::new()
        .part("image", photo_part(b"definitely not a photo".to_vec()))
        .text("style_prompt", "Lego");

    let response = client()
        .post(format!("{base}/id/broken01"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = response.text().await.unwrap();
    assert!(html.contains("Failed to process image. Try another."));
    assert!(html.contains("Create Magic"));

    let missing = client()
        .get(format!("{base}/api/posts/broken01"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Static fallback
// ============================================================================

#[tokio::test]
async fn static_dir_serves_files_and_redirects_the_rest() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("robots.txt"), "User-agent: *\n").unwrap();
    let config = ServerConfig {
        static_dir: Some(dir.path().to_string_lossy().into_owned()),
        ..ServerConfig::default()
    };
    let base = spawn(state(true), config).await;

    let file = client()
        .get(format!("{base}/robots.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(file.status(), StatusCode::OK);
    assert_eq!(file.text().await.unwrap(), "User-agent: *\n");

    let other = client()
        .get(format!("{base}/no/such/file"))
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::SEE_OTHER);
    assert!(
        other.headers()[LOCATION]
            .to_str()
            .unwrap()
            .starts_with("/id/")
    );
}
