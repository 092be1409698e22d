use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::routing::get;
use fc_kernel::domain::config::{ApiConfig, ApiConfigInner};
use fc_server::Server;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

const CHAR_ID: &str = "507f1f77bcf86cd799439011";
const BASE_URL: &str = "https://img.example.com/faces/";

struct TestApp {
    router: Router,
    images: TempDir,
    source: String,
}

fn png_fixture() -> Vec<u8> {
    let img = RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn serve_fixtures() -> String {
    let png = png_fixture();
    let router = Router::new()
        .route(
            "/portrait.png",
            get(move || {
                let png = png.clone();
                async move { ([(header::CONTENT_TYPE, "image/png")], png) }
            }),
        )
        .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

async fn test_app() -> TestApp {
    let images = TempDir::new().unwrap();
    let mut inner = ApiConfigInner::default();
    inner.storage.images_dir = images.path().to_path_buf();
    inner.storage.base_url = BASE_URL.into();

    let server = Server::builder().config(ApiConfig::from(inner)).build().await.unwrap();
    TestApp { router: server.router(), images, source: serve_fixtures().await }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn upload(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/image/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder().method(Method::DELETE).uri(uri).body(Body::empty()).unwrap()
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn health_reports_up() {
    let app = test_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
}

#[tokio::test]
async fn upload_then_delete_round_trip() {
    let app = test_app().await;
    let payload = json!({
        "guild": 200_u64,
        "user": 100_u64,
        "charid": CHAR_ID,
        "image_url": format!("{}/portrait.png", app.source),
    });

    let (status, body) = send(&app.router, upload(&payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let url = body.as_str().expect("upload responds with a JSON string");
    let prefix = format!("https://img.example.com/faces/{CHAR_ID}/");
    let relative = url.strip_prefix("https://img.example.com/faces/").unwrap().to_owned();
    assert!(url.starts_with(&prefix), "{url}");
    assert!(url.ends_with(".webp"), "{url}");

    let stored = app.images.path().join(&relative);
    let bytes = std::fs::read(&stored).unwrap();
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");

    let (status, body) = send(&app.router, delete(&format!("/image/{relative}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(format!("Deleted {relative}")));
    assert!(!stored.exists());
    assert!(!app.images.path().join(CHAR_ID).exists(), "empty character dir should be pruned");
    assert!(app.images.path().exists(), "root is never pruned");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/image/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"charid\": "))
        .unwrap();

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn non_http_url_is_rejected_without_side_effects() {
    let app = test_app().await;
    let payload = json!({ "charid": CHAR_ID, "image_url": "ftp://example.com/portrait.png" });

    let (status, body) = send(&app.router, upload(&payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid image URL");
    assert_eq!(count_files(app.images.path()), 0);
}

#[tokio::test]
async fn invalid_character_id_is_rejected() {
    let app = test_app().await;
    let payload =
        json!({ "charid": "../../etc", "image_url": format!("{}/portrait.png", app.source) });

    let (status, _) = send(&app.router, upload(&payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(count_files(app.images.path()), 0);
}

#[tokio::test]
async fn failed_download_is_bad_gateway() {
    let app = test_app().await;
    let payload =
        json!({ "charid": CHAR_ID, "image_url": format!("{}/missing.png", app.source) });

    let (status, body) = send(&app.router, upload(&payload)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "failed to download image");
}

#[tokio::test]
async fn deleting_unknown_image_is_not_found() {
    let app = test_app().await;

    let (status, body) =
        send(&app.router, delete(&format!("/image/{CHAR_ID}/000000000000000000000000.webp"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn deleting_outside_the_root_is_rejected() {
    let app = test_app().await;

    let (status, _) = send(&app.router, delete("/image/..%2F..%2Fetc%2Fpasswd")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_directory_through_the_image_route_is_rejected() {
    let app = test_app().await;
    std::fs::create_dir(app.images.path().join(CHAR_ID)).unwrap();

    let (status, _) = send(&app.router, delete(&format!("/image/{CHAR_ID}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.images.path().join(CHAR_ID).is_dir());
}

#[tokio::test]
async fn error_bodies_never_reveal_the_images_dir() {
    let app = test_app().await;
    let dir = app.images.path().join(CHAR_ID);
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("a.webp"), b"1").unwrap();

    let images = app.images.path().to_str().unwrap().to_owned();
    let canonical = app.images.path().canonicalize().unwrap().to_str().unwrap().to_owned();

    let cases = [
        ("/image/..%2F..%2Fetc%2Fpasswd".to_owned(), StatusCode::BAD_REQUEST, "invalid path"),
        (format!("/image/{CHAR_ID}/missing.webp"), StatusCode::NOT_FOUND, "Image not found"),
        (format!("/image/{CHAR_ID}/a.webp/extra"), StatusCode::NOT_FOUND, "Image not found"),
        (format!("/image/{CHAR_ID}"), StatusCode::BAD_REQUEST, "Cannot delete directory"),
    ];

    for (uri, expected_status, expected_error) in cases {
        let (status, body) = send(&app.router, delete(&uri)).await;
        let error = body["error"].as_str().unwrap();

        assert_eq!(status, expected_status, "{uri}");
        assert_eq!(error, expected_error, "{uri}");
        assert!(!error.contains(&images) && !error.contains(&canonical), "{uri}: {error}");
    }
    assert!(dir.join("a.webp").exists());
}

#[tokio::test]
async fn character_delete_removes_every_image() {
    let app = test_app().await;
    let url = format!("{}/portrait.png", app.source);
    for _ in 0..3 {
        let (status, _) =
            send(&app.router, upload(&json!({ "charid": CHAR_ID, "image_url": url }))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(count_files(&app.images.path().join(CHAR_ID)), 3);

    let (status, body) = send(&app.router, delete(&format!("/character/{CHAR_ID}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(format!("Deleted all images: {CHAR_ID}")));
    assert!(!app.images.path().join(CHAR_ID).exists());

    let (status, _) = send(&app.router, delete(&format!("/character/{CHAR_ID}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn character_delete_requires_valid_id() {
    let app = test_app().await;

    let (status, _) = send(&app.router, delete("/character/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_reference_is_served() {
    let app = test_app().await;
    let request = Request::builder().uri("/api").body(Body::empty()).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn build_fails_without_base_url() {
    let images = TempDir::new().unwrap();
    let mut inner = ApiConfigInner::default();
    inner.storage.images_dir = images.path().to_path_buf();

    let result = Server::builder().config(ApiConfig::from(inner)).build().await;
    assert!(result.is_err());
}
