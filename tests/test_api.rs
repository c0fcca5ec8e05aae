#![cfg(feature = "api")]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use serde_json::Value;
use tower::ServiceExt;

use imagesim::{create_router, AppState, ColorHistogramModel, Config};

const BOUNDARY: &str = "imagesim-test-boundary";

fn test_app(upload_dir: &Path) -> Router {
    let config = Config {
        upload_dir: upload_dir.to_path_buf(),
        ..Config::default()
    };
    let provider = Arc::new(ColorHistogramModel::new(8, 64).unwrap());
    create_router(AppState::new(config, provider))
}

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |x, y| {
        Rgb([color[0].wrapping_add((x * 3) as u8), color[1].wrapping_add((y * 3) as u8), color[2]])
    }));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

/// (field name, file name, content type, bytes)
type Part<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

fn file_part((name, file_name, content_type, data): Part<'_>) -> Vec<u8> {
    let mut part = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        BOUNDARY, name, file_name, content_type
    )
    .into_bytes();
    part.extend_from_slice(data);
    part.extend_from_slice(b"\r\n");
    part
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
    )
    .into_bytes()
}

fn compare_request(parts: Vec<Vec<u8>>) -> Request<Body> {
    let mut body = parts.concat();
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/compare")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    compare_request(parts.iter().copied().map(file_part).collect())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_identical_images() {
    let uploads = tempfile::tempdir().unwrap();
    let image = png([10, 200, 90]);

    let request = multipart_request(&[
        ("image1", "left.png", "image/png", &image[..]),
        ("image2", "right.png", "image/png", &image[..]),
    ]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::OK);
    let similarity = body["similarity"].as_f64().unwrap();
    assert!((similarity - 100.0).abs() < 1e-9);
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_different_images() {
    let uploads = tempfile::tempdir().unwrap();
    let left = png([0, 0, 0]);
    let right = png([150, 60, 250]);

    let request = multipart_request(&[
        ("image1", "left.png", "image/png", &left[..]),
        ("image2", "right.png", "image/png", &right[..]),
    ]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::OK);
    let similarity = body["similarity"].as_f64().unwrap();
    assert!((0.0..100.0).contains(&similarity));
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_missing_second_image() {
    let uploads = tempfile::tempdir().unwrap();
    let image = png([1, 2, 3]);

    let request = multipart_request(&[("image1", "left.png", "image/png", &image[..])]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Both images are required");
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_empty_file_counts_as_missing() {
    let uploads = tempfile::tempdir().unwrap();
    let image = png([1, 2, 3]);

    let request = multipart_request(&[
        ("image1", "left.png", "image/png", &image[..]),
        ("image2", "", "application/octet-stream", &b""[..]),
    ]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Both images are required");
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_text_field_is_not_an_upload() {
    let uploads = tempfile::tempdir().unwrap();
    let image = png([1, 2, 3]);

    let request = compare_request(vec![
        file_part(("image1", "left.png", "image/png", &image[..])),
        text_part("image2", "hello"),
    ]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Both images are required");
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_non_multipart_body_is_missing_input() {
    let uploads = tempfile::tempdir().unwrap();

    let empty = Request::builder()
        .method("POST")
        .uri("/compare")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(uploads.path()), empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Both images are required");

    let form = Request::builder()
        .method("POST")
        .uri("/compare")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("image1=a&image2=b"))
        .unwrap();
    let (status, body) = send(test_app(uploads.path()), form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_undecodable_upload_is_server_error() {
    let uploads = tempfile::tempdir().unwrap();
    let image = png([1, 2, 3]);

    let request = multipart_request(&[
        ("image1", "left.png", "image/png", &image[..]),
        ("image2", "right.png", "image/png", &b"not really a png"[..]),
    ]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_disallowed_extension() {
    let uploads = tempfile::tempdir().unwrap();
    let image = png([1, 2, 3]);

    let request = multipart_request(&[
        ("image1", "left.png", "image/png", &image[..]),
        ("image2", "payload.exe", "application/octet-stream", &image[..]),
    ]);
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unsupported file type"));
    assert!(dir_is_empty(uploads.path()));
}

#[tokio::test]
async fn test_client_filename_never_used_as_path() {
    let root = tempfile::tempdir().unwrap();
    let uploads = root.path().join("uploads");
    let image = png([40, 40, 40]);

    let request = multipart_request(&[
        ("image1", "../escape.png", "image/png", &image[..]),
        ("image2", "../escape.png", "image/png", &image[..]),
    ]);
    let (status, _) = send(test_app(&uploads), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!root.path().join("escape.png").exists());
    assert!(dir_is_empty(&uploads));
}

#[tokio::test]
async fn test_health() {
    let uploads = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(test_app(uploads.path()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "color-histogram");
    assert_eq!(body["dimension"], 512);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["started_at"].as_str().unwrap().parse::<chrono::DateTime<chrono::Utc>>().is_ok());
}

#[tokio::test]
async fn test_index_page() {
    let uploads = tempfile::tempdir().unwrap();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = test_app(uploads.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("name=\"image1\""));
    assert!(html.contains("name=\"image2\""));
}
