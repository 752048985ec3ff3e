//! End-to-end tests for the media endpoint
//!
//! Tests serving originals, on-demand derivatives and the fallback paths.

mod common;

use common::*;
use reqwest::StatusCode;

async fn image_dimensions(response: reqwest::Response) -> (u32, u32) {
    let bytes = response.bytes().await.unwrap();
    let img = image::load_from_memory(&bytes).expect("Response is not a decodable image");
    (img.width(), img.height())
}

#[tokio::test]
async fn test_original_is_served_with_cache_headers() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_media(LANDSCAPE_JPG).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    assert_eq!(response.headers()["cache-control"], "max-age=120");
    assert_eq!(image_dimensions(response).await, LANDSCAPE_SIZE);
}

#[tokio::test]
async fn test_non_image_original_is_served() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_media(README_TXT).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "hello");
}

#[tokio::test]
async fn test_thumbnail_fits_within_box() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_styled_media(LANDSCAPE_JPG, STYLE_THUMB).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/jpeg");
    assert_eq!(image_dimensions(response).await, (64, 36));
    assert!(server
        .media_root()
        .join("uploads/blog/image/thumb/landscape.jpg")
        .is_file());
}

#[tokio::test]
async fn test_thumbnail_never_enlarges_small_source() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_styled_media(SMALL_PNG, STYLE_THUMB).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(image_dimensions(response).await, SMALL_SIZE);
}

#[tokio::test]
async fn test_upscale_enlarges_small_source() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_styled_media(SMALL_PNG, STYLE_LARGE).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(image_dimensions(response).await, (120, 90));
}

#[tokio::test]
async fn test_crop_fills_exact_box() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for source in [LANDSCAPE_JPG, PORTRAIT_PNG] {
        let response = client.get_styled_media(source, STYLE_SQUARE).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", source);
        assert_eq!(image_dimensions(response).await, (50, 50), "{}", source);
    }
}

#[tokio::test]
async fn test_unknown_style_returns_400() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_styled_media(LANDSCAPE_JPG, "poster").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!server
        .media_root()
        .join("uploads/blog/image/poster")
        .exists());
}

#[tokio::test]
async fn test_missing_media_returns_404() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_media("uploads/blog/image/nothing.jpg").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get_styled_media("uploads/blog/image/nothing.jpg", STYLE_THUMB)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!server
        .media_root()
        .join("uploads/blog/image/thumb")
        .exists());
}

#[tokio::test]
async fn test_undecodable_image_is_not_served_styled() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_styled_media(FAKE_IMAGE_PNG, STYLE_THUMB).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get_styled_media(README_TXT, STYLE_THUMB).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_derivative_is_reused() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let derived = server
        .media_root()
        .join("uploads/blog/image/square/portrait.png");

    let response = client.get_styled_media(PORTRAIT_PNG, STYLE_SQUARE).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(derived.is_file());

    // Overwrite the derivative, a regeneration would bring back 50x50
    image::RgbImage::new(7, 7).save(&derived).unwrap();

    let response = client.get_styled_media(PORTRAIT_PNG, STYLE_SQUARE).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(image_dimensions(response).await, (7, 7));
}
