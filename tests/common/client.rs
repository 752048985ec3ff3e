//! HTTP client wrapper for the media endpoints

use reqwest::{Client, Response};

pub struct TestClient {
    pub client: Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// GET /media/{path}
    pub async fn get_media(&self, path: &str) -> Response {
        self.client
            .get(format!("{}/media/{}", self.base_url, path))
            .send()
            .await
            .expect("Get media request failed")
    }

    /// GET /media/{path}?style={style}
    pub async fn get_styled_media(&self, path: &str, style: &str) -> Response {
        self.client
            .get(format!("{}/media/{}", self.base_url, path))
            .query(&[("style", style)])
            .send()
            .await
            .expect("Get styled media request failed")
    }

    /// GET /v1/styles
    pub async fn list_styles(&self) -> Response {
        self.client
            .get(format!("{}/v1/styles", self.base_url))
            .send()
            .await
            .expect("List styles request failed")
    }

    /// GET /v1/styles/resolve?url={url}&style={style}
    pub async fn resolve_style(&self, url: &str, style: &str) -> Response {
        self.client
            .get(format!("{}/v1/styles/resolve", self.base_url))
            .query(&[("url", url), ("style", style)])
            .send()
            .await
            .expect("Resolve style request failed")
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /metrics
    pub async fn metrics(&self) -> Response {
        self.client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await
            .expect("Metrics request failed")
    }
}
