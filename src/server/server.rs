use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{http_cache, log_requests, metrics, state::*, ServerConfig};
use crate::generator::{Derivative, DerivativeGenerator, DerivativeOutcome};
use crate::styles::{Size, StyleKind};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub processor: &'static str,
    pub media_url: String,
    pub styles: usize,
}

#[derive(Serialize, Debug, PartialEq)]
struct StyleSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StyleKind,
    pub size: Size,
}

#[derive(Deserialize, Debug)]
struct MediaQuery {
    pub style: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResolveQuery {
    pub url: String,
    pub style: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        processor: state.generator.processor_name(),
        media_url: state.generator.layout().url_prefix().to_string(),
        styles: state.generator.styles().len(),
    };
    Json(stats)
}

async fn get_styles(State(generator): State<GuardedGenerator>) -> impl IntoResponse {
    let styles: Vec<StyleSummary> = generator
        .styles()
        .iter()
        .map(|(name, style)| StyleSummary {
            name: name.to_string(),
            kind: style.kind,
            size: style.target,
        })
        .collect();
    Json(styles)
}

async fn resolve_style(
    State(generator): State<GuardedGenerator>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    match generator
        .get_or_create_derivative(&query.url, &query.style)
        .await
    {
        Ok(derivative) => Json(derivative).into_response(),
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    }
}

/// Serves `/media/<path>`, or its derivative when `?style=` is given. When a
/// derivative cannot be produced the original is served instead, marked
/// `no-store` so clients ask again once the derivative exists.
async fn get_media(
    State(generator): State<GuardedGenerator>,
    Path(path): Path<String>,
    Query(query): Query<MediaQuery>,
) -> Response {
    let (file_path, images_only, no_store) = match query.style {
        None => match generator.layout().resolve_path(&path) {
            Ok(file_path) => (file_path, false, false),
            Err(err) => {
                debug!("Rejected media path {}: {}", path, err);
                return StatusCode::NOT_FOUND.into_response();
            }
        },
        Some(style) => match generator.get_or_create_derivative_at(&path, &style).await {
            Ok(Derivative {
                file: Some(file_path),
                outcome,
                ..
            }) => (file_path, true, outcome == DerivativeOutcome::Fallback),
            Ok(_) => {
                debug!("Rejected media path {}", path);
                return StatusCode::NOT_FOUND.into_response();
            }
            Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        },
    };

    let buffer = match tokio::fs::read(&file_path).await {
        Ok(buffer) => buffer,
        Err(err) => {
            debug!("Cannot read {:?}: {}", file_path, err);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let mime_type = match infer::get(&buffer) {
        Some(kind) => kind.mime_type(),
        None => "application/octet-stream",
    };
    if images_only && !mime_type.starts_with("image/") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut response = ([(header::CONTENT_TYPE, mime_type)], buffer).into_response();
    if no_store {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    response
}

pub fn make_app(config: ServerConfig, generator: Arc<DerivativeGenerator>) -> Result<Router> {
    let state = ServerState::new(config.clone(), generator);

    let media_routes: Router = Router::new()
        .route("/media/{*path}", get(get_media))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let style_routes: Router = Router::new()
        .route("/", get(get_styles))
        .route("/resolve", get(resolve_style))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(state.clone())
        .merge(media_routes)
        .nest("/v1/styles", style_routes);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, generator: Arc<DerivativeGenerator>) -> Result<()> {
    let port = config.port;
    let app = make_app(config, generator)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
