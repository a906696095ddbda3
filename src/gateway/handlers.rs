//! HTTP handlers. Every failure is a [`PlaybookError`], rendered as `{"error": ...}`.

use super::server::AppState;
use super::service::PlaybookOutcome;
use crate::caching::CacheStats;
use crate::catalog;
use crate::core::error::{PlaybookError, PlaybookResult};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

/// Body of `POST /generate_playbook`
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub vulnerability: Option<String>,
}

/// `GET /vulnerabilities`
pub async fn list_vulnerabilities() -> Json<Vec<&'static str>> {
    Json(catalog::labels())
}

/// `POST /generate_playbook`
///
/// A body that is missing, not JSON, or lacks a non-empty `vulnerability` is treated
/// as a missing category.
pub async fn generate_playbook(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> PlaybookResult<Json<PlaybookOutcome>> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected generate_playbook body: {}", rejection);
            GenerateRequest::default()
        }
    };

    let category = request
        .vulnerability
        .filter(|v| !v.is_empty())
        .ok_or(PlaybookError::MissingCategory)?;

    let outcome = state.service.get_or_generate(&category).await?;
    Ok(Json(outcome))
}

/// `GET /export_markdown/:vulnerability`
pub async fn export_markdown(
    State(state): State<AppState>,
    Path(vulnerability): Path<String>,
) -> PlaybookResult<impl IntoResponse> {
    let outcome = state.service.get_or_generate(&vulnerability).await?;
    let headers = attachment_headers("text/markdown; charset=utf-8", &vulnerability, "md")?;

    Ok((headers, outcome.playbook))
}

/// `GET /export_pdf/:vulnerability`
///
/// Responds with a styled HTML page the browser can print to PDF.
pub async fn export_pdf(
    State(state): State<AppState>,
    Path(vulnerability): Path<String>,
) -> PlaybookResult<impl IntoResponse> {
    let outcome = state.service.get_or_generate(&vulnerability).await?;
    let page = state.renderer.render_page(&vulnerability, &outcome.playbook)?;
    let headers = attachment_headers("text/html; charset=utf-8", &vulnerability, "html")?;

    Ok((headers, page))
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "categories": catalog::OWASP_TOP_10.len(),
    }))
}

/// `GET /cache/stats`
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.service.cache().stats().await)
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> PlaybookResult<Html<String>> {
    match tokio::fs::read_to_string(&state.index_file).await {
        Ok(page) => Ok(Html(page)),
        Err(e) => {
            warn!("Could not read index file {}: {}", state.index_file.display(), e);
            Err(PlaybookError::not_found(format!(
                "{} not found",
                state.index_file.display()
            )))
        }
    }
}

/// `<label with spaces replaced by underscores>_Playbook.<extension>`
pub fn export_filename(category: &str, extension: &str) -> String {
    format!("{}_Playbook.{}", category.replace(' ', "_"), extension)
}

fn attachment_headers(
    content_type: &'static str,
    category: &str,
    extension: &str,
) -> PlaybookResult<[(header::HeaderName, HeaderValue); 2]> {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(category, extension)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| PlaybookError::internal(format!("Invalid Content-Disposition: {}", e)))?;

    Ok([
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::CONTENT_DISPOSITION, disposition),
    ])
}
