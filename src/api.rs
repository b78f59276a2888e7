use std::path::PathBuf;

use axum::body::Body;
use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, get_service, post};
use axum::{Form, Json, Router};
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::database::ClipboardStore;
use crate::error::{Result, ShareError};
use crate::files::FileDirectory;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub clipboard: ClipboardStore,
    pub files: FileDirectory,
    /// Directory holding `index.html` and `static/`.
    pub web_root: PathBuf,
    /// Body size cap for `/upload`.
    pub max_upload_bytes: usize,
}

pub fn router(state: AppState) -> Router {
    let index = ServeFile::new(state.web_root.join("index.html"));
    let assets = ServeDir::new(state.web_root.join("static"));

    Router::new()
        // Single-page frontend
        .route("/", get_service(index.clone()))
        .route("/list", get_service(index.clone()))
        .route("/clipboard", get_service(index).post(create_clipboard))
        .nest_service("/static", assets)
        // Files
        .route("/file", get(list_files))
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/download", get(download_file))
        .route("/list/delete", post(delete_file))
        // Clipboard
        .route("/clipboard/info", get(list_clipboard))
        .route("/clipboard/delete", delete(delete_clipboard))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn multipart_error(e: MultipartError) -> ShareError {
    ShareError::invalid(e.body_text())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// -- Files ----------------------------------------------------------------

async fn list_files(State(state): State<AppState>) -> Result<Json<Value>> {
    let files = state.files.list().await?;
    Ok(Json(json!({ "files": files })))
}

async fn upload_files(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart.map_err(|e| ShareError::invalid(e.body_text()))?;

    let mut batch = state.files.store();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_owned();
        batch.add(&name, field.map_err(multipart_error)).await?;
    }

    let stored = batch.finish()?;
    Ok(Json(json!({ "message": format!("{stored} file(s) uploaded") })))
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    #[serde(default)]
    filename: String,
}

/// `attachment` disposition with an ASCII fallback plus the RFC 5987 UTF-8 form.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            let safe = c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\');
            if safe { c } else { '_' }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(name, NON_ALPHANUMERIC)
    )
}

async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response> {
    if query.filename.is_empty() {
        return Err(ShareError::invalid("filename is required"));
    }

    let fetched = state.files.fetch(&query.filename).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
        (header::CONTENT_LENGTH, fetched.len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&query.filename),
        ),
    ];
    let body = Body::from_stream(ReaderStream::new(fetched.file));

    Ok((headers, body).into_response())
}

#[derive(Debug, Deserialize)]
struct DeleteFileRequest {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    password: String,
}

async fn delete_file(
    State(state): State<AppState>,
    payload: std::result::Result<Json<DeleteFileRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| ShareError::invalid(e.body_text()))?;

    state
        .files
        .delete(&request.filename, &request.password)
        .await?;
    Ok(Json(json!({ "message": "file deleted" })))
}

// -- Clipboard ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ClipboardForm {
    #[serde(default)]
    context: String,
}

/// Pull the `context` field out of a urlencoded or multipart form body.
async fn read_context(request: Request) -> Result<String> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if !is_multipart {
        let Form(form) = Form::<ClipboardForm>::from_request(request, &())
            .await
            .map_err(|e| ShareError::invalid(e.body_text()))?;
        return Ok(form.context);
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ShareError::invalid(e.body_text()))?;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("context") {
            return field.text().await.map_err(multipart_error);
        }
    }
    Ok(String::new())
}

async fn create_clipboard(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<Value>)> {
    let context = read_context(request).await?;

    let store = state.clipboard.clone();
    let id = tokio::task::spawn_blocking(move || store.create(&context)).await??;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "clipboard entry created", "id": id })),
    ))
}

async fn list_clipboard(State(state): State<AppState>) -> Result<Json<Value>> {
    let store = state.clipboard.clone();
    let entries = tokio::task::spawn_blocking(move || store.list()).await??;
    Ok(Json(json!({ "data": entries })))
}

#[derive(Debug, Deserialize)]
struct ClipboardDeleteQuery {
    id: Option<String>,
}

async fn delete_clipboard(
    State(state): State<AppState>,
    Query(query): Query<ClipboardDeleteQuery>,
) -> Result<Json<Value>> {
    let raw = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ShareError::invalid("id is required"))?;
    let id: i64 = raw
        .parse()
        .map_err(|_| ShareError::invalid(format!("invalid id {raw:?}")))?;

    let store = state.clipboard.clone();
    tokio::task::spawn_blocking(move || store.delete(id)).await??;
    Ok(Json(json!({ "message": "clipboard entry deleted" })))
}
