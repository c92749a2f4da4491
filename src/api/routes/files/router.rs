//! Router for the files API
//!
//! A single endpoint multiplexed by HTTP method over a flat storage
//! root. Writes go straight to the destination path with no locking
//! or atomic rename, which is a known limitation for concurrent
//! requests touching the same name.

use std::path::Path;
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query;
use http::header;
use tokio_util::io::ReaderStream;

use super::public;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

// Uploads larger than this are rejected by the extractor
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

fn upload_root(state: &SharedState) -> String {
    state
        .read()
        .expect("Unable to read shared state")
        .config
        .upload_path
        .clone()
}

/// The portion of a file name before the first dot
fn base_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// A caller-supplied name must be a single path component so it can't
/// address anything outside the upload root
fn valid_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && name != "." && name != ".."
}

fn invalid_name_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(public::FilesResponse::new("Invalid file name")),
    )
        .into_response()
}

/// Ingest a single multipart `file` field, persisting it under the
/// caller-supplied name. Zip archives are additionally expanded into
/// a sibling directory named after the archive's base name,
/// overwriting on conflict.
async fn upload_file(
    State(state): State<SharedState>,
    Query(params): Query<public::UploadParams>,
    mut multipart: Multipart,
) -> Result<Response, crate::api::public::ApiError> {
    let root = upload_root(&state);
    let file_name = params.file_name;
    if !valid_file_name(&file_name) {
        return Ok(invalid_name_response());
    }

    let mut saved = false;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    axum::Json(public::FilesResponse::new(&e.to_string())),
                )
                    .into_response());
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    axum::Json(public::FilesResponse::new(&e.to_string())),
                )
                    .into_response());
            }
        };
        tokio::fs::write(format!("{}/{}", root, file_name), &data).await?;
        saved = true;
        break;
    }

    if !saved {
        return Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(public::FilesResponse::new("Missing multipart field `file`")),
        )
            .into_response());
    }

    // Expand zip archives next to the original upload
    if file_name.rsplit('.').next() == Some("zip") {
        let archive_path = format!("{}/{}", root, file_name);
        let extract_path = format!("{}/{}", root, base_name(&file_name));
        let result = tokio::task::spawn_blocking(move || -> Result<(), anyhow::Error> {
            let file = std::fs::File::open(&archive_path)?;
            let mut archive = zip::ZipArchive::new(file)?;
            archive.extract(&extract_path)?;
            Ok(())
        })
        .await?;
        if let Err(e) = result {
            tracing::error!("Zip extraction failed: {}", e);
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(public::FilesResponse::new(&e.to_string())),
            )
                .into_response());
        }
    }

    Ok(axum::Json(public::FilesResponse::new("File uploaded successfully")).into_response())
}

/// Delete the named file. Deleting a missing file is a distinct
/// not-found condition, not a silent no-op.
async fn delete_file(
    State(state): State<SharedState>,
    Query(params): Query<public::DeleteParams>,
) -> Result<Response, crate::api::public::ApiError> {
    let root = upload_root(&state);
    if !valid_file_name(&params.file_name) {
        return Ok(invalid_name_response());
    }
    let file_path = format!("{}/{}", root, params.file_name);

    if !tokio::fs::try_exists(&file_path).await? {
        return Ok((
            StatusCode::NOT_FOUND,
            axum::Json(public::FilesResponse::new("File Not Found")),
        )
            .into_response());
    }

    match tokio::fs::remove_file(&file_path).await {
        Ok(()) => {
            Ok(axum::Json(public::FilesResponse::new("File deleted successfully")).into_response())
        }
        Err(e) => Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(public::FilesResponse::new(&e.to_string())),
        )
            .into_response()),
    }
}

/// Stream back the first stored file whose base name matches the
/// requested name, carrying the full matched file name in the
/// content-disposition header.
async fn download_file(
    State(state): State<SharedState>,
    Query(params): Query<public::DownloadParams>,
) -> Result<Response, crate::api::public::ApiError> {
    let root = upload_root(&state);

    let mut matched: Option<String> = None;
    let mut entries = tokio::fs::read_dir(&root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if base_name(&name) == params.filename {
            matched = Some(name);
            break;
        }
    }

    let Some(matched) = matched else {
        return Ok((StatusCode::NOT_FOUND, "File not found").into_response());
    };

    let file = tokio::fs::File::open(Path::new(&root).join(&matched)).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", matched),
        ),
    ];
    Ok((headers, body).into_response())
}

/// Create the files router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/",
            get(download_file).post(upload_file).delete(delete_file),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
