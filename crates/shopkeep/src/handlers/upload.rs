//! Pre-signed upload endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::extractors::{ApiJson, ApiPath, AuthUser};
use crate::{
    error::ApiError,
    state::AppState,
    upload::{SignedUpload, StoredObject},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUrlRequest {
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<StoredObject>,
}

/// Sign an upload URL (POST /api/upload/sign-url).
pub async fn sign_url(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<SignUrlRequest>,
) -> Result<Json<SignedUpload>, ApiError> {
    let signed = state
        .uploads
        .sign_upload(
            auth.user_id,
            &payload.file_name,
            &payload.content_type,
            payload.folder.as_deref(),
        )
        .await?;

    Ok(Json(signed))
}

/// Delete one of the caller's files (DELETE /api/upload/{*key}).
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(key): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    state.uploads.delete(auth.user_id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's files in the default folder (GET /api/upload/list).
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.uploads.list(auth.user_id, None).await?;
    Ok(Json(FileListResponse { files }))
}

/// The caller's files in `folder` (GET /api/upload/list/{folder}).
pub async fn list_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(folder): ApiPath<String>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = state.uploads.list(auth.user_id, Some(&folder)).await?;
    Ok(Json(FileListResponse { files }))
}
