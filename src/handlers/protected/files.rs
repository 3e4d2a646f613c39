// handlers/protected/files.rs - /api/files backed by the FTP pool

use axum::{
    body::Bytes,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::permissions::{FILE_DELETE, FILE_UPLOAD, FILE_VIEW};
use crate::error::ApiError;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub folder: String,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct FolderListing {
    pub folder: String,
    pub files: Vec<String>,
}

/// GET /api/files/:folder - names in one folder
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(folder): ApiPath<String>,
) -> ApiResult<FolderListing> {
    user.require(FILE_VIEW)?;
    let files = state.files.list(&folder).await?;
    Ok(ApiResponse::success(FolderListing { folder, files }))
}

/// PUT /api/files/:folder/:name - raw request body becomes the file
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((folder, name)): ApiPath<(String, String)>,
    body: Bytes,
) -> ApiResult<StoredFile> {
    user.require(FILE_UPLOAD)?;
    let size = state.files.upload(&folder, &name, body.to_vec()).await?;
    tracing::info!("{} uploaded {}/{} ({} bytes)", user.username, folder, name, size);
    Ok(ApiResponse::created(StoredFile { folder, name, size }))
}

/// GET /api/files/:folder/:name - file bytes as an attachment
pub async fn download(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((folder, name)): ApiPath<(String, String)>,
) -> Result<Response, ApiError> {
    user.require(FILE_VIEW)?;
    let bytes = state.files.download(&folder, &name).await?;
    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((folder, name)): ApiPath<(String, String)>,
) -> ApiResult<Value> {
    user.require(FILE_DELETE)?;
    state.files.delete(&folder, &name).await?;
    Ok(ApiResponse::success(json!({ "folder": folder, "name": name, "deleted": true })))
}
