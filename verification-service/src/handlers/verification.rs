use crate::dtos::{
    CertificationBatchResponse, DocumentUploadResponse, PhotoUploadResponse,
    VerificationStateResponse,
};
use crate::middleware::user_id::UserId;
use crate::models::DocumentField;
use crate::services::image;
use crate::services::storage::Bucket;
use crate::services::uploader::{UploadError, UploadFile, UploadOptions};
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use service_core::error::AppError;

const PHOTO_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg", "image/webp"];

async fn next_file(multipart: &mut Multipart) -> Result<Option<UploadFile>, AppError> {
    let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })?
    else {
        return Ok(None);
    };

    let name = field.file_name().unwrap_or("unnamed").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e)))?
        .to_vec();

    Ok(Some(UploadFile {
        name,
        content_type,
        data,
    }))
}

pub async fn get_verification_state(
    State(state): State<AppState>,
    user_id: UserId,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state.verification.state(&user_id.0);
    Ok(Json(VerificationStateResponse::from(snapshot)))
}

/// Upload one document into a named slot.
///
/// Validation and backend failures land in the slot's status rather than an
/// HTTP error, leaving the control retryable and the rest of the form alone.
pub async fn upload_verification_document(
    State(state): State<AppState>,
    user_id: UserId,
    Path(field): Path<DocumentField>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = next_file(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    tracing::info!(
        owner_id = %user_id.0,
        field = %field,
        file = %file.name,
        size = file.data.len(),
        "Verification document upload started"
    );

    let status = state
        .verification
        .upload_document(&user_id.0, field, file)
        .await;
    let can_continue = state.verification.state(&user_id.0).can_continue();

    Ok(Json(DocumentUploadResponse {
        field,
        status,
        can_continue,
    }))
}

pub async fn remove_verification_document(
    State(state): State<AppState>,
    user_id: UserId,
    Path(field): Path<DocumentField>,
) -> Result<impl IntoResponse, AppError> {
    state
        .verification
        .remove_document(&user_id.0, field)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload any number of certification files in one concurrent batch.
pub async fn upload_certifications(
    State(state): State<AppState>,
    user_id: UserId,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut files = Vec::new();
    while let Some(file) = next_file(&mut multipart).await? {
        files.push(file);
    }
    if files.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("No files uploaded")));
    }

    tracing::info!(
        owner_id = %user_id.0,
        count = files.len(),
        "Certification batch upload started"
    );

    let batch = state
        .verification
        .upload_certifications(&user_id.0, files)
        .await;

    Ok(Json(CertificationBatchResponse::from(batch)))
}

#[derive(Debug, Deserialize)]
pub struct PhotoParams {
    pub compress: Option<bool>,
}

/// Upload a studio photo, optionally downscaling and re-encoding it first.
pub async fn upload_studio_photo(
    State(state): State<AppState>,
    user_id: UserId,
    Query(params): Query<PhotoParams>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let file = next_file(&mut multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    let compress = params.compress.unwrap_or(false);
    let file = if compress {
        let compressed = image::compress_in_background(
            file.name,
            file.data,
            image::DEFAULT_MAX_WIDTH,
            image::DEFAULT_QUALITY,
        )
        .await?;
        UploadFile {
            name: compressed.name,
            content_type: compressed.content_type,
            data: compressed.data,
        }
    } else {
        file
    };

    let options = UploadOptions {
        allowed_types: PHOTO_TYPES.iter().map(|t| t.to_string()).collect(),
        ..UploadOptions::new(Bucket::StudioPhotos)
    };

    match state.uploader.upload(file, &user_id.0, &options).await {
        Ok(stored) => Ok((
            StatusCode::CREATED,
            Json(PhotoUploadResponse {
                url: stored.url,
                path: stored.path,
                compressed: compress,
            }),
        )),
        Err(e @ (UploadError::SizeExceeded(_) | UploadError::TypeNotAllowed(_))) => {
            Err(AppError::BadRequest(anyhow::Error::new(e)))
        }
        Err(UploadError::Backend(message)) => {
            Err(AppError::StorageError(anyhow::anyhow!(message)))
        }
    }
}
