//! Axum route handlers for the CV API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;

use crate::cv::{list_user_cvs, upload_cv, CvUpload};
use crate::errors::AppError;
use crate::models::cv::CvRecord;
use crate::state::AppState;

/// POST /cv/upload
///
/// Multipart fields: `user_id` and the CV `file`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CvRecord>, AppError> {
    let mut user_id: Option<i64> = None;
    let mut file: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable user_id: {e}")))?;
                user_id = Some(value.trim().parse().map_err(|_| {
                    AppError::Validation("user_id must be an integer".to_string())
                })?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("cv").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable file: {e}")))?;
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::Validation("A CV file is required".to_string()))?;

    let record = upload_cv(
        state.repo.as_ref(),
        state.ai.as_ref(),
        CvUpload {
            user_id,
            file_name,
            content_type,
            data,
        },
    )
    .await?;
    Ok(Json(record))
}

/// GET /cv/user/:user_id
pub async fn handle_list(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<CvRecord>>, AppError> {
    Ok(Json(list_user_cvs(state.repo.as_ref(), user_id).await?))
}
