//! CV intake: upload, text extraction and per-user listing.
//!
//! The extracted text is summarised into insights by the AI service at
//! upload. Insights, or the raw text when extraction failed, seed question
//! generation for interviews started with a CV.

pub mod extract;
pub mod handlers;

use bytes::Bytes;
use tracing::{info, warn};

use crate::ai_gateway::AiGateway;
use crate::errors::AppError;
use crate::models::cv::{CvInsights, CvRecord, NewCv};
use crate::repository::Repository;

use extract::{extract_text, CvFormat};

/// Uploads larger than this are rejected before parsing.
pub const MAX_CV_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct CvUpload {
    pub user_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Validates, extracts and stores a CV. Insight extraction is best-effort:
/// the CV is kept with its raw text when the AI service fails.
pub async fn upload_cv(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    upload: CvUpload,
) -> Result<CvRecord, AppError> {
    if !repo.user_exists(upload.user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", upload.user_id)));
    }
    if upload.data.is_empty() {
        return Err(AppError::Validation("The uploaded file is empty.".to_string()));
    }
    if upload.data.len() > MAX_CV_BYTES {
        return Err(AppError::Validation(format!(
            "CV files are limited to {} MB.",
            MAX_CV_BYTES / (1024 * 1024)
        )));
    }

    let format = CvFormat::detect(&upload.content_type, &upload.file_name).ok_or_else(|| {
        AppError::Validation("Only PDF or plain-text CVs are supported.".to_string())
    })?;

    let extracted_text = extract_text(format, upload.data).await?;

    let mut record = repo
        .save_cv(NewCv {
            user_id: upload.user_id,
            file_name: upload.file_name,
            content_type: upload.content_type,
            extracted_text,
        })
        .await?;

    info!(
        "Stored CV {} for user {} ({} chars of text)",
        record.id,
        record.user_id,
        record.extracted_text.as_deref().map_or(0, str::len)
    );

    record.insights = extract_insights(repo, ai, &record).await;
    Ok(record)
}

async fn extract_insights(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    record: &CvRecord,
) -> Option<CvInsights> {
    let text = record.extracted_text.as_deref()?;

    let insights = match ai.extract_insights(text).await {
        Ok(insights) if insights.as_context().is_some() => insights,
        Ok(_) => {
            info!("No insights extracted from CV {}", record.id);
            return None;
        }
        Err(e) => {
            warn!("Insight extraction failed for CV {}: {e}", record.id);
            return None;
        }
    };

    match repo.save_cv_insights(record.id, &insights).await {
        Ok(()) => Some(insights),
        Err(e) => {
            warn!("Failed to store insights for CV {}: {e}", record.id);
            None
        }
    }
}

pub async fn list_user_cvs(repo: &dyn Repository, user_id: i64) -> Result<Vec<CvRecord>, AppError> {
    if !repo.user_exists(user_id).await? {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }
    repo.list_cvs(user_id).await
}
