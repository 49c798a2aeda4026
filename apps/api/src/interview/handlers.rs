//! Axum route handlers for the Interview API.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::ai_gateway::wire::InterviewSummary;
use crate::errors::AppError;
use crate::interview::expiration::expire_stale_interviews;
use crate::interview::scoring::ScoreBreakdown;
use crate::interview::session::{
    self, AnswerOutcome, AnswerSubmission, EndOutcome, InterviewSummaryView,
    StartInterviewRequest, StartedInterview,
};
use crate::models::interview::{
    AnswerInput, FeedbackReport, InterviewListItem, InterviewSnapshot, InterviewType,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub interview_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChatAnswerRequest {
    pub interview_id: i64,
    pub question_id: i64,
    pub answer_text: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditAnswerRequest {
    pub interview_id: i64,
    pub question_id: i64,
    pub answer_text: String,
}

#[derive(Debug, Serialize)]
pub struct ExpirationResponse {
    pub expired_count: usize,
    pub expired_interview_ids: Vec<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Start
// ────────────────────────────────────────────────────────────────────────────

/// POST /interview/start
pub async fn handle_start(
    State(state): State<AppState>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<StartResponse>, AppError> {
    let started = session::start_interview(state.repo.as_ref(), state.ai.as_ref(), request).await?;
    Ok(Json(StartResponse {
        interview_id: started.interview_id,
    }))
}

/// POST /interview/chat/start
pub async fn handle_start_chat(
    State(state): State<AppState>,
    Json(mut request): Json<StartInterviewRequest>,
) -> Result<Json<StartedInterview>, AppError> {
    request.interview_type = InterviewType::Chat.as_str().to_string();
    let started = session::start_interview(state.repo.as_ref(), state.ai.as_ref(), request).await?;
    Ok(Json(started))
}

/// POST /interview/voice/start
pub async fn handle_start_voice(
    State(state): State<AppState>,
    Json(mut request): Json<StartInterviewRequest>,
) -> Result<Json<StartedInterview>, AppError> {
    request.interview_type = InterviewType::Voice.as_str().to_string();
    let started = session::start_interview(state.repo.as_ref(), state.ai.as_ref(), request).await?;
    Ok(Json(started))
}

/// POST /interview/:id/retake
pub async fn handle_retake(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<StartedInterview>, AppError> {
    Ok(Json(
        session::retake_interview(state.repo.as_ref(), interview_id).await?,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Answers
// ────────────────────────────────────────────────────────────────────────────

/// POST /interview/chat/answer-next
pub async fn handle_chat_answer(
    State(state): State<AppState>,
    Json(request): Json<ChatAnswerRequest>,
) -> Result<Json<AnswerOutcome>, AppError> {
    let submission = AnswerSubmission {
        interview_id: request.interview_id,
        question_id: request.question_id,
        answer: AnswerInput {
            answer_text: request.answer_text,
            notes: request.notes,
            ..AnswerInput::default()
        },
        expected_type: Some(InterviewType::Chat),
    };
    let outcome = session::submit_answer(state.repo.as_ref(), state.ai.as_ref(), submission).await?;
    Ok(Json(outcome))
}

/// POST /interview/voice/answer-next
///
/// Multipart fields: `interview_id`, `question_id`, `answer_text`, and the
/// optional `transcript` and `audio`. The transcript stands in for a missing
/// `answer_text`.
pub async fn handle_voice_answer(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnswerOutcome>, AppError> {
    let submission = read_voice_submission(multipart).await?;
    let outcome = session::submit_answer(state.repo.as_ref(), state.ai.as_ref(), submission).await?;
    Ok(Json(outcome))
}

async fn read_voice_submission(mut multipart: Multipart) -> Result<AnswerSubmission, AppError> {
    let mut interview_id = None;
    let mut question_id = None;
    let mut input = AnswerInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable audio: {e}")))?;
                if !bytes.is_empty() {
                    input.audio = Some(bytes.to_vec());
                }
            }
            "interview_id" | "question_id" | "answer_text" | "transcript" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable field '{name}': {e}")))?;
                match name.as_str() {
                    "interview_id" => interview_id = Some(parse_id(&name, &value)?),
                    "question_id" => question_id = Some(parse_id(&name, &value)?),
                    "answer_text" => input.answer_text = value,
                    _ => input.transcribed_text = Some(value).filter(|t| !t.trim().is_empty()),
                }
            }
            _ => {}
        }
    }

    if input.answer_text.trim().is_empty() {
        if let Some(transcript) = &input.transcribed_text {
            input.answer_text = transcript.clone();
        }
    }

    Ok(AnswerSubmission {
        interview_id: interview_id
            .ok_or_else(|| AppError::Validation("interview_id is required".to_string()))?,
        question_id: question_id
            .ok_or_else(|| AppError::Validation("question_id is required".to_string()))?,
        answer: input,
        expected_type: Some(InterviewType::Voice),
    })
}

fn parse_id(name: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{name} must be an integer")))
}

/// POST /interview/chat/edit-answer
pub async fn handle_edit_answer(
    State(state): State<AppState>,
    Json(request): Json<EditAnswerRequest>,
) -> Result<Json<AnswerOutcome>, AppError> {
    let outcome = session::edit_answer(
        state.repo.as_ref(),
        state.ai.as_ref(),
        request.interview_id,
        request.question_id,
        &request.answer_text,
    )
    .await?;
    Ok(Json(outcome))
}

// ────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /interview/:id/end
pub async fn handle_end(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<EndOutcome>, AppError> {
    Ok(Json(
        session::end_interview(state.repo.as_ref(), state.ai.as_ref(), interview_id).await?,
    ))
}

/// POST /interview/:id/recalculate-score
pub async fn handle_recalculate_score(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    Ok(Json(
        session::recalculate_score(state.repo.as_ref(), interview_id).await?,
    ))
}

/// POST /interview/check-expiration
pub async fn handle_check_expiration(
    State(state): State<AppState>,
) -> Result<Json<ExpirationResponse>, AppError> {
    let expired =
        expire_stale_interviews(state.repo.as_ref(), state.config.interview_duration()).await?;
    Ok(Json(ExpirationResponse {
        expired_count: expired.len(),
        expired_interview_ids: expired,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Reads
// ────────────────────────────────────────────────────────────────────────────

/// GET /interview/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<InterviewSnapshot>, AppError> {
    Ok(Json(
        session::load_snapshot(state.repo.as_ref(), interview_id).await?,
    ))
}

/// GET /interview/:id/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<InterviewSummaryView>, AppError> {
    let snapshot = session::load_snapshot(state.repo.as_ref(), interview_id).await?;
    Ok(Json(session::summarize(&snapshot)))
}

/// GET /interview/:id/feedback
pub async fn handle_feedback(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<FeedbackReport>, AppError> {
    Ok(Json(
        session::interview_feedback(state.repo.as_ref(), state.ai.as_ref(), interview_id).await?,
    ))
}

/// GET /interview/:id/score-breakdown
pub async fn handle_score_breakdown(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<ScoreBreakdown>, AppError> {
    Ok(Json(
        session::score_breakdown(state.repo.as_ref(), interview_id).await?,
    ))
}

/// GET /interview/:id/analysis
pub async fn handle_analysis(
    State(state): State<AppState>,
    Path(interview_id): Path<i64>,
) -> Result<Json<InterviewSummary>, AppError> {
    Ok(Json(
        session::analyze_interview(state.repo.as_ref(), state.ai.as_ref(), interview_id).await?,
    ))
}

/// GET /interview/user/:user_id
pub async fn handle_user_interviews(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<InterviewListItem>>, AppError> {
    Ok(Json(
        session::list_user_interviews(state.repo.as_ref(), user_id).await?,
    ))
}
