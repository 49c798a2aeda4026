pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::cv::handlers as cv;
use crate::interview::handlers as interview;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview lifecycle
        .route("/interview/start", post(interview::handle_start))
        .route("/interview/chat/start", post(interview::handle_start_chat))
        .route("/interview/voice/start", post(interview::handle_start_voice))
        .route(
            "/interview/chat/answer-next",
            post(interview::handle_chat_answer),
        )
        .route(
            "/interview/voice/answer-next",
            post(interview::handle_voice_answer),
        )
        .route(
            "/interview/chat/edit-answer",
            post(interview::handle_edit_answer),
        )
        .route("/interview/:id/end", post(interview::handle_end))
        .route("/interview/:id/retake", post(interview::handle_retake))
        .route(
            "/interview/:id/recalculate-score",
            post(interview::handle_recalculate_score),
        )
        .route(
            "/interview/check-expiration",
            post(interview::handle_check_expiration),
        )
        // Interview reads
        .route("/interview/:id", get(interview::handle_get_interview))
        .route("/interview/:id/summary", get(interview::handle_summary))
        .route("/interview/:id/feedback", get(interview::handle_feedback))
        .route(
            "/interview/:id/score-breakdown",
            get(interview::handle_score_breakdown),
        )
        .route("/interview/:id/analysis", get(interview::handle_analysis))
        .route(
            "/interview/user/:user_id",
            get(interview::handle_user_interviews),
        )
        // CV API
        .route("/cv/upload", post(cv::handle_upload))
        .route("/cv/user/:user_id", get(cv::handle_list))
        .with_state(state)
}
