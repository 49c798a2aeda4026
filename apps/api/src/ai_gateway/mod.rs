/// AI Gateway client, the single point of entry for all calls to the
/// external question/analysis service.
///
/// No other module talks to the AI service directly. Handlers and the session
/// engine depend on the `AiGateway` trait, carried in `AppState` as
/// `Arc<dyn AiGateway>`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::cv::CvInsights;
use crate::models::interview::{AnswerAnalysis, FeedbackReport};

pub mod wire;

use wire::{
    AnalyzeAnswerRequest, AnalyzeAnswerResponse, AnsweredQuestion, ExtractInsightsRequest,
    ExtractInsightsResponse, FeedbackResponse, FollowUpDecision, FollowUpRequest,
    FollowUpResponse, GenerateQuestionsRequest, GenerateQuestionsResponse,
    InterviewAnswersRequest, InterviewSummary,
};

const MAX_ATTEMPTS: u32 = 2;
const RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum AiGatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request timed out")]
    Timeout,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AI service returned empty content")]
    EmptyContent,
}

/// Context for generating the opening questions of an interview.
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub level: String,
    pub job_title: String,
    /// CV-derived context. `None` means a job-title-only prompt.
    pub cv_context: Option<String>,
}

/// The AI service contract. Implement this to swap backends without touching
/// the session engine or handlers.
#[async_trait]
pub trait AiGateway: Send + Sync {
    async fn generate_questions(&self, request: &QuestionRequest)
        -> Result<Vec<String>, AiGatewayError>;

    async fn generate_followup(
        &self,
        request: &FollowUpRequest,
    ) -> Result<FollowUpDecision, AiGatewayError>;

    async fn analyze_answer(&self, answer: &str) -> Result<AnswerAnalysis, AiGatewayError>;

    async fn analyze_interview(
        &self,
        answers: &[AnsweredQuestion],
    ) -> Result<InterviewSummary, AiGatewayError>;

    async fn generate_feedback(
        &self,
        answers: &[AnsweredQuestion],
    ) -> Result<FeedbackReport, AiGatewayError>;

    /// Summarises CV text into skill and experience categories.
    async fn extract_insights(&self, cv_text: &str) -> Result<CvInsights, AiGatewayError>;
}

/// HTTP implementation of `AiGateway`.
/// Every call is a JSON POST bounded by the client-wide timeout.
#[derive(Clone)]
pub struct HttpAiGateway {
    client: Client,
    base_url: String,
}

impl HttpAiGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AiGatewayError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POSTs `body` to `{base_url}/{path}` and decodes the JSON response.
    /// Retries once on 429 and 5xx. Timeouts are not retried.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AiGatewayError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut last_error: Option<AiGatewayError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                warn!(
                    "AI gateway call to {path} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(body).send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() => return Err(AiGatewayError::Timeout),
                Err(e) => {
                    last_error = Some(AiGatewayError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("AI gateway {path} returned {status}: {body}");
                last_error = Some(AiGatewayError::Api {
                    status: status.as_u16(),
                    body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(AiGatewayError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let text = response.text().await.map_err(|e| {
                if e.is_timeout() {
                    AiGatewayError::Timeout
                } else {
                    AiGatewayError::Http(e)
                }
            })?;
            debug!("AI gateway {path} succeeded ({} bytes)", text.len());

            return serde_json::from_str(&text).map_err(AiGatewayError::Parse);
        }

        Err(last_error.unwrap_or(AiGatewayError::Api {
            status: 503,
            body: format!("no response after {MAX_ATTEMPTS} attempts"),
        }))
    }
}

#[async_trait]
impl AiGateway for HttpAiGateway {
    async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<String>, AiGatewayError> {
        let body = GenerateQuestionsRequest {
            level: &request.level,
            job_title: &request.job_title,
            cv_text: request.cv_context.as_deref(),
        };
        let response: GenerateQuestionsResponse =
            self.post_json("generate-questions", &body).await?;
        Ok(clean_questions(response.questions))
    }

    async fn generate_followup(
        &self,
        request: &FollowUpRequest,
    ) -> Result<FollowUpDecision, AiGatewayError> {
        let response: FollowUpResponse = self.post_json("generate-followup", request).await?;
        Ok(response.into())
    }

    async fn analyze_answer(&self, answer: &str) -> Result<AnswerAnalysis, AiGatewayError> {
        let response: AnalyzeAnswerResponse = self
            .post_json("analyze-answer", &AnalyzeAnswerRequest { answer })
            .await?;
        Ok(response.into())
    }

    async fn analyze_interview(
        &self,
        answers: &[AnsweredQuestion],
    ) -> Result<InterviewSummary, AiGatewayError> {
        self.post_json("analyze-interview", &InterviewAnswersRequest { answers })
            .await
    }

    async fn generate_feedback(
        &self,
        answers: &[AnsweredQuestion],
    ) -> Result<FeedbackReport, AiGatewayError> {
        let response: FeedbackResponse = self
            .post_json("generate-feedback", &InterviewAnswersRequest { answers })
            .await?;
        Ok(response.into())
    }

    async fn extract_insights(&self, cv_text: &str) -> Result<CvInsights, AiGatewayError> {
        let response: ExtractInsightsResponse = self
            .post_json("extract-insights", &ExtractInsightsRequest { cv_text })
            .await?;
        Ok(response.into())
    }
}

/// Trims generated questions and drops blank entries.
fn clean_questions(questions: Vec<String>) -> Vec<String> {
    questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::Router;

    use super::*;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn question_request() -> QuestionRequest {
        QuestionRequest {
            level: "senior".to_string(),
            job_title: "Backend Engineer".to_string(),
            cv_context: None,
        }
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/generate-questions",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::BAD_REQUEST, "bad level")
                }
            }),
        );
        let gateway = HttpAiGateway::new(&serve(router).await, Duration::from_secs(5)).unwrap();

        let err = gateway.generate_questions(&question_request()).await.unwrap_err();

        assert!(
            matches!(err, AiGatewayError::Api { status: 400, ref body } if body == "bad level"),
            "unexpected error: {err}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/generate-questions",
            post(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::INTERNAL_SERVER_ERROR, "warming up").into_response()
                    } else {
                        let body =
                            serde_json::json!({ "questions": [" What is a lifetime? ", ""] });
                        axum::Json(body).into_response()
                    }
                }
            }),
        );
        let gateway = HttpAiGateway::new(&serve(router).await, Duration::from_secs(5)).unwrap();

        let questions = gateway.generate_questions(&question_request()).await.unwrap();

        assert_eq!(questions, vec!["What is a lifetime?"]);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistent_server_error_gives_up_after_two_attempts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/analyze-answer",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::SERVICE_UNAVAILABLE, "overloaded")
                }
            }),
        );
        let gateway = HttpAiGateway::new(&serve(router).await, Duration::from_secs(5)).unwrap();

        let err = gateway.analyze_answer("I used Rust").await.unwrap_err();

        assert!(matches!(err, AiGatewayError::Api { status: 503, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_slow_service_times_out_without_retry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/generate-feedback",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    "{}"
                }
            }),
        );
        let gateway =
            HttpAiGateway::new(&serve(router).await, Duration::from_millis(200)).unwrap();

        let err = gateway.generate_feedback(&[]).await.unwrap_err();

        assert!(matches!(err, AiGatewayError::Timeout), "unexpected error: {err}");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_parse_error() {
        let router = Router::new().route(
            "/generate-followup",
            post(|| async { ([("content-type", "application/json")], "{not json") }),
        );
        let gateway = HttpAiGateway::new(&serve(router).await, Duration::from_secs(5)).unwrap();
        let request = FollowUpRequest {
            job_title: "Backend Engineer".to_string(),
            level: "senior".to_string(),
            cv_text: None,
            previous_qa: Vec::new(),
            last_question: "Why Rust?".to_string(),
            last_answer: "Safety".to_string(),
        };

        let err = gateway.generate_followup(&request).await.unwrap_err();

        assert!(matches!(err, AiGatewayError::Parse(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_extract_insights_posts_cv_text() {
        let router = Router::new().route(
            "/extract-insights",
            post(|axum::Json(body): axum::Json<serde_json::Value>| async move {
                let skill = body["cv_text"].as_str().unwrap_or_default().to_string();
                axum::Json(serde_json::json!({
                    "technicalSkills": [skill, "SQL"],
                    "experience": ["4 years"],
                }))
            }),
        );
        let gateway = HttpAiGateway::new(&serve(router).await, Duration::from_secs(5)).unwrap();

        let insights = gateway.extract_insights("Rust").await.unwrap();

        assert_eq!(insights.technical_skills.as_deref(), Some("Rust, SQL"));
        assert_eq!(insights.experience_summary.as_deref(), Some("4 years"));
        assert_eq!(insights.soft_skills, None);
    }

    #[test]
    fn test_clean_questions_drops_blanks() {
        let cleaned = clean_questions(vec![
            "  What is ownership? ".to_string(),
            "".to_string(),
            "   ".to_string(),
            "Explain lifetimes.".to_string(),
        ]);
        assert_eq!(cleaned, vec!["What is ownership?", "Explain lifetimes."]);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = HttpAiGateway::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_api_error_display_carries_status_and_body() {
        let err = AiGatewayError::Api {
            status: 422,
            body: "bad level".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 422): bad level");
    }
}
