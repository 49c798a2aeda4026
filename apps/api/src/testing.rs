//! Test doubles shared by the engine and router tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::ai_gateway::wire::{
    AnsweredQuestion, FollowUpDecision, FollowUpRequest, InterviewSummary,
};
use crate::ai_gateway::{AiGateway, AiGatewayError, QuestionRequest};
use crate::models::cv::{CvInsights, CvRecord};
use crate::models::interview::{AnswerAnalysis, FeedbackReport};

/// An `AiGateway` that replays canned responses.
///
/// Follow-up decisions are popped from a queue: `Some(text)` continues with
/// that follow-up, `None` (or an empty queue) closes the branch.
#[derive(Default)]
pub struct ScriptedGateway {
    questions: Vec<String>,
    follow_ups: Mutex<VecDeque<Option<String>>>,
    fail_questions: bool,
    fail_follow_ups: bool,
    fail_analysis: bool,
    fail_feedback: bool,
    fail_insights: bool,
    insights: CvInsights,
    pub follow_up_requests: Mutex<Vec<FollowUpRequest>>,
    pub question_requests: Mutex<Vec<QuestionRequest>>,
    feedback_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(questions: &[&str]) -> Self {
        Self {
            questions: questions.iter().map(|q| q.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_follow_ups(self, script: &[Option<&str>]) -> Self {
        *self.follow_ups.lock().unwrap() =
            script.iter().map(|s| s.map(str::to_string)).collect();
        self
    }

    pub fn failing_questions(mut self) -> Self {
        self.fail_questions = true;
        self
    }

    pub fn failing_follow_ups(mut self) -> Self {
        self.fail_follow_ups = true;
        self
    }

    pub fn failing_analysis(mut self) -> Self {
        self.fail_analysis = true;
        self
    }

    pub fn failing_feedback(mut self) -> Self {
        self.fail_feedback = true;
        self
    }

    /// Insights returned by `extract_insights`. Blank by default.
    pub fn with_insights(mut self, insights: CvInsights) -> Self {
        self.insights = insights;
        self
    }

    pub fn failing_insights(mut self) -> Self {
        self.fail_insights = true;
        self
    }

    pub fn feedback_calls(&self) -> usize {
        self.feedback_calls.load(Ordering::SeqCst)
    }
}

fn scripted_failure() -> AiGatewayError {
    AiGatewayError::Api {
        status: 503,
        body: "scripted failure".to_string(),
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    async fn generate_questions(
        &self,
        request: &QuestionRequest,
    ) -> Result<Vec<String>, AiGatewayError> {
        self.question_requests.lock().unwrap().push(request.clone());
        if self.fail_questions {
            return Err(scripted_failure());
        }
        Ok(self.questions.clone())
    }

    async fn generate_followup(
        &self,
        request: &FollowUpRequest,
    ) -> Result<FollowUpDecision, AiGatewayError> {
        self.follow_up_requests.lock().unwrap().push(request.clone());
        if self.fail_follow_ups {
            return Err(scripted_failure());
        }
        let next = self.follow_ups.lock().unwrap().pop_front().flatten();
        Ok(match next {
            Some(question) => FollowUpDecision {
                should_continue: true,
                reason: "needs more depth".to_string(),
                question,
            },
            None => FollowUpDecision {
                should_continue: false,
                reason: "answer is complete".to_string(),
                question: String::new(),
            },
        })
    }

    async fn analyze_answer(&self, _answer: &str) -> Result<AnswerAnalysis, AiGatewayError> {
        if self.fail_analysis {
            return Err(scripted_failure());
        }
        Ok(AnswerAnalysis {
            tone: "confident".to_string(),
            personality_traits: vec!["analytical".to_string()],
            soft_skills: vec!["communication".to_string()],
        })
    }

    async fn analyze_interview(
        &self,
        answers: &[AnsweredQuestion],
    ) -> Result<InterviewSummary, AiGatewayError> {
        Ok(InterviewSummary {
            overall_tone: "confident".to_string(),
            strengths: answers.iter().map(|a| a.question.clone()).collect(),
            ..InterviewSummary::default()
        })
    }

    async fn generate_feedback(
        &self,
        _answers: &[AnsweredQuestion],
    ) -> Result<FeedbackReport, AiGatewayError> {
        self.feedback_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_feedback {
            return Err(scripted_failure());
        }
        Ok(FeedbackReport {
            strengths: "Clear structure".to_string(),
            weaknesses: "Few concrete examples".to_string(),
            personality_summary: "Calm and analytical".to_string(),
            recommendation: "Practise system design".to_string(),
        })
    }

    async fn extract_insights(&self, _cv_text: &str) -> Result<CvInsights, AiGatewayError> {
        if self.fail_insights {
            return Err(scripted_failure());
        }
        Ok(self.insights.clone())
    }
}

pub fn cv(id: i64, user_id: i64, extracted_text: Option<&str>) -> CvRecord {
    CvRecord {
        id,
        user_id,
        file_name: "cv.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        extracted_text: extracted_text.map(str::to_string),
        insights: None,
        uploaded_at: Utc::now(),
    }
}
