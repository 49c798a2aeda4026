//! Persistence boundary for users, CVs and interview sessions.
//!
//! Every write method is one atomic unit of work. Implementations that share
//! a database with concurrent writers lock the interview row for the duration
//! of the write so submit-answer and edit-answer cannot lose updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::cv::{CvInsights, CvRecord, NewCv};
use crate::models::interview::{
    AnswerAnalysis, AnswerInput, DifficultyLevel, FeedbackReport, Interview, InterviewListItem,
    InterviewSnapshot, NewInterview, Question, UserAnswer,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError>;

    async fn find_cv(&self, cv_id: i64) -> Result<Option<CvRecord>, AppError>;

    async fn save_cv(&self, cv: NewCv) -> Result<CvRecord, AppError>;

    async fn list_cvs(&self, user_id: i64) -> Result<Vec<CvRecord>, AppError>;

    /// Stores the insights for a CV, replacing any earlier extraction.
    async fn save_cv_insights(&self, cv_id: i64, insights: &CvInsights) -> Result<(), AppError>;

    /// Inserts the interview and its root questions together.
    async fn create_interview(&self, new: NewInterview) -> Result<InterviewSnapshot, AppError>;

    /// Loads an interview with all questions (ordered by id) and answers.
    async fn load_interview(&self, interview_id: i64)
        -> Result<Option<InterviewSnapshot>, AppError>;

    async fn list_interviews(&self, user_id: i64) -> Result<Vec<InterviewListItem>, AppError>;

    /// Creates the answer for `question_id` or overwrites the existing one.
    /// An overwritten answer loses its stale analysis. `Validation` if the
    /// interview has finished.
    async fn upsert_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        input: AnswerInput,
    ) -> Result<UserAnswer, AppError>;

    async fn save_analysis(&self, answer_id: i64, analysis: &AnswerAnalysis)
        -> Result<(), AppError>;

    /// Overwrites an existing answer's text and deletes the stale follow-up
    /// questions (with their answers). `NotFound` if no answer exists,
    /// `Validation` if the interview has finished.
    async fn rewrite_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        answer_text: &str,
        stale_question_ids: &[i64],
    ) -> Result<UserAnswer, AppError>;

    /// Attaches a follow-up under `parent_question_id`, which must belong to
    /// the same open interview.
    async fn insert_follow_up(
        &self,
        interview_id: i64,
        parent_question_id: i64,
        question_text: &str,
        difficulty_level: DifficultyLevel,
        question_mark: f64,
    ) -> Result<Question, AppError>;

    /// Marks the interview finished at `finished_at` unless it already is.
    /// Returns the stored interview either way.
    async fn finish_interview(
        &self,
        interview_id: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<Interview, AppError>;

    async fn set_mark(&self, interview_id: i64, mark: f64) -> Result<(), AppError>;

    async fn find_feedback(&self, interview_id: i64) -> Result<Option<FeedbackReport>, AppError>;

    /// Stores the report unless one already exists; returns the stored report.
    async fn save_feedback(
        &self,
        interview_id: i64,
        report: &FeedbackReport,
    ) -> Result<FeedbackReport, AppError>;

    /// Finishes every open interview started at or before `cutoff`.
    /// Returns the ids that were finished by this call.
    async fn expire_interviews(
        &self,
        cutoff: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<Vec<i64>, AppError>;
}
