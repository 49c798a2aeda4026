use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mark weight assigned to every generated question.
pub const GENERATED_QUESTION_MARK: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Chat,
    Voice,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Chat => "chat",
            InterviewType::Voice => "voice",
        }
    }
}

impl FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(InterviewType::Chat),
            "voice" => Ok(InterviewType::Voice),
            other => Err(format!(
                "Invalid interview type '{other}'. Must be 'chat' or 'voice'."
            )),
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Internship,
    Junior,
    Mid,
    Senior,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Internship => "internship",
            DifficultyLevel::Junior => "junior",
            DifficultyLevel::Mid => "mid",
            DifficultyLevel::Senior => "senior",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "internship" => Ok(DifficultyLevel::Internship),
            "junior" => Ok(DifficultyLevel::Junior),
            "mid" => Ok(DifficultyLevel::Mid),
            "senior" => Ok(DifficultyLevel::Senior),
            other => Err(format!(
                "Invalid level '{other}'. Must be: internship, junior, mid, or senior."
            )),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One practice session.
///
/// `is_finished` and `finished_at` always move together: the store rejects a
/// row where one is set without the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: i64,
    pub user_id: i64,
    pub interview_type: InterviewType,
    pub level: DifficultyLevel,
    pub job_title: String,
    pub interview_mark: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub is_finished: bool,
    pub cv_id: Option<i64>,
    pub original_interview_id: Option<i64>,
}

/// A node in an interview's question tree. `parent_question_id == None` marks a
/// root question; follow-ups point at the question they followed up on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub interview_id: i64,
    pub parent_question_id: Option<i64>,
    pub question_text: String,
    pub difficulty_level: DifficultyLevel,
    pub question_mark: f64,
}

impl Question {
    pub fn is_root(&self) -> bool {
        self.parent_question_id.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerAnalysis {
    pub tone: String,
    pub personality_traits: Vec<String>,
    pub soft_skills: Vec<String>,
}

/// The single live answer to a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: i64,
    pub interview_id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub notes: Option<String>,
    pub transcribed_text: Option<String>,
    pub has_audio: bool,
    pub analysis: Option<AnswerAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub strengths: String,
    pub weaknesses: String,
    pub personality_summary: String,
    pub recommendation: String,
}

pub const ANALYSIS_UNAVAILABLE: &str = "Unable to analyze at this time.";

impl FeedbackReport {
    /// Placeholder returned when the feedback generator is unreachable.
    pub fn unavailable() -> Self {
        Self {
            strengths: ANALYSIS_UNAVAILABLE.to_string(),
            weaknesses: ANALYSIS_UNAVAILABLE.to_string(),
            personality_summary: ANALYSIS_UNAVAILABLE.to_string(),
            recommendation: ANALYSIS_UNAVAILABLE.to_string(),
        }
    }
}

/// An interview loaded together with its full question tree and answers.
/// Questions are ordered by id, which is their insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSnapshot {
    pub interview: Interview,
    pub questions: Vec<Question>,
    pub answers: Vec<UserAnswer>,
}

impl InterviewSnapshot {
    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn answer_for(&self, question_id: i64) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// True when literally every question, root or follow-up, has an answer.
    pub fn all_questions_answered(&self) -> bool {
        !self.questions.is_empty()
            && self
                .questions
                .iter()
                .all(|q| self.answer_for(q.id).is_some())
    }

    pub fn root_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(|q| q.is_root())
    }
}

/// Row shape for a user's interview history.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewListItem {
    pub id: i64,
    pub interview_type: InterviewType,
    pub level: DifficultyLevel,
    pub job_title: String,
    pub interview_mark: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub is_finished: bool,
    pub question_count: i64,
    pub answer_count: i64,
}

/// Input for creating an interview together with its root questions.
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub user_id: i64,
    pub interview_type: InterviewType,
    pub level: DifficultyLevel,
    pub job_title: String,
    pub cv_id: Option<i64>,
    pub original_interview_id: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub difficulty_level: DifficultyLevel,
    pub question_mark: f64,
}

/// Answer payload for an upsert. Audio is only present for voice answers.
#[derive(Debug, Clone, Default)]
pub struct AnswerInput {
    pub answer_text: String,
    pub notes: Option<String>,
    pub transcribed_text: Option<String>,
    pub audio: Option<Vec<u8>>,
}
