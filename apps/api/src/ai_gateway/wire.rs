//! JSON payloads exchanged with the AI service.
//!
//! The service is loosely typed: field names drift between snake_case and
//! camelCase, and `should_continue` has been observed as a bool, a string and
//! null. Responses are decoded permissively and normalised here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::cv::CvInsights;
use crate::models::interview::{AnswerAnalysis, FeedbackReport};

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsRequest<'a> {
    pub level: &'a str,
    pub job_title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_text: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsResponse {
    #[serde(default)]
    pub questions: Vec<String>,
}

/// One question/answer pair sent as follow-up context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Everything the AI service needs to decide whether to dig deeper.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpRequest {
    pub job_title: String,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_text: Option<String>,
    pub previous_qa: Vec<QaPair>,
    pub last_question: String,
    pub last_answer: String,
}

/// A boolean as the AI service actually sends it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireFlag {
    Bool(bool),
    Text(String),
    Other(Value),
}

impl WireFlag {
    /// Only an unambiguous true counts: `true` or the string "true".
    pub fn is_true(&self) -> bool {
        match self {
            WireFlag::Bool(b) => *b,
            WireFlag::Text(s) => s.trim().eq_ignore_ascii_case("true"),
            WireFlag::Other(_) => false,
        }
    }
}

/// Each spelling is its own field: serde rejects a payload that carries two
/// aliases of one field as a duplicate.
#[derive(Debug, Deserialize)]
pub struct FollowUpResponse {
    #[serde(default)]
    pub should_continue: Option<WireFlag>,
    #[serde(default, rename = "shouldContinue")]
    pub should_continue_camel: Option<WireFlag>,
    #[serde(default, rename = "continue")]
    pub continue_flag: Option<WireFlag>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub next_question: Option<String>,
    #[serde(default, rename = "nextQuestion")]
    pub next_question_camel: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub followup_question: Option<String>,
    #[serde(default)]
    pub follow_up_question: Option<String>,
}

impl FollowUpResponse {
    /// First spelling of the flag that is present and not null.
    fn flag(&self) -> Option<&WireFlag> {
        [
            &self.should_continue,
            &self.should_continue_camel,
            &self.continue_flag,
        ]
        .into_iter()
        .find_map(Option::as_ref)
    }

    /// First non-blank question text across the known spellings.
    fn question_text(&self) -> Option<&str> {
        [
            &self.next_question,
            &self.next_question_camel,
            &self.question,
            &self.followup_question,
            &self.follow_up_question,
        ]
        .into_iter()
        .filter_map(|q| q.as_deref())
        .find(|q| !q.trim().is_empty())
    }
}

/// Normalised follow-up decision. `should_continue` is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpDecision {
    pub should_continue: bool,
    pub reason: String,
    pub question: String,
}

impl FollowUpDecision {
    /// The follow-up text to insert, if the decision is to continue with one.
    pub fn follow_up_text(&self) -> Option<&str> {
        let text = self.question.trim();
        (self.should_continue && !text.is_empty()).then_some(text)
    }
}

impl From<FollowUpResponse> for FollowUpDecision {
    fn from(raw: FollowUpResponse) -> Self {
        Self {
            should_continue: raw.flag().is_some_and(WireFlag::is_true),
            question: raw.question_text().unwrap_or_default().to_string(),
            reason: raw.reason.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeAnswerRequest<'a> {
    pub answer: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeAnswerResponse {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default, alias = "personalityTraits")]
    pub personality_traits: Option<Vec<String>>,
    #[serde(default, alias = "softSkills")]
    pub soft_skills: Option<Vec<String>>,
}

impl From<AnalyzeAnswerResponse> for AnswerAnalysis {
    fn from(raw: AnalyzeAnswerResponse) -> Self {
        Self {
            tone: raw.tone.unwrap_or_default(),
            personality_traits: raw.personality_traits.unwrap_or_default(),
            soft_skills: raw.soft_skills.unwrap_or_default(),
        }
    }
}

/// A fully answered question with its analysis, as sent for interview-level
/// analysis and feedback generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
    pub tone: Option<String>,
    pub personality_traits: Vec<String>,
    pub soft_skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InterviewAnswersRequest<'a> {
    pub answers: &'a [AnsweredQuestion],
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterviewSummary {
    #[serde(default, alias = "overallTone")]
    pub overall_tone: String,
    #[serde(default, alias = "dominantPersonalityTraits")]
    pub dominant_personality_traits: Vec<String>,
    #[serde(default, alias = "dominantSoftSkills")]
    pub dominant_soft_skills: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default, alias = "suggestedImprovements")]
    pub suggested_improvements: Vec<String>,
}

/// Feedback fields arrive either as prose or as a list of points.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

impl TextOrList {
    fn into_text(self) -> String {
        self.join("\n")
    }

    fn join(self, separator: &str) -> String {
        match self {
            TextOrList::Text(s) => s,
            TextOrList::List(items) => items.join(separator),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackResponse {
    #[serde(default)]
    pub strengths: Option<TextOrList>,
    #[serde(default)]
    pub weaknesses: Option<TextOrList>,
    #[serde(default, alias = "personalitySummary")]
    pub personality_summary: Option<TextOrList>,
    #[serde(default)]
    pub recommendation: Option<TextOrList>,
}

impl From<FeedbackResponse> for FeedbackReport {
    fn from(raw: FeedbackResponse) -> Self {
        let text = |field: Option<TextOrList>| field.map(TextOrList::into_text).unwrap_or_default();
        Self {
            strengths: text(raw.strengths),
            weaknesses: text(raw.weaknesses),
            personality_summary: text(raw.personality_summary),
            recommendation: text(raw.recommendation),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtractInsightsRequest<'a> {
    pub cv_text: &'a str,
}

/// Insight categories, each a list of short items.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractInsightsResponse {
    #[serde(default, rename = "technicalSkills", alias = "technical_skills")]
    pub technical_skills: Option<TextOrList>,
    #[serde(default, rename = "softSkills", alias = "soft_skills")]
    pub soft_skills: Option<TextOrList>,
    #[serde(default)]
    pub tools: Option<TextOrList>,
    #[serde(default)]
    pub certifications: Option<TextOrList>,
    #[serde(default)]
    pub experience: Option<TextOrList>,
}

impl From<ExtractInsightsResponse> for CvInsights {
    fn from(raw: ExtractInsightsResponse) -> Self {
        let joined = |field: Option<TextOrList>| {
            field
                .map(|f| f.join(", "))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            technical_skills: joined(raw.technical_skills),
            soft_skills: joined(raw.soft_skills),
            tools_and_technologies: joined(raw.tools),
            certifications: joined(raw.certifications),
            experience_summary: joined(raw.experience),
        }
    }
}
