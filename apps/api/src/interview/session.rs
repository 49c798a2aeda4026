//! Interview session engine. Drives an interview from start to finish.
//!
//! Flow for one answer:
//!   upsert answer (committed) → analyse (best-effort) → follow-up decision →
//!   insert follow-up | advance to next root | finish + score + feedback.
//!
//! All state lives in the repository; nothing is cached between requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai_gateway::wire::{
    AnsweredQuestion, FollowUpDecision, FollowUpRequest, InterviewSummary,
};
use crate::ai_gateway::{AiGateway, AiGatewayError, QuestionRequest};
use crate::errors::AppError;
use crate::interview::scoring::{self, score_interview, ScoreBreakdown};
use crate::interview::tree::{branch_context, QuestionTree};
use crate::models::interview::{
    AnswerInput, DifficultyLevel, FeedbackReport, Interview, InterviewListItem,
    InterviewSnapshot, InterviewType, NewInterview, NewQuestion, Question, UserAnswer,
    GENERATED_QUESTION_MARK,
};
use crate::repository::Repository;

/// Chat interviews keep at most this many generated root questions.
pub const MAX_CHAT_QUESTIONS: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Request / response models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct StartInterviewRequest {
    pub user_id: i64,
    /// Ignored by the mode-specific start endpoints, which set it themselves.
    #[serde(default)]
    pub interview_type: String,
    pub level: String,
    pub job_title: String,
    #[serde(default)]
    pub cv_id: Option<i64>,
    #[serde(default)]
    pub original_interview_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub question_id: i64,
    pub question_text: String,
    pub difficulty_level: DifficultyLevel,
    pub parent_question_id: Option<i64>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            question_id: q.id,
            question_text: q.question_text.clone(),
            difficulty_level: q.difficulty_level,
            parent_question_id: q.parent_question_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub interview_id: i64,
    pub interview_type: InterviewType,
    pub level: DifficultyLevel,
    pub job_title: String,
    pub started_at: DateTime<Utc>,
    pub original_interview_id: Option<i64>,
    pub questions: Vec<QuestionView>,
}

impl From<&InterviewSnapshot> for StartedInterview {
    fn from(snapshot: &InterviewSnapshot) -> Self {
        let interview = &snapshot.interview;
        Self {
            interview_id: interview.id,
            interview_type: interview.interview_type,
            level: interview.level,
            job_title: interview.job_title.clone(),
            started_at: interview.started_at,
            original_interview_id: interview.original_interview_id,
            questions: snapshot.questions.iter().map(QuestionView::from).collect(),
        }
    }
}

/// An answer to one question. `expected_type` rejects answers sent through
/// the wrong mode's endpoint.
#[derive(Debug, Clone)]
pub struct AnswerSubmission {
    pub interview_id: i64,
    pub question_id: i64,
    pub answer: AnswerInput,
    pub expected_type: Option<InterviewType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionSummary {
    pub interview_id: i64,
    pub finished_at: DateTime<Utc>,
    pub interview_mark: f64,
    pub grade: &'static str,
    pub feedback: &'static str,
    pub report: Option<FeedbackReport>,
    pub already_finished: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
    pub accepted: bool,
    pub answer_id: i64,
    pub should_continue: bool,
    pub reason: String,
    pub next_question: Option<QuestionView>,
    pub is_follow_up: bool,
    pub completed: bool,
    pub completion: Option<CompletionSummary>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_question_ids: Vec<i64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndOutcome {
    #[serde(flatten)]
    pub completion: CompletionSummary,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterviewSummaryView {
    pub interview_id: i64,
    pub interview_type: InterviewType,
    pub level: DifficultyLevel,
    pub job_title: String,
    pub interview_mark: f64,
    pub grade: Option<&'static str>,
    pub is_finished: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_questions: usize,
    pub root_questions: usize,
    pub follow_up_questions: usize,
    pub total_answers: usize,
}

/// What happens once a branch closes without a follow-up.
#[derive(Debug)]
pub enum BranchEnd<'a> {
    NextRoot(&'a Question),
    Complete,
    AwaitRemaining,
}

// ────────────────────────────────────────────────────────────────────────────
// Start / retake
// ────────────────────────────────────────────────────────────────────────────

/// Validates the request, generates the opening questions and persists the
/// interview with its root questions.
pub async fn start_interview(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    request: StartInterviewRequest,
) -> Result<StartedInterview, AppError> {
    if !repo.user_exists(request.user_id).await? {
        return Err(AppError::NotFound(format!(
            "User {} not found",
            request.user_id
        )));
    }

    let interview_type: InterviewType = request
        .interview_type
        .parse()
        .map_err(AppError::Validation)?;

    if request.level.trim().is_empty() {
        return Err(AppError::Validation("Interview level is required.".to_string()));
    }
    let level: DifficultyLevel = request.level.parse().map_err(AppError::Validation)?;

    let job_title = request.job_title.trim();
    if job_title.is_empty() {
        return Err(AppError::Validation(
            "Job title is required before starting the interview.".to_string(),
        ));
    }

    let cv_context = match request.cv_id {
        Some(cv_id) => {
            let cv = repo
                .find_cv(cv_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;
            if cv.user_id != request.user_id {
                return Err(AppError::Validation("Invalid or unauthorized CV.".to_string()));
            }
            let context = cv.question_context().ok_or_else(|| {
                AppError::Validation("Selected CV has no readable text.".to_string())
            })?;
            Some(context)
        }
        None => None,
    };

    let original_interview_id = match request.original_interview_id {
        Some(id) => Some(resolve_original(repo, id, request.user_id).await?),
        None => None,
    };

    let generated = ai
        .generate_questions(&QuestionRequest {
            level: level.as_str().to_string(),
            job_title: job_title.to_string(),
            cv_context,
        })
        .await?;

    let keep = match interview_type {
        InterviewType::Chat => MAX_CHAT_QUESTIONS,
        InterviewType::Voice => 1,
    };
    let questions: Vec<NewQuestion> = generated
        .into_iter()
        .take(keep)
        .map(|question_text| NewQuestion {
            question_text,
            difficulty_level: level,
            question_mark: GENERATED_QUESTION_MARK,
        })
        .collect();

    if questions.is_empty() {
        return Err(AppError::Upstream(AiGatewayError::EmptyContent));
    }

    let snapshot = repo
        .create_interview(NewInterview {
            user_id: request.user_id,
            interview_type,
            level,
            job_title: job_title.to_string(),
            cv_id: request.cv_id,
            original_interview_id,
            started_at: Utc::now(),
            questions,
        })
        .await?;

    info!(
        "Started {} interview {} for user {} ({} questions)",
        interview_type,
        snapshot.interview.id,
        request.user_id,
        snapshot.questions.len()
    );

    Ok(StartedInterview::from(&snapshot))
}

/// Starts a fresh interview with the same root questions as `interview_id`.
/// Follow-ups and answers are not copied.
pub async fn retake_interview(
    repo: &dyn Repository,
    interview_id: i64,
) -> Result<StartedInterview, AppError> {
    let source = load_snapshot(repo, interview_id).await?;
    let original = source
        .interview
        .original_interview_id
        .unwrap_or(source.interview.id);

    let questions = source
        .root_questions()
        .map(|q| NewQuestion {
            question_text: q.question_text.clone(),
            difficulty_level: q.difficulty_level,
            question_mark: q.question_mark,
        })
        .collect();

    let snapshot = repo
        .create_interview(NewInterview {
            user_id: source.interview.user_id,
            interview_type: source.interview.interview_type,
            level: source.interview.level,
            job_title: source.interview.job_title.clone(),
            cv_id: source.interview.cv_id,
            original_interview_id: Some(original),
            started_at: Utc::now(),
            questions,
        })
        .await?;

    info!(
        "Interview {} is a retake of {} (original {})",
        snapshot.interview.id, interview_id, original
    );

    Ok(StartedInterview::from(&snapshot))
}

/// Follows a retake chain to its first ancestor.
async fn resolve_original(
    repo: &dyn Repository,
    interview_id: i64,
    user_id: i64,
) -> Result<i64, AppError> {
    let source = load_snapshot(repo, interview_id).await?;
    if source.interview.user_id != user_id {
        return Err(AppError::Validation(format!(
            "Interview {interview_id} belongs to another user"
        )));
    }
    Ok(source
        .interview
        .original_interview_id
        .unwrap_or(source.interview.id))
}

// ────────────────────────────────────────────────────────────────────────────
// Answer / edit
// ────────────────────────────────────────────────────────────────────────────

/// Saves an answer and decides what the candidate sees next.
///
/// The answer is committed before any AI call, so a gateway failure after
/// that point still keeps what the candidate wrote.
pub async fn submit_answer(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    submission: AnswerSubmission,
) -> Result<AnswerOutcome, AppError> {
    let snapshot = load_open_snapshot(repo, submission.interview_id).await?;

    if let Some(expected) = submission.expected_type {
        if snapshot.interview.interview_type != expected {
            return Err(AppError::Validation(format!(
                "This interview only accepts {} answers.",
                snapshot.interview.interview_type
            )));
        }
    }

    let question = find_question(&snapshot, submission.question_id)?;
    require_text(&submission.answer.answer_text)?;

    let answer = repo
        .upsert_answer(snapshot.interview.id, question.id, submission.answer)
        .await?;

    let mut warnings = Vec::new();
    let answer = analyze_best_effort(repo, ai, answer, &mut warnings).await;

    advance_after_answer(repo, ai, &snapshot.interview, &question, &answer, warnings).await
}

/// Rewrites an existing answer, drops every follow-up generated from the old
/// text, and re-runs the follow-up decision with the new text.
pub async fn edit_answer(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview_id: i64,
    question_id: i64,
    answer_text: &str,
) -> Result<AnswerOutcome, AppError> {
    let snapshot = load_open_snapshot(repo, interview_id).await?;
    let question = find_question(&snapshot, question_id)?;

    if snapshot.answer_for(question_id).is_none() {
        return Err(AppError::NotFound(format!(
            "No answer to question {question_id} in interview {interview_id}"
        )));
    }
    require_text(answer_text)?;

    let stale = QuestionTree::new(&snapshot.questions).descendants_of(question_id);
    let answer = repo
        .rewrite_answer(interview_id, question_id, answer_text, &stale)
        .await?;

    info!(
        "Edited answer to question {question_id} in interview {interview_id}; \
         {} follow-ups invalidated",
        stale.len()
    );

    let mut warnings = Vec::new();
    let answer = analyze_best_effort(repo, ai, answer, &mut warnings).await;

    let mut outcome =
        advance_after_answer(repo, ai, &snapshot.interview, &question, &answer, warnings).await?;
    outcome.removed_question_ids = stale;
    Ok(outcome)
}

async fn advance_after_answer(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview: &Interview,
    question: &Question,
    answer: &UserAnswer,
    mut warnings: Vec<String>,
) -> Result<AnswerOutcome, AppError> {
    let decision = request_follow_up(repo, ai, interview, question, answer).await?;

    if let Some(text) = decision.follow_up_text() {
        let follow_up = repo
            .insert_follow_up(
                interview.id,
                question.id,
                text,
                question.difficulty_level,
                GENERATED_QUESTION_MARK,
            )
            .await?;
        return Ok(AnswerOutcome {
            accepted: true,
            answer_id: answer.id,
            should_continue: true,
            reason: decision.reason,
            next_question: Some(QuestionView::from(&follow_up)),
            is_follow_up: true,
            completed: false,
            completion: None,
            message: "Follow-up question generated.".to_string(),
            removed_question_ids: Vec::new(),
            warnings,
        });
    }

    let snapshot = load_snapshot(repo, interview.id).await?;
    let mut outcome = AnswerOutcome {
        accepted: true,
        answer_id: answer.id,
        should_continue: false,
        reason: decision.reason,
        next_question: None,
        is_follow_up: false,
        completed: false,
        completion: None,
        message: String::new(),
        removed_question_ids: Vec::new(),
        warnings: Vec::new(),
    };

    match plan_after_branch(&snapshot, question.id) {
        BranchEnd::NextRoot(next) => {
            outcome.next_question = Some(QuestionView::from(next));
            outcome.message = "Moving to the next question.".to_string();
        }
        BranchEnd::Complete => {
            let completion = complete_interview(repo, ai, interview.id, &mut warnings).await?;
            outcome.completed = true;
            outcome.completion = Some(completion);
            outcome.message = "Interview completed.".to_string();
        }
        BranchEnd::AwaitRemaining => {
            outcome.message = "Answer accepted. Move to the next question.".to_string();
        }
    }

    outcome.warnings = warnings;
    Ok(outcome)
}

/// Decides where to go once the branch containing `question_id` closes:
/// the next root after the branch's root, else completion if every question
/// has an answer, else wait for the unanswered ones.
pub fn plan_after_branch(snapshot: &InterviewSnapshot, question_id: i64) -> BranchEnd<'_> {
    let tree = QuestionTree::new(&snapshot.questions);
    let anchor = tree.root_of(question_id).map(|r| r.id).unwrap_or(question_id);

    if let Some(next) = tree.next_root_after(anchor) {
        return BranchEnd::NextRoot(next);
    }
    if snapshot.all_questions_answered() {
        BranchEnd::Complete
    } else {
        BranchEnd::AwaitRemaining
    }
}

async fn request_follow_up(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview: &Interview,
    question: &Question,
    answer: &UserAnswer,
) -> Result<FollowUpDecision, AppError> {
    let cv_text = match interview.cv_id {
        Some(cv_id) => repo
            .find_cv(cv_id)
            .await?
            .and_then(|cv| cv.question_context()),
        None => None,
    };

    let request = FollowUpRequest {
        job_title: interview.job_title.clone(),
        level: interview.level.as_str().to_string(),
        cv_text,
        previous_qa: branch_context(question, answer),
        last_question: question.question_text.clone(),
        last_answer: answer.answer_text.clone(),
    };

    let decision = ai.generate_followup(&request).await?;
    info!(
        "Follow-up decision for question {} in interview {}: continue={} ({})",
        question.id, interview.id, decision.should_continue, decision.reason
    );
    Ok(decision)
}

async fn analyze_best_effort(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    mut answer: UserAnswer,
    warnings: &mut Vec<String>,
) -> UserAnswer {
    match ai.analyze_answer(&answer.answer_text).await {
        Ok(analysis) => match repo.save_analysis(answer.id, &analysis).await {
            Ok(()) => answer.analysis = Some(analysis),
            Err(e) => {
                warn!("Failed to store analysis for answer {}: {e}", answer.id);
                warnings.push(format!("Answer analysis could not be saved: {e}"));
            }
        },
        Err(e) => {
            warn!("Answer analysis failed for answer {}: {e}", answer.id);
            warnings.push(format!("Answer analysis unavailable: {e}"));
        }
    }
    answer
}

// ────────────────────────────────────────────────────────────────────────────
// Completion
// ────────────────────────────────────────────────────────────────────────────

/// Ends an interview. Idempotent: an already finished interview is returned
/// as stored, without re-scoring.
pub async fn end_interview(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview_id: i64,
) -> Result<EndOutcome, AppError> {
    let snapshot = load_snapshot(repo, interview_id).await?;
    let mut warnings = Vec::new();

    let interview = &snapshot.interview;
    if let (true, Some(finished_at)) = (interview.is_finished, interview.finished_at) {
        let report = match repo.find_feedback(interview_id).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Failed to load feedback for interview {interview_id}: {e}");
                warnings.push(format!("Feedback could not be loaded: {e}"));
                None
            }
        };
        let mark = interview.interview_mark;
        return Ok(EndOutcome {
            completion: CompletionSummary {
                interview_id,
                finished_at,
                interview_mark: mark,
                grade: scoring::grade(mark),
                feedback: scoring::feedback(mark),
                report,
                already_finished: true,
            },
            warnings,
        });
    }

    let completion = complete_interview(repo, ai, interview_id, &mut warnings).await?;
    Ok(EndOutcome {
        completion,
        warnings,
    })
}

/// Marks the interview finished, then scores it and generates feedback.
/// Scoring and feedback failures are reported in `warnings` and never undo
/// the finish.
async fn complete_interview(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview_id: i64,
    warnings: &mut Vec<String>,
) -> Result<CompletionSummary, AppError> {
    let now = Utc::now();
    let finished = repo.finish_interview(interview_id, now).await?;
    let finished_at = finished.finished_at.unwrap_or(now);

    let snapshot = load_snapshot(repo, interview_id).await?;
    let mut mark = snapshot.interview.interview_mark;

    if !snapshot.answers.is_empty() {
        let breakdown = score_interview(&snapshot);
        mark = breakdown.total;
        if let Err(e) = repo.set_mark(interview_id, mark).await {
            warn!("Failed to store mark for interview {interview_id}: {e}");
            warnings.push(format!("Score could not be saved: {e}"));
        }
        info!(
            "Interview {interview_id} scored {:.1} (completion {:.1}, quality {:.1}, \
             difficulty {:.1}, time {:.1})",
            breakdown.total,
            breakdown.completion,
            breakdown.quality,
            breakdown.difficulty,
            breakdown.time_efficiency
        );
    }

    let report = ensure_feedback(repo, ai, &snapshot, warnings).await;

    Ok(CompletionSummary {
        interview_id,
        finished_at,
        interview_mark: mark,
        grade: scoring::grade(mark),
        feedback: scoring::feedback(mark),
        report,
        already_finished: false,
    })
}

/// Returns the stored feedback report, generating and storing it first if
/// missing. Never fails; problems land in `warnings`.
async fn ensure_feedback(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    snapshot: &InterviewSnapshot,
    warnings: &mut Vec<String>,
) -> Option<FeedbackReport> {
    let interview_id = snapshot.interview.id;
    match repo.find_feedback(interview_id).await {
        Ok(Some(existing)) => return Some(existing),
        Ok(None) => {}
        Err(e) => {
            warn!("Failed to load feedback for interview {interview_id}: {e}");
            warnings.push(format!("Feedback could not be loaded: {e}"));
            return None;
        }
    }

    let answered = answered_questions(snapshot);
    if answered.is_empty() {
        return None;
    }

    match ai.generate_feedback(&answered).await {
        Ok(report) => match repo.save_feedback(interview_id, &report).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!("Failed to store feedback for interview {interview_id}: {e}");
                warnings.push(format!("Feedback could not be saved: {e}"));
                Some(report)
            }
        },
        Err(e) => {
            warn!("Feedback generation failed for interview {interview_id}: {e}");
            warnings.push(format!("Feedback unavailable: {e}"));
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Read projections
// ────────────────────────────────────────────────────────────────────────────

/// Recomputes and stores the mark of a finished interview.
pub async fn recalculate_score(
    repo: &dyn Repository,
    interview_id: i64,
) -> Result<ScoreBreakdown, AppError> {
    let snapshot = load_snapshot(repo, interview_id).await?;
    if !snapshot.interview.is_finished {
        return Err(AppError::Validation(format!(
            "Interview {interview_id} is not finished yet"
        )));
    }
    let breakdown = score_interview(&snapshot);
    repo.set_mark(interview_id, breakdown.total).await?;
    info!("Rescored interview {interview_id}: {:.1}", breakdown.total);
    Ok(breakdown)
}

pub async fn score_breakdown(
    repo: &dyn Repository,
    interview_id: i64,
) -> Result<ScoreBreakdown, AppError> {
    let snapshot = load_snapshot(repo, interview_id).await?;
    Ok(score_interview(&snapshot))
}

/// Returns the interview's feedback report, creating it on first request.
/// A gateway failure yields the placeholder report, which is not stored.
pub async fn interview_feedback(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview_id: i64,
) -> Result<FeedbackReport, AppError> {
    let snapshot = load_snapshot(repo, interview_id).await?;
    if let Some(existing) = repo.find_feedback(interview_id).await? {
        return Ok(existing);
    }

    let answered = answered_questions(&snapshot);
    if answered.is_empty() {
        return Ok(FeedbackReport::unavailable());
    }

    match ai.generate_feedback(&answered).await {
        Ok(report) => repo.save_feedback(interview_id, &report).await,
        Err(e) => {
            warn!("Feedback generation failed for interview {interview_id}: {e}");
            Ok(FeedbackReport::unavailable())
        }
    }
}

pub async fn analyze_interview(
    repo: &dyn Repository,
    ai: &dyn AiGateway,
    interview_id: i64,
) -> Result<InterviewSummary, AppError> {
    let snapshot = load_snapshot(repo, interview_id).await?;
    let answered = answered_questions(&snapshot);
    if answered.is_empty() {
        return Err(AppError::Validation(format!(
            "Interview {interview_id} has no answers to analyze"
        )));
    }
    Ok(ai.analyze_interview(&answered).await?)
}

/// A user's interviews, newest first.
pub async fn list_user_interviews(
    repo: &dyn Repository,
    user_id: i64,
) -> Result<Vec<InterviewListItem>, AppError> {
    if !repo.user_exists(user_id).await? {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }
    repo.list_interviews(user_id).await
}

pub fn summarize(snapshot: &InterviewSnapshot) -> InterviewSummaryView {
    let interview = &snapshot.interview;
    let root_questions = snapshot.root_questions().count();
    InterviewSummaryView {
        interview_id: interview.id,
        interview_type: interview.interview_type,
        level: interview.level,
        job_title: interview.job_title.clone(),
        interview_mark: interview.interview_mark,
        grade: interview
            .is_finished
            .then(|| scoring::grade(interview.interview_mark)),
        is_finished: interview.is_finished,
        started_at: interview.started_at,
        finished_at: interview.finished_at,
        total_questions: snapshot.questions.len(),
        root_questions,
        follow_up_questions: snapshot.questions.len() - root_questions,
        total_answers: snapshot.answers.len(),
    }
}

/// Every answer paired with its question text and analysis, in answer order.
pub fn answered_questions(snapshot: &InterviewSnapshot) -> Vec<AnsweredQuestion> {
    snapshot
        .answers
        .iter()
        .filter_map(|a| {
            let question = snapshot.question(a.question_id)?;
            let analysis = a.analysis.as_ref();
            Some(AnsweredQuestion {
                question: question.question_text.clone(),
                answer: a.answer_text.clone(),
                tone: analysis.map(|x| x.tone.clone()).filter(|t| !t.is_empty()),
                personality_traits: analysis
                    .map(|x| x.personality_traits.clone())
                    .unwrap_or_default(),
                soft_skills: analysis.map(|x| x.soft_skills.clone()).unwrap_or_default(),
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

pub async fn load_snapshot(
    repo: &dyn Repository,
    interview_id: i64,
) -> Result<InterviewSnapshot, AppError> {
    repo.load_interview(interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))
}

async fn load_open_snapshot(
    repo: &dyn Repository,
    interview_id: i64,
) -> Result<InterviewSnapshot, AppError> {
    let snapshot = load_snapshot(repo, interview_id).await?;
    if snapshot.interview.is_finished {
        return Err(AppError::Validation(format!(
            "Interview {interview_id} has already finished"
        )));
    }
    Ok(snapshot)
}

fn find_question(snapshot: &InterviewSnapshot, question_id: i64) -> Result<Question, AppError> {
    snapshot.question(question_id).cloned().ok_or_else(|| {
        AppError::NotFound(format!(
            "Question {question_id} not found in interview {}",
            snapshot.interview.id
        ))
    })
}

fn require_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("Answer text is required.".to_string()));
    }
    Ok(())
}
