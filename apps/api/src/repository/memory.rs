//! In-memory repository used by engine and router tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::cv::{CvInsights, CvRecord, NewCv};
use crate::models::interview::{
    AnswerAnalysis, AnswerInput, DifficultyLevel, FeedbackReport, Interview, InterviewListItem,
    InterviewSnapshot, NewInterview, Question, UserAnswer,
};
use crate::repository::Repository;

#[derive(Default)]
struct State {
    users: HashSet<i64>,
    cvs: Vec<CvRecord>,
    interviews: Vec<Interview>,
    questions: Vec<Question>,
    answers: Vec<UserAnswer>,
    feedback: Vec<(i64, FeedbackReport)>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn interview_mut(&mut self, interview_id: i64) -> Result<&mut Interview, AppError> {
        self.interviews
            .iter_mut()
            .find(|i| i.id == interview_id)
            .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))
    }

    fn ensure_open(&mut self, interview_id: i64) -> Result<(), AppError> {
        if self.interview_mut(interview_id)?.is_finished {
            return Err(AppError::Validation(format!(
                "Interview {interview_id} is already finished"
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn with_user(user_id: i64) -> Self {
        let repo = Self::default();
        repo.add_user(user_id);
        repo
    }

    pub fn add_user(&self, user_id: i64) {
        self.state.lock().unwrap().users.insert(user_id);
    }

    pub fn add_cv(&self, cv: CvRecord) {
        self.state.lock().unwrap().cvs.push(cv);
    }

    /// Moves an interview's start time, for expiration and timing tests.
    pub fn set_started_at(&self, interview_id: i64, started_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        if let Ok(interview) = state.interview_mut(interview_id) {
            interview.started_at = started_at;
        }
    }

    pub fn feedback_count(&self) -> usize {
        self.state.lock().unwrap().feedback.len()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        Ok(self.state.lock().unwrap().users.contains(&user_id))
    }

    async fn find_cv(&self, cv_id: i64) -> Result<Option<CvRecord>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.cvs.iter().find(|c| c.id == cv_id).cloned())
    }

    async fn save_cv(&self, cv: NewCv) -> Result<CvRecord, AppError> {
        let mut state = self.state.lock().unwrap();
        let record = CvRecord {
            id: state.next_id(),
            user_id: cv.user_id,
            file_name: cv.file_name,
            content_type: cv.content_type,
            extracted_text: cv.extracted_text,
            insights: None,
            uploaded_at: Utc::now(),
        };
        state.cvs.push(record.clone());
        Ok(record)
    }

    async fn list_cvs(&self, user_id: i64) -> Result<Vec<CvRecord>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.cvs.iter().filter(|c| c.user_id == user_id).cloned().collect())
    }

    async fn save_cv_insights(&self, cv_id: i64, insights: &CvInsights) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let cv = state
            .cvs
            .iter_mut()
            .find(|c| c.id == cv_id)
            .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;
        cv.insights = Some(insights.clone());
        Ok(())
    }

    async fn create_interview(&self, new: NewInterview) -> Result<InterviewSnapshot, AppError> {
        let mut state = self.state.lock().unwrap();
        let interview = Interview {
            id: state.next_id(),
            user_id: new.user_id,
            interview_type: new.interview_type,
            level: new.level,
            job_title: new.job_title,
            interview_mark: 0.0,
            started_at: new.started_at,
            finished_at: None,
            is_finished: false,
            cv_id: new.cv_id,
            original_interview_id: new.original_interview_id,
        };
        let mut questions = Vec::new();
        for q in new.questions {
            let question = Question {
                id: state.next_id(),
                interview_id: interview.id,
                parent_question_id: None,
                question_text: q.question_text,
                difficulty_level: q.difficulty_level,
                question_mark: q.question_mark,
            };
            state.questions.push(question.clone());
            questions.push(question);
        }
        state.interviews.push(interview.clone());
        Ok(InterviewSnapshot {
            interview,
            questions,
            answers: Vec::new(),
        })
    }

    async fn load_interview(
        &self,
        interview_id: i64,
    ) -> Result<Option<InterviewSnapshot>, AppError> {
        let state = self.state.lock().unwrap();
        let interview = match state.interviews.iter().find(|i| i.id == interview_id) {
            Some(i) => i.clone(),
            None => return Ok(None),
        };
        let mut questions: Vec<Question> = state
            .questions
            .iter()
            .filter(|q| q.interview_id == interview_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.id);
        let answers = state
            .answers
            .iter()
            .filter(|a| a.interview_id == interview_id)
            .cloned()
            .collect();
        Ok(Some(InterviewSnapshot {
            interview,
            questions,
            answers,
        }))
    }

    async fn list_interviews(&self, user_id: i64) -> Result<Vec<InterviewListItem>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .interviews
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| InterviewListItem {
                id: i.id,
                interview_type: i.interview_type,
                level: i.level,
                job_title: i.job_title.clone(),
                interview_mark: i.interview_mark,
                started_at: i.started_at,
                finished_at: i.finished_at,
                is_finished: i.is_finished,
                question_count: state.questions.iter().filter(|q| q.interview_id == i.id).count()
                    as i64,
                answer_count: state.answers.iter().filter(|a| a.interview_id == i.id).count()
                    as i64,
            })
            .collect())
    }

    async fn upsert_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        input: AnswerInput,
    ) -> Result<UserAnswer, AppError> {
        let mut state = self.state.lock().unwrap();
        state.ensure_open(interview_id)?;
        if !state
            .questions
            .iter()
            .any(|q| q.id == question_id && q.interview_id == interview_id)
        {
            return Err(AppError::NotFound(format!(
                "Question {question_id} not found in interview {interview_id}"
            )));
        }

        if let Some(existing) = state.answers.iter_mut().find(|a| a.question_id == question_id) {
            existing.answer_text = input.answer_text;
            if input.notes.is_some() {
                existing.notes = input.notes;
            }
            if input.transcribed_text.is_some() {
                existing.transcribed_text = input.transcribed_text;
            }
            existing.has_audio |= input.audio.is_some();
            existing.analysis = None;
            return Ok(existing.clone());
        }

        let answer = UserAnswer {
            id: state.next_id(),
            interview_id,
            question_id,
            answer_text: input.answer_text,
            notes: input.notes,
            transcribed_text: input.transcribed_text,
            has_audio: input.audio.is_some(),
            analysis: None,
        };
        state.answers.push(answer.clone());
        Ok(answer)
    }

    async fn save_analysis(
        &self,
        answer_id: i64,
        analysis: &AnswerAnalysis,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let answer = state
            .answers
            .iter_mut()
            .find(|a| a.id == answer_id)
            .ok_or_else(|| AppError::NotFound(format!("Answer {answer_id} not found")))?;
        answer.analysis = Some(analysis.clone());
        Ok(())
    }

    async fn rewrite_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        answer_text: &str,
        stale_question_ids: &[i64],
    ) -> Result<UserAnswer, AppError> {
        let mut state = self.state.lock().unwrap();
        state.ensure_open(interview_id)?;

        let answer = state
            .answers
            .iter_mut()
            .find(|a| a.interview_id == interview_id && a.question_id == question_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No answer to question {question_id} in interview {interview_id}"
                ))
            })?;
        answer.answer_text = answer_text.to_string();
        answer.analysis = None;
        let updated = answer.clone();

        state.answers.retain(|a| {
            !(a.interview_id == interview_id && stale_question_ids.contains(&a.question_id))
        });
        state
            .questions
            .retain(|q| !(q.interview_id == interview_id && stale_question_ids.contains(&q.id)));

        Ok(updated)
    }

    async fn insert_follow_up(
        &self,
        interview_id: i64,
        parent_question_id: i64,
        question_text: &str,
        difficulty_level: DifficultyLevel,
        question_mark: f64,
    ) -> Result<Question, AppError> {
        let mut state = self.state.lock().unwrap();
        state.ensure_open(interview_id)?;
        if !state
            .questions
            .iter()
            .any(|q| q.id == parent_question_id && q.interview_id == interview_id)
        {
            return Err(AppError::NotFound(format!(
                "Parent question {parent_question_id} not found in interview {interview_id}"
            )));
        }
        let question = Question {
            id: state.next_id(),
            interview_id,
            parent_question_id: Some(parent_question_id),
            question_text: question_text.to_string(),
            difficulty_level,
            question_mark,
        };
        state.questions.push(question.clone());
        Ok(question)
    }

    async fn finish_interview(
        &self,
        interview_id: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<Interview, AppError> {
        let mut state = self.state.lock().unwrap();
        let interview = state.interview_mut(interview_id)?;
        if !interview.is_finished {
            interview.is_finished = true;
            interview.finished_at = Some(finished_at);
        }
        Ok(interview.clone())
    }

    async fn set_mark(&self, interview_id: i64, mark: f64) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.interview_mut(interview_id)?.interview_mark = mark;
        Ok(())
    }

    async fn find_feedback(&self, interview_id: i64) -> Result<Option<FeedbackReport>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .feedback
            .iter()
            .find(|(id, _)| *id == interview_id)
            .map(|(_, r)| r.clone()))
    }

    async fn save_feedback(
        &self,
        interview_id: i64,
        report: &FeedbackReport,
    ) -> Result<FeedbackReport, AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some((_, existing)) = state.feedback.iter().find(|(id, _)| *id == interview_id) {
            return Ok(existing.clone());
        }
        state.feedback.push((interview_id, report.clone()));
        Ok(report.clone())
    }

    async fn expire_interviews(
        &self,
        cutoff: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<Vec<i64>, AppError> {
        let mut state = self.state.lock().unwrap();
        let mut expired = Vec::new();
        for interview in state
            .interviews
            .iter_mut()
            .filter(|i| !i.is_finished && i.started_at <= cutoff)
        {
            interview.is_finished = true;
            interview.finished_at = Some(finished_at);
            expired.push(interview.id);
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::{InterviewType, NewQuestion};

    async fn open_interview(repo: &MemoryRepository) -> (i64, i64) {
        let snapshot = repo
            .create_interview(NewInterview {
                user_id: 1,
                interview_type: InterviewType::Chat,
                level: DifficultyLevel::Mid,
                job_title: "SRE".to_string(),
                cv_id: None,
                original_interview_id: None,
                started_at: Utc::now(),
                questions: vec![NewQuestion {
                    question_text: "What is an SLO?".to_string(),
                    difficulty_level: DifficultyLevel::Mid,
                    question_mark: 1.0,
                }],
            })
            .await
            .unwrap();
        (snapshot.interview.id, snapshot.questions[0].id)
    }

    fn answer(text: &str) -> AnswerInput {
        AnswerInput {
            answer_text: text.to_string(),
            ..AnswerInput::default()
        }
    }

    #[tokio::test]
    async fn test_writes_rejected_once_interview_finished() {
        let repo = MemoryRepository::with_user(1);
        let (id, question_id) = open_interview(&repo).await;
        repo.upsert_answer(id, question_id, answer("A target"))
            .await
            .unwrap();

        // Finished between the caller's open check and its write.
        repo.finish_interview(id, Utc::now()).await.unwrap();

        assert!(matches!(
            repo.upsert_answer(id, question_id, answer("late")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            repo.insert_follow_up(id, question_id, "And SLIs?", DifficultyLevel::Mid, 0.5)
                .await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            repo.rewrite_answer(id, question_id, "late", &[]).await,
            Err(AppError::Validation(_))
        ));

        let snapshot = repo.load_interview(id).await.unwrap().unwrap();
        assert_eq!(snapshot.questions.len(), 1);
        assert_eq!(snapshot.answers[0].answer_text, "A target");
    }

    #[tokio::test]
    async fn test_save_cv_insights_requires_known_cv() {
        let repo = MemoryRepository::with_user(1);
        let insights = CvInsights {
            technical_skills: Some("Go".to_string()),
            ..CvInsights::default()
        };
        assert!(matches!(
            repo.save_cv_insights(99, &insights).await,
            Err(AppError::NotFound(_))
        ));
    }
}
