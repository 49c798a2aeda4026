use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::info;

use crate::errors::AppError;
use crate::models::cv::{CvInsights, CvRecord, NewCv};
use crate::models::interview::{
    AnswerAnalysis, AnswerInput, DifficultyLevel, FeedbackReport, Interview, InterviewListItem,
    InterviewSnapshot, NewInterview, Question, UserAnswer,
};
use crate::repository::Repository;

/// PostgreSQL-backed repository.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct InterviewRow {
    id: i64,
    user_id: i64,
    interview_type: String,
    level: String,
    job_title: String,
    interview_mark: f64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    is_finished: bool,
    cv_id: Option<i64>,
    original_interview_id: Option<i64>,
}

impl TryFrom<InterviewRow> for Interview {
    type Error = AppError;

    fn try_from(row: InterviewRow) -> Result<Self, Self::Error> {
        Ok(Interview {
            id: row.id,
            user_id: row.user_id,
            interview_type: row.interview_type.parse().map_err(corrupt)?,
            level: row.level.parse().map_err(corrupt)?,
            job_title: row.job_title,
            interview_mark: row.interview_mark,
            started_at: row.started_at,
            finished_at: row.finished_at,
            is_finished: row.is_finished,
            cv_id: row.cv_id,
            original_interview_id: row.original_interview_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    interview_id: i64,
    parent_question_id: Option<i64>,
    question_text: String,
    difficulty_level: String,
    question_mark: f64,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            interview_id: row.interview_id,
            parent_question_id: row.parent_question_id,
            question_text: row.question_text,
            difficulty_level: row.difficulty_level.parse().map_err(corrupt)?,
            question_mark: row.question_mark,
        })
    }
}

#[derive(Debug, FromRow)]
struct AnswerRow {
    id: i64,
    interview_id: i64,
    question_id: i64,
    answer_text: String,
    notes: Option<String>,
    transcribed_text: Option<String>,
    has_audio: bool,
    tone: Option<String>,
    personality_traits: Option<Json<Vec<String>>>,
    soft_skills: Option<Json<Vec<String>>>,
}

impl From<AnswerRow> for UserAnswer {
    fn from(row: AnswerRow) -> Self {
        let analysis = row.tone.map(|tone| AnswerAnalysis {
            tone,
            personality_traits: row.personality_traits.map(|j| j.0).unwrap_or_default(),
            soft_skills: row.soft_skills.map(|j| j.0).unwrap_or_default(),
        });
        UserAnswer {
            id: row.id,
            interview_id: row.interview_id,
            question_id: row.question_id,
            answer_text: row.answer_text,
            notes: row.notes,
            transcribed_text: row.transcribed_text,
            has_audio: row.has_audio,
            analysis,
        }
    }
}

#[derive(Debug, FromRow)]
struct CvRow {
    id: i64,
    user_id: i64,
    file_name: String,
    content_type: String,
    extracted_text: Option<String>,
    uploaded_at: DateTime<Utc>,
    has_insights: bool,
    technical_skills: Option<String>,
    soft_skills: Option<String>,
    tools_and_technologies: Option<String>,
    certifications: Option<String>,
    experience_summary: Option<String>,
}

impl From<CvRow> for CvRecord {
    fn from(row: CvRow) -> Self {
        let insights = row.has_insights.then(|| CvInsights {
            technical_skills: row.technical_skills,
            soft_skills: row.soft_skills,
            tools_and_technologies: row.tools_and_technologies,
            certifications: row.certifications,
            experience_summary: row.experience_summary,
        });
        CvRecord {
            id: row.id,
            user_id: row.user_id,
            file_name: row.file_name,
            content_type: row.content_type,
            extracted_text: row.extracted_text,
            insights,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InterviewListRow {
    #[sqlx(flatten)]
    interview: InterviewRow,
    question_count: i64,
    answer_count: i64,
}

#[derive(Debug, FromRow)]
struct FeedbackRow {
    strengths: String,
    weaknesses: String,
    personality_summary: String,
    recommendation: String,
}

impl From<FeedbackRow> for FeedbackReport {
    fn from(row: FeedbackRow) -> Self {
        FeedbackReport {
            strengths: row.strengths,
            weaknesses: row.weaknesses,
            personality_summary: row.personality_summary,
            recommendation: row.recommendation,
        }
    }
}

fn corrupt(message: String) -> AppError {
    AppError::Internal(anyhow::anyhow!("Corrupt row: {message}"))
}

const INTERVIEW_COLUMNS: &str = "id, user_id, interview_type, level, job_title, interview_mark, \
     started_at, finished_at, is_finished, cv_id, original_interview_id";

const ANSWER_SELECT: &str = r#"
    SELECT a.id, a.interview_id, a.question_id, a.answer_text, a.notes, a.transcribed_text,
           (a.audio_data IS NOT NULL) AS has_audio,
           an.tone, an.personality_traits, an.soft_skills
    FROM user_answers a
    LEFT JOIN answer_analyses an ON an.user_answer_id = a.id
"#;

const CV_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.file_name, c.content_type, c.extracted_text, c.uploaded_at,
           (i.id IS NOT NULL) AS has_insights,
           i.technical_skills, i.soft_skills, i.tools_and_technologies,
           i.certifications, i.experience_summary
    FROM cvs c
    LEFT JOIN cv_insights i ON i.cv_id = c.id
"#;

/// Takes the row lock that serialises writers on one interview.
/// Locks the interview row for the rest of the transaction and checks that
/// it is still open. A concurrent end or expiry cannot slip in afterwards.
async fn lock_open_interview(
    tx: &mut Transaction<'_, Postgres>,
    interview_id: i64,
) -> Result<(), AppError> {
    let is_finished =
        sqlx::query_scalar::<_, bool>("SELECT is_finished FROM interviews WHERE id = $1 FOR UPDATE")
            .bind(interview_id)
            .fetch_optional(&mut **tx)
            .await?;
    ensure_open(interview_id, is_finished)
}

fn ensure_open(interview_id: i64, is_finished: Option<bool>) -> Result<(), AppError> {
    match is_finished {
        None => Err(AppError::NotFound(format!("Interview {interview_id} not found"))),
        Some(true) => Err(AppError::Validation(format!(
            "Interview {interview_id} is already finished"
        ))),
        Some(false) => Ok(()),
    }
}

async fn fetch_answer(
    tx: &mut Transaction<'_, Postgres>,
    answer_id: i64,
) -> Result<UserAnswer, AppError> {
    let row = sqlx::query_as::<_, AnswerRow>(&format!("{ANSWER_SELECT} WHERE a.id = $1"))
        .bind(answer_id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.into())
}

/// Inserts the report, or returns the stored one when a report already
/// exists. The no-op update makes `RETURNING` yield the stored row on
/// conflict, so concurrent callers all see the first writer's report.
const SAVE_FEEDBACK_SQL: &str = r#"
    INSERT INTO feedback_reports
        (interview_id, strengths, weaknesses, personality_summary, recommendation)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (interview_id) DO UPDATE SET interview_id = EXCLUDED.interview_id
    RETURNING strengths, weaknesses, personality_summary, recommendation
"#;

#[async_trait]
impl Repository for PgRepository {
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn find_cv(&self, cv_id: i64) -> Result<Option<CvRecord>, AppError> {
        let row = sqlx::query_as::<_, CvRow>(&format!("{CV_SELECT} WHERE c.id = $1"))
            .bind(cv_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CvRecord::from))
    }

    async fn save_cv(&self, cv: NewCv) -> Result<CvRecord, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO cvs (user_id, file_name, content_type, extracted_text)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(cv.user_id)
        .bind(&cv.file_name)
        .bind(&cv.content_type)
        .bind(&cv.extracted_text)
        .fetch_one(&self.pool)
        .await?;

        info!("Stored CV {id} for user {}", cv.user_id);

        self.find_cv(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("CV {id} vanished after insert")))
    }

    async fn list_cvs(&self, user_id: i64) -> Result<Vec<CvRecord>, AppError> {
        let rows = sqlx::query_as::<_, CvRow>(&format!(
            "{CV_SELECT} WHERE c.user_id = $1 ORDER BY c.uploaded_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CvRecord::from).collect())
    }

    async fn save_cv_insights(&self, cv_id: i64, insights: &CvInsights) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cv_insights
                (cv_id, technical_skills, soft_skills, tools_and_technologies,
                 certifications, experience_summary)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (cv_id) DO UPDATE SET
                technical_skills = EXCLUDED.technical_skills,
                soft_skills = EXCLUDED.soft_skills,
                tools_and_technologies = EXCLUDED.tools_and_technologies,
                certifications = EXCLUDED.certifications,
                experience_summary = EXCLUDED.experience_summary,
                created_at = now()
            "#,
        )
        .bind(cv_id)
        .bind(&insights.technical_skills)
        .bind(&insights.soft_skills)
        .bind(&insights.tools_and_technologies)
        .bind(&insights.certifications)
        .bind(&insights.experience_summary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_interview(&self, new: NewInterview) -> Result<InterviewSnapshot, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            r#"
            INSERT INTO interviews
                (user_id, interview_type, level, job_title, started_at,
                 cv_id, original_interview_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INTERVIEW_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.interview_type.as_str())
        .bind(new.level.as_str())
        .bind(&new.job_title)
        .bind(new.started_at)
        .bind(new.cv_id)
        .bind(new.original_interview_id)
        .fetch_one(&mut *tx)
        .await?;
        let interview = Interview::try_from(row)?;

        let mut questions = Vec::with_capacity(new.questions.len());
        for q in &new.questions {
            let row = sqlx::query_as::<_, QuestionRow>(
                r#"
                INSERT INTO questions (interview_id, question_text, difficulty_level, question_mark)
                VALUES ($1, $2, $3, $4)
                RETURNING id, interview_id, parent_question_id, question_text,
                          difficulty_level, question_mark
                "#,
            )
            .bind(interview.id)
            .bind(&q.question_text)
            .bind(q.difficulty_level.as_str())
            .bind(q.question_mark)
            .fetch_one(&mut *tx)
            .await?;
            questions.push(Question::try_from(row)?);
        }

        tx.commit().await?;

        info!(
            "Created interview {} ({}) with {} questions for user {}",
            interview.id,
            interview.interview_type,
            questions.len(),
            interview.user_id
        );

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
        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = $1"
        ))
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await?;

        let interview = match row {
            Some(row) => Interview::try_from(row)?,
            None => return Ok(None),
        };

        let questions = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, interview_id, parent_question_id, question_text,
                   difficulty_level, question_mark
            FROM questions
            WHERE interview_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Question::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let answers = sqlx::query_as::<_, AnswerRow>(&format!(
            "{ANSWER_SELECT} WHERE a.interview_id = $1 ORDER BY a.id ASC"
        ))
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(UserAnswer::from)
        .collect();

        Ok(Some(InterviewSnapshot {
            interview,
            questions,
            answers,
        }))
    }

    async fn list_interviews(&self, user_id: i64) -> Result<Vec<InterviewListItem>, AppError> {
        let rows = sqlx::query_as::<_, InterviewListRow>(&format!(
            r#"
            SELECT {INTERVIEW_COLUMNS},
                   (SELECT COUNT(*) FROM questions q
                     WHERE q.interview_id = interviews.id) AS question_count,
                   (SELECT COUNT(*) FROM user_answers a
                     WHERE a.interview_id = interviews.id) AS answer_count
            FROM interviews
            WHERE user_id = $1
            ORDER BY started_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let interview = Interview::try_from(row.interview)?;
                Ok(InterviewListItem {
                    id: interview.id,
                    interview_type: interview.interview_type,
                    level: interview.level,
                    job_title: interview.job_title,
                    interview_mark: interview.interview_mark,
                    started_at: interview.started_at,
                    finished_at: interview.finished_at,
                    is_finished: interview.is_finished,
                    question_count: row.question_count,
                    answer_count: row.answer_count,
                })
            })
            .collect()
    }

    async fn upsert_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        input: AnswerInput,
    ) -> Result<UserAnswer, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_open_interview(&mut tx, interview_id).await?;

        let answer_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO user_answers
                (interview_id, question_id, answer_text, notes, transcribed_text, audio_data)
            SELECT $1, q.id, $3, $4, $5, $6
            FROM questions q
            WHERE q.id = $2 AND q.interview_id = $1
            ON CONFLICT (question_id) DO UPDATE SET
                answer_text = EXCLUDED.answer_text,
                notes = COALESCE(EXCLUDED.notes, user_answers.notes),
                transcribed_text =
                    COALESCE(EXCLUDED.transcribed_text, user_answers.transcribed_text),
                audio_data = COALESCE(EXCLUDED.audio_data, user_answers.audio_data),
                updated_at = now()
            RETURNING id
            "#,
        )
        .bind(interview_id)
        .bind(question_id)
        .bind(&input.answer_text)
        .bind(&input.notes)
        .bind(&input.transcribed_text)
        .bind(&input.audio)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Question {question_id} not found in interview {interview_id}"
            ))
        })?;

        sqlx::query("DELETE FROM answer_analyses WHERE user_answer_id = $1")
            .bind(answer_id)
            .execute(&mut *tx)
            .await?;

        let answer = fetch_answer(&mut tx, answer_id).await?;
        tx.commit().await?;
        Ok(answer)
    }

    async fn save_analysis(
        &self,
        answer_id: i64,
        analysis: &AnswerAnalysis,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO answer_analyses (user_answer_id, tone, personality_traits, soft_skills)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_answer_id) DO UPDATE SET
                tone = EXCLUDED.tone,
                personality_traits = EXCLUDED.personality_traits,
                soft_skills = EXCLUDED.soft_skills
            "#,
        )
        .bind(answer_id)
        .bind(&analysis.tone)
        .bind(Json(&analysis.personality_traits))
        .bind(Json(&analysis.soft_skills))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rewrite_answer(
        &self,
        interview_id: i64,
        question_id: i64,
        answer_text: &str,
        stale_question_ids: &[i64],
    ) -> Result<UserAnswer, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_open_interview(&mut tx, interview_id).await?;

        let answer_id: i64 = sqlx::query_scalar(
            r#"
            UPDATE user_answers
            SET answer_text = $3, updated_at = now()
            WHERE interview_id = $1 AND question_id = $2
            RETURNING id
            "#,
        )
        .bind(interview_id)
        .bind(question_id)
        .bind(answer_text)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No answer to question {question_id} in interview {interview_id}"
            ))
        })?;

        sqlx::query("DELETE FROM answer_analyses WHERE user_answer_id = $1")
            .bind(answer_id)
            .execute(&mut *tx)
            .await?;

        if !stale_question_ids.is_empty() {
            let removed_answers = sqlx::query(
                "DELETE FROM user_answers WHERE interview_id = $1 AND question_id = ANY($2)",
            )
            .bind(interview_id)
            .bind(stale_question_ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let removed_questions =
                sqlx::query("DELETE FROM questions WHERE interview_id = $1 AND id = ANY($2)")
                    .bind(interview_id)
                    .bind(stale_question_ids)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();

            info!(
                "Interview {interview_id}: removed {removed_questions} stale follow-ups \
                 and {removed_answers} answers under question {question_id}"
            );
        }

        let answer = fetch_answer(&mut tx, answer_id).await?;
        tx.commit().await?;
        Ok(answer)
    }

    async fn insert_follow_up(
        &self,
        interview_id: i64,
        parent_question_id: i64,
        question_text: &str,
        difficulty_level: DifficultyLevel,
        question_mark: f64,
    ) -> Result<Question, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_open_interview(&mut tx, interview_id).await?;

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions
                (interview_id, parent_question_id, question_text, difficulty_level, question_mark)
            SELECT $1, p.id, $3, $4, $5
            FROM questions p
            WHERE p.id = $2 AND p.interview_id = $1
            RETURNING id, interview_id, parent_question_id, question_text,
                      difficulty_level, question_mark
            "#,
        )
        .bind(interview_id)
        .bind(parent_question_id)
        .bind(question_text)
        .bind(difficulty_level.as_str())
        .bind(question_mark)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Parent question {parent_question_id} not found in interview {interview_id}"
            ))
        })?;

        tx.commit().await?;
        Question::try_from(row)
    }

    async fn finish_interview(
        &self,
        interview_id: i64,
        finished_at: DateTime<Utc>,
    ) -> Result<Interview, AppError> {
        let updated = sqlx::query(
            "UPDATE interviews SET is_finished = TRUE, finished_at = $2 \
             WHERE id = $1 AND NOT is_finished",
        )
        .bind(interview_id)
        .bind(finished_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            info!("Interview {interview_id} finished at {finished_at}");
        }

        let row = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = $1"
        ))
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;
        Interview::try_from(row)
    }

    async fn set_mark(&self, interview_id: i64, mark: f64) -> Result<(), AppError> {
        sqlx::query("UPDATE interviews SET interview_mark = $2 WHERE id = $1")
            .bind(interview_id)
            .bind(mark)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_feedback(&self, interview_id: i64) -> Result<Option<FeedbackReport>, AppError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT strengths, weaknesses, personality_summary, recommendation
            FROM feedback_reports
            WHERE interview_id = $1
            "#,
        )
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FeedbackReport::from))
    }

    async fn save_feedback(
        &self,
        interview_id: i64,
        report: &FeedbackReport,
    ) -> Result<FeedbackReport, AppError> {
        let row = sqlx::query_as::<_, FeedbackRow>(SAVE_FEEDBACK_SQL)
            .bind(interview_id)
            .bind(&report.strengths)
            .bind(&report.weaknesses)
            .bind(&report.personality_summary)
            .bind(&report.recommendation)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn expire_interviews(
        &self,
        cutoff: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Result<Vec<i64>, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            UPDATE interviews
            SET is_finished = TRUE, finished_at = $2
            WHERE NOT is_finished AND started_at <= $1
            RETURNING id
            "#,
        )
        .bind(cutoff)
        .bind(finished_at)
        .fetch_all(&self.pool)
        .await?)
    }
}
