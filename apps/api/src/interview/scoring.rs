//! Interview scoring: a weighted 0 to 100 mark from four independent components.
//!
//! total = 0.30*completion + 0.40*quality + 0.20*difficulty + 0.10*time_efficiency
//!
//! Pure and deterministic: the same snapshot always yields the same breakdown.

use serde::{Deserialize, Serialize};

use crate::models::interview::{AnswerAnalysis, DifficultyLevel, InterviewSnapshot, UserAnswer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub completion: f64,
    pub quality: f64,
    pub difficulty: f64,
    pub time_efficiency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            completion: 0.30,
            quality: 0.40,
            difficulty: 0.20,
            time_efficiency: 0.10,
        }
    }
}

const ANSWER_BASE_SCORE: f64 = 70.0;
const UNKNOWN_TONE_SCORE: f64 = 5.0;
const PERSONALITY_BASE_SCORE: f64 = 5.0;
const POSITIVE_TRAIT_BONUS: f64 = 1.5;
const NEGATIVE_TRAIT_PENALTY: f64 = 1.0;

const POSITIVE_TRAITS: &[&str] = &[
    "analytical",
    "empathetic",
    "assertive",
    "confident",
    "professional",
    "detail-oriented",
    "collaborative",
];

const NEGATIVE_TRAITS: &[&str] = &["passive", "hesitant", "aggressive", "disorganized"];

/// Each component on a 0 to 100 scale, its weighted contribution, and the total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub completion: f64,
    pub quality: f64,
    pub difficulty: f64,
    pub time_efficiency: f64,
    pub weighted_completion: f64,
    pub weighted_quality: f64,
    pub weighted_difficulty: f64,
    pub weighted_time_efficiency: f64,
    pub total: f64,
    pub grade: &'static str,
    pub feedback: &'static str,
    pub answered_questions: usize,
    pub total_questions: usize,
}

/// Scores an interview with the default weights.
pub fn score_interview(snapshot: &InterviewSnapshot) -> ScoreBreakdown {
    score_interview_with(snapshot, &ScoreWeights::default())
}

pub fn score_interview_with(
    snapshot: &InterviewSnapshot,
    weights: &ScoreWeights,
) -> ScoreBreakdown {
    let answered_questions = snapshot.answers.len();
    let total_questions = snapshot.questions.len();

    let (completion, quality, difficulty, time_efficiency) = if snapshot.answers.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        (
            completion_score(snapshot),
            quality_score(&snapshot.answers),
            difficulty_score(snapshot),
            time_efficiency_score(snapshot),
        )
    };

    let weighted_completion = completion * weights.completion;
    let weighted_quality = quality * weights.quality;
    let weighted_difficulty = difficulty * weights.difficulty;
    let weighted_time_efficiency = time_efficiency * weights.time_efficiency;

    let total = (weighted_completion
        + weighted_quality
        + weighted_difficulty
        + weighted_time_efficiency)
        .clamp(0.0, 100.0);

    ScoreBreakdown {
        completion,
        quality,
        difficulty,
        time_efficiency,
        weighted_completion,
        weighted_quality,
        weighted_difficulty,
        weighted_time_efficiency,
        total,
        grade: grade(total),
        feedback: feedback(total),
        answered_questions,
        total_questions,
    }
}

/// answered / total * 100.
pub fn completion_score(snapshot: &InterviewSnapshot) -> f64 {
    if snapshot.questions.is_empty() {
        return 0.0;
    }
    snapshot.answers.len() as f64 / snapshot.questions.len() as f64 * 100.0
}

/// Mean per-answer quality score.
pub fn quality_score(answers: &[UserAnswer]) -> f64 {
    if answers.is_empty() {
        return 0.0;
    }
    answers.iter().map(answer_score).sum::<f64>() / answers.len() as f64
}

/// 70 base + length + tone + personality, capped at 100.
pub fn answer_score(answer: &UserAnswer) -> f64 {
    let analysis = answer.analysis.as_ref();
    let score = ANSWER_BASE_SCORE
        + length_score(&answer.answer_text)
        + tone_score(analysis.map(|a| a.tone.as_str()))
        + personality_score(analysis);
    score.min(100.0)
}

/// Word-count bucket; the peak is 100 to 199 words.
pub fn length_score(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    match words {
        0 => 0.0,
        1..=9 => 2.0,
        10..=24 => 5.0,
        25..=49 => 8.0,
        50..=99 => 9.0,
        100..=199 => 10.0,
        200..=299 => 7.0,
        _ => 5.0,
    }
}

pub fn tone_score(tone: Option<&str>) -> f64 {
    let tone = match tone.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_lowercase(),
        None => return UNKNOWN_TONE_SCORE,
    };
    match tone.as_str() {
        "confident" => 10.0,
        "enthusiastic" => 9.0,
        "analytical" | "professional" => 8.0,
        "neutral" => 6.0,
        "hesitant" => 4.0,
        "passive" => 3.0,
        _ => UNKNOWN_TONE_SCORE,
    }
}

/// Base 5, +1.5 per whitelisted trait, -1 per blacklisted trait, clamped to [0, 10].
pub fn personality_score(analysis: Option<&AnswerAnalysis>) -> f64 {
    let traits = match analysis {
        Some(a) if !a.personality_traits.is_empty() => &a.personality_traits,
        _ => return PERSONALITY_BASE_SCORE,
    };

    let score = traits.iter().fold(PERSONALITY_BASE_SCORE, |acc, t| {
        let t = t.trim().to_lowercase();
        if POSITIVE_TRAITS.contains(&t.as_str()) {
            acc + POSITIVE_TRAIT_BONUS
        } else if NEGATIVE_TRAITS.contains(&t.as_str()) {
            acc - NEGATIVE_TRAIT_PENALTY
        } else {
            acc
        }
    });
    score.clamp(0.0, 10.0)
}

pub fn difficulty_bonus(level: DifficultyLevel) -> f64 {
    match level {
        DifficultyLevel::Internship => 5.0,
        DifficultyLevel::Junior => 10.0,
        DifficultyLevel::Mid => 15.0,
        DifficultyLevel::Senior => 20.0,
    }
}

/// Mean difficulty bonus over answered questions that still exist.
pub fn difficulty_score(snapshot: &InterviewSnapshot) -> f64 {
    let bonuses: Vec<f64> = snapshot
        .answers
        .iter()
        .filter_map(|a| snapshot.question(a.question_id))
        .map(|q| difficulty_bonus(q.difficulty_level))
        .collect();

    if bonuses.is_empty() {
        0.0
    } else {
        bonuses.iter().sum::<f64>() / bonuses.len() as f64
    }
}

/// Bucketed average minutes per answer; 2 to 5 minutes is optimal.
pub fn time_efficiency_score(snapshot: &InterviewSnapshot) -> f64 {
    let finished_at = match snapshot.interview.finished_at {
        Some(t) => t,
        None => return 0.0,
    };
    let answer_count = snapshot.answers.len();
    if answer_count == 0 {
        return 0.0;
    }

    let total_minutes =
        (finished_at - snapshot.interview.started_at).num_milliseconds() as f64 / 60_000.0;
    if total_minutes <= 0.0 {
        return 0.0;
    }

    let per_answer = total_minutes / answer_count as f64;
    if per_answer < 1.0 {
        5.0
    } else if per_answer < 2.0 {
        8.0
    } else if per_answer <= 5.0 {
        10.0
    } else if per_answer < 8.0 {
        7.0
    } else if per_answer < 15.0 {
        5.0
    } else {
        3.0
    }
}

/// Letter grade in 5-point bands from A+ (>= 90) down to F (<35).
pub fn grade(score: f64) -> &'static str {
    const BANDS: &[(f64, &str)] = &[
        (90.0, "A+"),
        (85.0, "A"),
        (80.0, "A-"),
        (75.0, "B+"),
        (70.0, "B"),
        (65.0, "B-"),
        (60.0, "C+"),
        (55.0, "C"),
        (50.0, "C-"),
        (45.0, "D+"),
        (40.0, "D"),
        (35.0, "D-"),
    ];
    BANDS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, g)| *g)
        .unwrap_or("F")
}

pub fn feedback(score: f64) -> &'static str {
    if score >= 90.0 {
        "Excellent performance! You demonstrated exceptional knowledge and communication skills."
    } else if score >= 80.0 {
        "Great job! You showed strong understanding and good communication."
    } else if score >= 70.0 {
        "Good performance. You have solid knowledge with room for improvement."
    } else if score >= 60.0 {
        "Fair performance. Focus on improving your explanations and depth of knowledge."
    } else if score >= 50.0 {
        "Below average. Consider reviewing the topics and practicing more."
    } else if score >= 40.0 {
        "Needs improvement. Significant work needed on knowledge and communication."
    } else {
        "Poor performance. Extensive review and practice recommended."
    }
}
