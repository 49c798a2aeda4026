use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded CV. The raw file bytes are not retained; only the text
/// extracted at upload time is kept as question context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvRecord {
    pub id: i64,
    pub user_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub extracted_text: Option<String>,
    pub insights: Option<CvInsights>,
    pub uploaded_at: DateTime<Utc>,
}

/// Skill and experience categories extracted from a CV's text at upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvInsights {
    pub technical_skills: Option<String>,
    pub soft_skills: Option<String>,
    pub tools_and_technologies: Option<String>,
    pub certifications: Option<String>,
    pub experience_summary: Option<String>,
}

impl CvInsights {
    /// Renders the non-empty insight fields as a prompt context block.
    /// Returns `None` when every field is blank.
    pub fn as_context(&self) -> Option<String> {
        let sections = [
            ("Technical skills", &self.technical_skills),
            ("Soft skills", &self.soft_skills),
            ("Tools and technologies", &self.tools_and_technologies),
            ("Certifications", &self.certifications),
            ("Experience summary", &self.experience_summary),
        ];

        let lines: Vec<String> = sections
            .iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{label}: {v}"))
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

impl CvRecord {
    /// Question context for this CV: insights first, then the raw extracted text.
    pub fn question_context(&self) -> Option<String> {
        self.insights
            .as_ref()
            .and_then(CvInsights::as_context)
            .or_else(|| {
                self.extracted_text
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
            })
    }
}

/// Input for persisting a freshly uploaded CV.
#[derive(Debug, Clone)]
pub struct NewCv {
    pub user_id: i64,
    pub file_name: String,
    pub content_type: String,
    pub extracted_text: Option<String>,
}
