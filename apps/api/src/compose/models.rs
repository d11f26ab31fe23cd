use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::text::{sanitize_analysis, sanitize_field};

/// Inbound JSON body of `POST /api/v1/documents/analysis`.
///
/// Required fields are optional here so that a missing field is reported as a
/// validation error rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub problem_title: Option<String>,
    pub problem_difficulty: Option<String>,
    pub problem_topics: Option<String>,
    pub problem_link: Option<String>,
    pub problem_content: Option<String>,
    pub analysis: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemMetadata {
    pub title: String,
    pub difficulty: Option<String>,
    pub topics: Option<String>,
    pub link: Option<String>,
}

/// Everything one document is built from. Raw, unsanitized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub metadata: ProblemMetadata,
    pub content: Option<String>,
    pub analysis: String,
    pub date: Option<String>,
}

impl AnalysisRequest {
    pub fn into_render_request(self) -> Result<RenderRequest, AppError> {
        let request = RenderRequest {
            metadata: ProblemMetadata {
                title: self.problem_title.unwrap_or_default(),
                difficulty: self.problem_difficulty,
                topics: self.problem_topics,
                link: self.problem_link,
            },
            content: self.problem_content,
            analysis: self.analysis.unwrap_or_default(),
            date: self.date,
        };
        request.validate()?;
        Ok(request)
    }
}

impl RenderRequest {
    /// Both the problem title and the analysis must be non-blank, and must keep
    /// some text once markup is stripped. Emoji are counted as text here; whether
    /// they survive depends on the font and is checked again after registration.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.metadata.title.trim().is_empty() {
            return Err(AppError::Validation("problemTitle is required".to_string()));
        }
        if self.analysis.trim().is_empty() {
            return Err(AppError::Validation("analysis is required".to_string()));
        }
        if sanitize_field(Some(&self.metadata.title), true).is_empty() {
            return Err(AppError::Validation(
                "problemTitle has no printable text".to_string(),
            ));
        }
        if sanitize_analysis(&self.analysis, true).trim().is_empty() {
            return Err(AppError::Validation("analysis has no printable text".to_string()));
        }
        Ok(())
    }
}
