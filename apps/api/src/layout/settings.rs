use serde::Serialize;

use crate::config::Config;
use crate::layout::pagination::{PageGeometry, PaginationRules};

pub const ANALYSIS_HEADING: &str = "Solution Analysis";
pub const DESCRIPTION_HEADING: &str = "Problem Description";

/// Read-only document parameters shared by every render pass.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSettings {
    pub page: PageGeometry,
    pub rules: PaginationRules,
    /// Text of the primary title at the top of the first page.
    pub document_title: String,
    pub description_heading: String,
    pub analysis_heading: String,
    pub footer_text: String,
}

impl DocumentSettings {
    /// Threshold overrides from the config are applied, then every threshold is
    /// clamped to one usable page.
    pub fn from_config(config: &Config) -> Self {
        let defaults = DocumentSettings::default();
        let rules = config
            .min_space_overrides
            .iter()
            .fold(defaults.rules.clone(), |rules, &(kind, points)| rules.with_min_space(kind, points))
            .fit_to(&defaults.page);
        DocumentSettings {
            rules,
            document_title: config.document_title.clone(),
            footer_text: config.footer_text.clone(),
            ..defaults
        }
    }
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            page: PageGeometry::letter(),
            rules: PaginationRules::default(),
            document_title: "Problem Analysis".to_string(),
            description_heading: DESCRIPTION_HEADING.to_string(),
            analysis_heading: ANALYSIS_HEADING.to_string(),
            footer_text: "Generated by pdfgen".to_string(),
        }
    }
}
