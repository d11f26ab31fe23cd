use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::layout::BlockKind;

const DEFAULT_DOCUMENT_TITLE: &str = "Problem Analysis";
const DEFAULT_FOOTER_TEXT: &str = "Generated by pdfgen";
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Nothing is strictly required; every variable has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Font used as a fallback for emoji glyphs. Probed per request, never cached.
    pub emoji_font_path: Option<PathBuf>,
    pub document_title: String,
    pub footer_text: String,
    pub max_body_bytes: usize,
    /// Per-kind pagination thresholds, e.g. `code_block=120,footer=160`.
    pub min_space_overrides: Vec<(BlockKind, f32)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            emoji_font_path: optional_env("EMOJI_FONT_PATH").map(PathBuf::from),
            document_title: optional_env("DOCUMENT_TITLE")
                .unwrap_or_else(|| DEFAULT_DOCUMENT_TITLE.to_string()),
            footer_text: optional_env("FOOTER_TEXT")
                .unwrap_or_else(|| DEFAULT_FOOTER_TEXT.to_string()),
            max_body_bytes: match optional_env("MAX_BODY_BYTES") {
                Some(raw) => raw
                    .parse::<usize>()
                    .context("MAX_BODY_BYTES must be a byte count")?,
                None => DEFAULT_MAX_BODY_BYTES,
            },
            min_space_overrides: match optional_env("MIN_SPACE_OVERRIDES") {
                Some(raw) => parse_min_space_overrides(&raw).context("MIN_SPACE_OVERRIDES is invalid")?,
                None => Vec::new(),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            emoji_font_path: None,
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
            footer_text: DEFAULT_FOOTER_TEXT.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            min_space_overrides: Vec::new(),
        }
    }
}

/// Reads an env var, treating an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `kind=points` pairs separated by commas. Points must be finite and non-negative.
fn parse_min_space_overrides(raw: &str) -> Result<Vec<(BlockKind, f32)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (kind, points) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected kind=points, got '{pair}'"))?;
            let kind = kind.parse::<BlockKind>().map_err(|e| anyhow!(e))?;
            let points = points
                .trim()
                .parse::<f32>()
                .with_context(|| format!("'{}' is not a number", points.trim()))?;
            if !points.is_finite() || points < 0.0 {
                return Err(anyhow!("threshold for {kind:?} must be a non-negative number"));
            }
            Ok((kind, points))
        })
        .collect()
}
