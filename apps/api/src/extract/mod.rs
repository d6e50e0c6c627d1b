//! PDF text extraction.
//!
//! `TextExtractor` is the seam the parse pipeline depends on; `PdfTextExtractor`
//! is the production implementation backed by `pdf-extract`.

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not read PDF: {0}")]
    Pdf(String),

    #[error("PDF contains no extractable text")]
    NoText,

    #[error("extraction task failed: {0}")]
    Task(String),
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, pdf: Bytes) -> Result<String, ExtractionError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, pdf: Bytes) -> Result<String, ExtractionError> {
        // pdf-extract is CPU-bound and synchronous.
        let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        let text = clean_text(&raw);
        if text.is_empty() {
            return Err(ExtractionError::NoText);
        }
        debug!(
            raw_chars = raw.chars().count(),
            clean_chars = text.chars().count(),
            "Extracted PDF text"
        );
        Ok(text)
    }
}

static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static RE_BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])-\n([a-z])").unwrap());
static RE_SPLIT_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9._%+-]+)\s*@\s*([A-Za-z0-9.-]+\.[A-Za-z]{2,})").unwrap()
});
static RE_SPLIT_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{3})(?: *- *| +)(\d{4})(?: *- *| +)(\d{4})\b").unwrap());
static RE_SPLIT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}) *([/-]) *(\d{1,2}) *([/-]) *(\d{1,2})\b").unwrap());

/// Normalizes extractor output into something an LLM reads reliably:
/// unified newlines, single spaces, trimmed lines, at most one blank line in a row,
/// re-joined hyphenated words and e-mail/phone/date fragments glued back together.
pub fn clean_text(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace(['\r', '\u{c}'], "\n");
    let text = RE_HORIZONTAL_WS.replace_all(&text, " ");

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let text = lines.join("\n");

    let text = RE_BLANK_RUNS.replace_all(&text, "\n\n");
    let text = RE_HYPHEN_BREAK.replace_all(&text, "$1$2");
    let text = RE_SPLIT_EMAIL.replace_all(&text, "$1@$2");
    let text = RE_SPLIT_PHONE.replace_all(&text, "$1-$2-$3");
    let text = RE_SPLIT_DATE.replace_all(&text, "$1$2$3$4$5");

    text.trim().to_string()
}
