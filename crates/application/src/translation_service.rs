//! Natural-language to command translation.
//!
//! The translator port returns raw model text; the service carves a command
//! out of it. Model output is unreliable, so extraction is layered: a JSON
//! block with a `kubectl_command` field first, then the first line that
//! mentions the program, each followed by a sanitizing pass.

use std::sync::Arc;

use async_trait::async_trait;
use kubegate_core::{AppError, AppResult};
use kubegate_domain::PROGRAM_NAME;

/// Port for the language-model backend.
#[async_trait]
pub trait CommandTranslator: Send + Sync {
    /// Produces raw model text for a natural-language query.
    async fn translate(&self, query: &str) -> AppResult<String>;
}

/// Application service turning model text into a single command line.
#[derive(Clone)]
pub struct TranslationService {
    translator: Arc<dyn CommandTranslator>,
}

impl TranslationService {
    /// Creates a translation service over a translator backend.
    #[must_use]
    pub fn new(translator: Arc<dyn CommandTranslator>) -> Self {
        Self { translator }
    }

    /// Translates a query into a cleaned command line.
    ///
    /// The result is a suggestion only; it passes through the full pipeline
    /// like any hand-typed command when submitted.
    pub async fn translate(&self, query: &str) -> AppResult<String> {
        let raw = self.translator.translate(query).await?;
        extract_command(&raw)
    }
}

fn extract_command(raw: &str) -> AppResult<String> {
    let candidate = json_command(raw)
        .or_else(|| line_command(raw))
        .ok_or_else(|| {
            AppError::Execution("model response contained no usable command".to_owned())
        })?;

    let cleaned = sanitize(&candidate);
    if cleaned.is_empty() {
        return Err(AppError::Execution(
            "model response contained no usable command".to_owned(),
        ));
    }
    Ok(cleaned)
}

/// Pulls `kubectl_command` out of the first `{...}` block, if any.
fn json_command(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw[start..].rfind('}')? + start;
    let value: serde_json::Value = serde_json::from_str(&raw[start..=end]).ok()?;
    value
        .get("kubectl_command")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

/// Falls back to the first line mentioning the program, from its first
/// occurrence onward.
fn line_command(raw: &str) -> Option<String> {
    raw.lines().find_map(|line| {
        line.find(PROGRAM_NAME)
            .map(|index| line[index..].to_owned())
    })
}

fn sanitize(candidate: &str) -> String {
    let stripped: String = candidate
        .chars()
        .filter(|ch| !matches!(ch, '\'' | '"' | '\u{201c}' | '\u{201d}' | '\u{2018}' | '\u{2019}' | '`'))
        .collect();

    let tokens: Vec<&str> = stripped.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        // Models sometimes emit "-n <namespace>" literally; drop the pair.
        if tokens[index] == "-n"
            && let Some(next) = tokens.get(index + 1)
            && is_placeholder(next)
        {
            index += 2;
            continue;
        }
        kept.push(tokens[index]);
        index += 1;
    }

    kept.join(" ")
}

fn is_placeholder(token: &str) -> bool {
    token.starts_with('<') || token.starts_with('[') || token.starts_with('{') || token == "namespace"
}
