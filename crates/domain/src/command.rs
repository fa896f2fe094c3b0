//! Command request parsing.
//!
//! Turns an untrusted command string into a structured, immutable
//! `ParsedCommand`. Parsing is deterministic and performs no policy checks;
//! those live in the security policy module.

use chrono::{DateTime, Utc};
use kubegate_core::{AppError, AppResult, CallerIdentity};

/// Literal program name every accepted command must start with.
pub const PROGRAM_NAME: &str = "kubectl";

/// Namespace used when a command names none.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Sentinel namespace value meaning "all namespaces".
pub const ALL_NAMESPACES: &str = "";

/// Upper bound on accepted command text length.
pub const MAX_COMMAND_LENGTH: usize = 500;

/// A submitted command together with its attribution. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Raw command text as submitted.
    pub text: String,
    /// Upstream-established caller identity.
    pub identity: CallerIdentity,
    /// Whether the caller asked for validation without execution.
    pub dry_run: bool,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

impl CommandRequest {
    /// Creates a command request stamped with the current time.
    #[must_use]
    pub fn new(text: impl Into<String>, identity: CallerIdentity, dry_run: bool) -> Self {
        Self {
            text: text.into(),
            identity,
            dry_run,
            submitted_at: Utc::now(),
        }
    }
}

/// Structured form of a command, derived deterministically from the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lowercased verb token (second token).
    pub verb: String,
    /// Resource kind (third token, with any embedded `/name` stripped).
    pub resource: String,
    /// Resource name, from the embedded `kind/name` form or a trailing token.
    pub resource_name: Option<String>,
    /// Target namespace; [`ALL_NAMESPACES`] when `-A`/`--all-namespaces` was given.
    pub namespace: String,
    /// Dash-prefixed tokens retained verbatim, in order, for downstream use.
    pub flags: Vec<String>,
}

impl ParsedCommand {
    /// Returns true when the command targets every namespace.
    #[must_use]
    pub fn all_namespaces(&self) -> bool {
        self.namespace == ALL_NAMESPACES
    }
}

/// Parses a raw command string into a [`ParsedCommand`].
///
/// Requires the literal program name as the first token and at least three
/// tokens total. `-n <ns>` selects a namespace; `-A`/`--all-namespaces`
/// overrides it with the all-namespaces sentinel.
pub fn parse_command(text: &str) -> AppResult<ParsedCommand> {
    if text.len() > MAX_COMMAND_LENGTH {
        return Err(AppError::Validation(format!(
            "command exceeds {MAX_COMMAND_LENGTH} characters"
        )));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 || tokens[0] != PROGRAM_NAME {
        return Err(AppError::Validation(
            "invalid kubectl command syntax".to_owned(),
        ));
    }

    let verb = tokens[1].to_lowercase();
    let (resource, mut resource_name) = split_resource_token(tokens[2]);

    let mut namespace = DEFAULT_NAMESPACE.to_owned();
    let mut all_namespaces = false;

    for (index, token) in tokens.iter().enumerate() {
        if *token == "-n"
            && let Some(value) = tokens.get(index + 1)
        {
            namespace = (*value).to_owned();
        }
        if *token == "-A" || *token == "--all-namespaces" {
            all_namespaces = true;
        }
        if resource_name.is_none()
            && (*token == resource || token.starts_with(&format!("{resource}/")))
        {
            if let Some((_, embedded)) = token.split_once('/') {
                if !embedded.is_empty() {
                    resource_name = Some(embedded.to_owned());
                }
            } else if let Some(candidate) = tokens.get(index + 1)
                && !candidate.starts_with('-')
            {
                resource_name = Some((*candidate).to_owned());
            }
        }
    }

    if all_namespaces {
        namespace = ALL_NAMESPACES.to_owned();
    }

    let flags = tokens
        .iter()
        .skip(3)
        .filter(|token| token.starts_with('-'))
        .map(|token| (*token).to_owned())
        .collect();

    Ok(ParsedCommand {
        verb,
        resource,
        resource_name,
        namespace,
        flags,
    })
}

fn split_resource_token(token: &str) -> (String, Option<String>) {
    match token.split_once('/') {
        Some((kind, name)) if !kind.is_empty() && !name.is_empty() => {
            (kind.to_owned(), Some(name.to_owned()))
        }
        _ => (token.to_owned(), None),
    }
}
