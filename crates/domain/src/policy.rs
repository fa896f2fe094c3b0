//! Security policy for parsed commands.
//!
//! Checks run in a fixed order and fail closed: the first failing check
//! produces the verdict. Only the allow-listed verbs ever pass; everything
//! else is denied by default.

use serde::{Deserialize, Serialize};

use crate::command::ParsedCommand;

/// Verbs permitted to reach the authorization and execution stages.
pub const ALLOWED_VERBS: &[&str] = &["get", "list", "describe", "logs", "scale"];

/// Destructive verbs rejected before the allow-list is even consulted.
pub const BLOCKED_VERBS: &[&str] = &["delete", "edit", "patch"];

/// Characters whose presence anywhere in the raw text denies the command.
const INJECTION_CHARACTERS: &[char] = &[';', '|', '&', '>', '<', '$'];

/// Why the security policy denied a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    /// Raw text contained a shell metacharacter.
    Injection,
    /// Verb is on the destructive block list.
    BlockedVerb,
    /// Verb is absent from the allow list.
    VerbNotAllowed,
    /// Resource name failed the identifier whitelist.
    ResourceNameNotWhitelisted,
}

impl DenialReason {
    /// Returns the stable reason code reported to callers and audit.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Injection => "injection",
            Self::BlockedVerb => "blocked-verb",
            Self::VerbNotAllowed => "verb-not-allowed",
            Self::ResourceNameNotWhitelisted => "resource-name-not-whitelisted",
        }
    }
}

/// A denial with its reason code and the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDenial {
    /// Stable reason code.
    pub reason: DenialReason,
    /// The token or character class that triggered the denial.
    pub token: String,
}

impl SecurityDenial {
    fn new(reason: DenialReason, token: impl Into<String>) -> Self {
        Self {
            reason,
            token: token.into(),
        }
    }
}

/// Outcome of the security policy. Produced once per request, never revised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityVerdict {
    /// Command may proceed to authorization.
    Allowed,
    /// Command is terminally rejected.
    Denied(SecurityDenial),
}

/// Validates a parsed command against the fail-closed security policy.
///
/// Check order matters: injection scan on the raw text, then the blocked-verb
/// list, then the verb allow-list, then the resource-name whitelist. The
/// blocked-verb check is independent of the allow-list so a verb can never be
/// both blocked and accidentally allowed by policy drift.
#[must_use]
pub fn validate_command(command: &ParsedCommand, raw: &str) -> SecurityVerdict {
    if let Some(character) = raw.chars().find(|c| INJECTION_CHARACTERS.contains(c)) {
        return SecurityVerdict::Denied(SecurityDenial::new(
            DenialReason::Injection,
            character.to_string(),
        ));
    }

    if BLOCKED_VERBS.contains(&command.verb.as_str()) {
        return SecurityVerdict::Denied(SecurityDenial::new(
            DenialReason::BlockedVerb,
            command.verb.clone(),
        ));
    }

    if !ALLOWED_VERBS.contains(&command.verb.as_str()) {
        return SecurityVerdict::Denied(SecurityDenial::new(
            DenialReason::VerbNotAllowed,
            command.verb.clone(),
        ));
    }

    if let Some(name) = command.resource_name.as_deref()
        && !is_whitelisted_resource_name(name)
    {
        return SecurityVerdict::Denied(SecurityDenial::new(
            DenialReason::ResourceNameNotWhitelisted,
            name,
        ));
    }

    SecurityVerdict::Allowed
}

/// Returns true when the name is a plain identifier: `^[A-Za-z0-9-]+$`.
///
/// Defends against names smuggling path traversal or shell metacharacters
/// past the identifier boundary.
#[must_use]
pub fn is_whitelisted_resource_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || character == '-')
}
