use serde::{Deserialize, Serialize};

/// Upstream-established identity of the caller submitting a command.
///
/// Either an authenticated user id or, absent one, the peer address. Used for
/// rate limiting and audit attribution; never derived from command text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Creates an identity from an authenticated user id or peer address.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<CallerIdentity> for String {
    fn from(value: CallerIdentity) -> Self {
        value.0
    }
}
