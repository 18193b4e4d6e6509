//! CredentialStatus - Resolved credential validity
//!
//! Resolved once at configuration-load time and consumed by value, so the
//! rest of the pipeline never re-runs string comparisons on raw
//! environment values.
//!
//! Placeholder detection is a best-effort heuristic (known placeholder
//! strings, very short values, values containing "test"), not a verified
//! contract: a key that passes may still be rejected upstream.

/// Validity of a configured credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Present(String),
    Missing,
    Placeholder,
}

/// Exact values commonly left behind by setup templates.
const KNOWN_PLACEHOLDERS: &[&str] = &[
    "your-api-key",
    "your-api-key-here",
    "your_api_key_here",
    "changeme",
    "placeholder",
    "none",
    "null",
    "sk-xxx",
];

impl CredentialStatus {
    /// Classify a raw environment value.
    pub fn resolve(value: Option<&str>) -> Self {
        let value = match value {
            Some(v) => v.trim(),
            None => return CredentialStatus::Missing,
        };

        if value.is_empty() {
            return CredentialStatus::Missing;
        }

        let lowered = value.to_lowercase();
        if KNOWN_PLACEHOLDERS.contains(&lowered.as_str())
            || lowered.starts_with("your-")
            || lowered.contains("test")
            || value.len() < 20
        {
            return CredentialStatus::Placeholder;
        }

        CredentialStatus::Present(value.to_string())
    }

    /// Whether the credential can be sent to a real provider.
    pub fn is_usable(&self) -> bool {
        matches!(self, CredentialStatus::Present(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            CredentialStatus::Present(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing() {
        assert_eq!(CredentialStatus::resolve(None), CredentialStatus::Missing);
        assert_eq!(
            CredentialStatus::resolve(Some("   ")),
            CredentialStatus::Missing
        );
    }

    #[test]
    fn test_known_placeholders() {
        assert_eq!(
            CredentialStatus::resolve(Some("your-api-key-here")),
            CredentialStatus::Placeholder
        );
        assert_eq!(
            CredentialStatus::resolve(Some("changeme")),
            CredentialStatus::Placeholder
        );
    }

    #[test]
    fn test_short_and_test_values_are_placeholders() {
        assert_eq!(
            CredentialStatus::resolve(Some("abc123")),
            CredentialStatus::Placeholder
        );
        assert_eq!(
            CredentialStatus::resolve(Some("sk-test-aaaaaaaaaaaaaaaaaaaaaaaa")),
            CredentialStatus::Placeholder
        );
    }

    #[test]
    fn test_plausible_key_is_present() {
        let status = CredentialStatus::resolve(Some("sk-proj-4f9a8b7c6d5e4f3a2b1c0d9e8f7a"));
        assert!(status.is_usable());
        assert_eq!(
            status.value(),
            Some("sk-proj-4f9a8b7c6d5e4f3a2b1c0d9e8f7a")
        );
    }
}
