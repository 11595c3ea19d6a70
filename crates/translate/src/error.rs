use thiserror::Error;

/// Reasons a search request could not be turned into a [`Filter`](crate::Filter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A required query parameter was absent or blank.
    #[error("missing query parameter `{0}`")]
    MissingParameter(&'static str),
    /// Field names must be non-empty and must not start with `$`.
    #[error("invalid field name `{0}`")]
    InvalidField(String),
    /// The value for an exact match is not a finite number.
    #[error("invalid value format: `{0}` is not a number")]
    InvalidValueFormat(String),
    /// The pattern does not compile or exceeds the complexity bound.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    /// A passthrough body is not a usable filter.
    #[error("invalid query format: {0}")]
    MalformedFilter(String),
    /// The inference call failed or produced an unusable pattern.
    #[error("inference unavailable: {0}")]
    InferenceUnavailable(String),
}

impl TranslateError {
    /// `true` when the request itself is at fault (HTTP 400 territory).
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, TranslateError::InferenceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_exclude_inference() {
        assert!(TranslateError::MissingParameter("key").is_caller_error());
        assert!(TranslateError::InvalidValueFormat("abc".into()).is_caller_error());
        assert!(TranslateError::InvalidPattern("(".into()).is_caller_error());
        assert!(TranslateError::MalformedFilter("[]".into()).is_caller_error());
        assert!(!TranslateError::InferenceUnavailable("timeout".into()).is_caller_error());
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = TranslateError::InvalidValueFormat("12abc".into());
        assert_eq!(err.to_string(), "invalid value format: `12abc` is not a number");
        assert_eq!(
            TranslateError::MissingParameter("value").to_string(),
            "missing query parameter `value`"
        );
    }
}
