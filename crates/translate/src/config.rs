use serde::{Deserialize, Serialize};

/// Translation policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TranslateConfig {
    /// Longest accepted regex source, in characters.
    pub max_pattern_len: usize,
    /// When set, passthrough filters may only use these `$` operators
    /// (extended-JSON type wrappers such as `$oid` are always allowed).
    /// `None` accepts any operator.
    pub passthrough_operators: Option<Vec<String>>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            max_pattern_len: 256,
            passthrough_operators: None,
        }
    }
}

impl TranslateConfig {
    /// Restrict passthrough filters to `operators`.
    pub fn with_passthrough_operators<I, S>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passthrough_operators = Some(operators.into_iter().map(Into::into).collect());
        self
    }
}
