//! Decorator configuration.

use serde::{Deserialize, Serialize};

/// Options fixed when an auto-closing stream is constructed and carried
/// unchanged to every stream derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCloseConfig {
    /// Permit `iterator()`/`spliterator()`, handing release of the
    /// resource to the caller
    pub allow_iterator_escape: bool,
}

impl AutoCloseConfig {
    /// Environment variable read by [`AutoCloseConfig::from_env`].
    pub const ESCAPE_ENV: &'static str = "FIELDSTREAM_ALLOW_ITERATOR_ESCAPE";

    /// The default configuration: raw cursors are refused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether raw cursors may escape.
    pub fn with_iterator_escape(mut self, allow: bool) -> Self {
        self.allow_iterator_escape = allow;
        self
    }

    /// Reads the escape flag from `FIELDSTREAM_ALLOW_ITERATOR_ESCAPE`.
    ///
    /// `true` (any case) and `1` enable it; anything else, or an unset
    /// variable, leaves it disabled. The environment is read only here.
    pub fn from_env() -> Self {
        let allow = std::env::var(Self::ESCAPE_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self::new().with_iterator_escape(allow)
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_refuses_escape() {
        assert!(!AutoCloseConfig::default().allow_iterator_escape);
        assert!(AutoCloseConfig::new().with_iterator_escape(true).allow_iterator_escape);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }
}
