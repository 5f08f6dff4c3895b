//! Table name patterns

use std::fmt;

use regex::Regex;

use crate::shell::{ShellError, ShellResult};

/// A table name pattern.
///
/// A literal must match the whole name; a compiled expression is used as
/// given.
#[derive(Debug, Clone)]
pub enum TablePattern {
    Literal(String),
    Compiled(Regex),
}

impl TablePattern {
    /// Expression used for matching. An invalid literal is a validation
    /// failure.
    pub fn regex(&self) -> ShellResult<Regex> {
        match self {
            TablePattern::Literal(pattern) => Regex::new(&format!("^(?:{})$", pattern))
                .map_err(|e| {
                    ShellError::validation(format!("Invalid table pattern '{}': {}", pattern, e))
                }),
            TablePattern::Compiled(regex) => Ok(regex.clone()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TablePattern::Literal(pattern) => pattern,
            TablePattern::Compiled(regex) => regex.as_str(),
        }
    }

    /// Names from `names` that match, in their original order.
    pub fn filter<I>(&self, names: I) -> ShellResult<Vec<String>>
    where
        I: IntoIterator<Item = String>,
    {
        let regex = self.regex()?;
        Ok(names.into_iter().filter(|n| regex.is_match(n)).collect())
    }
}

impl From<&str> for TablePattern {
    fn from(pattern: &str) -> Self {
        TablePattern::Literal(pattern.to_string())
    }
}

impl From<String> for TablePattern {
    fn from(pattern: String) -> Self {
        TablePattern::Literal(pattern)
    }
}

impl From<Regex> for TablePattern {
    fn from(regex: Regex) -> Self {
        TablePattern::Compiled(regex)
    }
}

impl fmt::Display for TablePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["t1", "t10", "xt1", "ns:t1"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_literal_is_anchored() {
        let matched = TablePattern::from("t1").filter(names()).unwrap();
        assert_eq!(matched, vec!["t1"]);

        let matched = TablePattern::from("t.*").filter(names()).unwrap();
        assert_eq!(matched, vec!["t1", "t10"]);
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let matched = TablePattern::from("t1|xt1").filter(names()).unwrap();
        assert_eq!(matched, vec!["t1", "xt1"]);
    }

    #[test]
    fn test_compiled_used_as_is() {
        let matched = TablePattern::from(Regex::new("t1").unwrap())
            .filter(names())
            .unwrap();
        assert_eq!(matched, vec!["t1", "t10", "xt1", "ns:t1"]);
    }

    #[test]
    fn test_invalid_literal() {
        assert!(TablePattern::from("t(").regex().is_err());
    }
}
