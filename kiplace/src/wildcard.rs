//! Shell-style wildcard matching over reference designators.
//!
//! `*` matches any run of characters (including none), `?` matches exactly
//! one character, everything else is literal. Patterns are anchored to the
//! whole name and case-sensitive.

use regex::Regex;

use crate::core::KiplaceError;

/// A compiled wildcard pattern.
#[derive(Debug, Clone)]
pub struct Wildcard {
    regex: Regex,
}

impl Wildcard {
    /// Compile `pattern`. Only fails when the expression outgrows the regex
    /// size limit.
    pub fn new(pattern: &str) -> Result<Self, KiplaceError> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        let mut literal = String::new();
        for ch in pattern.chars() {
            match ch {
                '*' | '?' => {
                    expr.push_str(&regex::escape(&literal));
                    literal.clear();
                    expr.push_str(if ch == '*' { "(?s:.*)" } else { "(?s:.)" });
                }
                _ => literal.push(ch),
            }
        }
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| KiplaceError::InvalidValue(format!("pattern '{}': {}", pattern, e)))?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Names from `names` matching this pattern, in input order.
    pub fn filter<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.is_match(n))
            .map(|n| n.to_string())
            .collect()
    }
}

/// Convenience wrapper: compile `pattern` and filter `names`.
pub fn expand<S: AsRef<str>>(pattern: &str, names: &[S]) -> Result<Vec<String>, KiplaceError> {
    Ok(Wildcard::new(pattern)?.filter(names))
}
