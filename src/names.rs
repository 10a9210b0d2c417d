//! Player name cleaning and validation
//!
//! Names are the human-facing identity of a player slot, so they are trimmed
//! before use and checked for length and content. Uniqueness is the roster's
//! business, see [`crate::player::Roster`].

use rustrict::CensorStr;
use serde::Serialize;
use thiserror::Error;

/// Reasons a requested player name is refused
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The name is empty or contains only whitespace
    #[error("name cannot be empty")]
    Empty,
    /// The name exceeds the configured maximum length
    #[error("name is too long")]
    TooLong,
    /// The name contains inappropriate content
    #[error("name is inappropriate")]
    Inappropriate,
}

/// Rules applied to a name before it is added to a roster
#[derive(Debug, Clone, Copy)]
pub struct NameRules {
    /// Maximum length in bytes after trimming
    pub max_length: usize,
    /// Whether to run the profanity filter
    pub filter: bool,
}

impl NameRules {
    /// Trims and validates a requested name
    ///
    /// # Errors
    ///
    /// * `Error::Empty` - Name is empty after trimming whitespace
    /// * `Error::TooLong` - Name exceeds `max_length` bytes
    /// * `Error::Inappropriate` - Name is flagged by the content filter
    pub fn clean(&self, name: &str) -> Result<String, Error> {
        let name = trim(name);
        if name.is_empty() {
            return Err(Error::Empty);
        }
        if name.len() > self.max_length {
            return Err(Error::TooLong);
        }
        if self.filter && name.is_inappropriate() {
            return Err(Error::Inappropriate);
        }
        Ok(name.to_owned())
    }
}

/// Trims surrounding whitespace the same way [`NameRules::clean`] does
///
/// Lookups by name go through this so that " Al " finds "Al".
pub fn trim(name: &str) -> &str {
    rustrict::trim_whitespace(name)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn rules() -> NameRules {
        NameRules {
            max_length: 30,
            filter: true,
        }
    }

    #[test]
    fn test_clean_accepts_plain_name() {
        assert_eq!(rules().clean("Al"), Ok("Al".to_string()));
    }

    #[test]
    fn test_clean_trims_whitespace() {
        assert_eq!(rules().clean("  Bo  "), Ok("Bo".to_string()));
        assert_eq!(trim("\tBo\n"), "Bo");
    }

    #[test]
    fn test_clean_empty_name() {
        assert_eq!(rules().clean(""), Err(Error::Empty));
        assert_eq!(rules().clean("   "), Err(Error::Empty));
        assert_eq!(rules().clean("\t\n"), Err(Error::Empty));
    }

    #[test]
    fn test_clean_length_limit() {
        assert_eq!(rules().clean(&"a".repeat(31)), Err(Error::TooLong));
        assert_eq!(rules().clean(&"a".repeat(30)), Ok("a".repeat(30)));
    }

    #[test]
    fn test_clean_inappropriate_content() {
        for name in ["fuck", "shit"] {
            assert_eq!(
                rules().clean(name),
                Err(Error::Inappropriate),
                "Expected '{name}' to be flagged as inappropriate"
            );
        }
    }

    #[test]
    fn test_clean_filter_disabled() {
        let lenient = NameRules {
            max_length: 30,
            filter: false,
        };
        assert_eq!(lenient.clean("shit"), Ok("shit".to_string()));
    }

    #[test]
    fn test_clean_unicode_name() {
        let unicode_name = "Плеер测试";
        assert_eq!(rules().clean(unicode_name), Ok(unicode_name.to_string()));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Empty.to_string(), "name cannot be empty");
        assert_eq!(Error::TooLong.to_string(), "name is too long");
        assert_eq!(Error::Inappropriate.to_string(), "name is inappropriate");
    }
}
