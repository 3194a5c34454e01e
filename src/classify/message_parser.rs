use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// `Class: message` at the very start of the text. `.` stops at the first
/// line break, so only the first line contributes to the message.
const ERROR_PATTERN: &str = r"^(?<class>\S+):\s*(?<message>.*)";

static ERROR_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn error_regex() -> Option<&'static Regex> {
    ERROR_REGEX
        .get_or_init(|| match Regex::new(ERROR_PATTERN) {
            Ok(regex) => Some(regex),
            Err(e) => {
                warn!("Error class pattern failed to compile, passing messages through: {}", e);
                None
            }
        })
        .as_ref()
}

/// Error class and message extracted from unstructured log text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedError {
    pub error_class: String,
    pub error_message: Option<String>,
}

/// Split a raw log message into an error class and message
///
/// Text of the form `SomeError: what happened` yields the leading token as
/// the class and the trimmed remainder as the message. Anything else is
/// passed through whole as the class with no message. This never fails.
pub fn parse_message(raw: &str) -> ParsedError {
    let captures = error_regex().and_then(|regex| regex.captures(raw));

    match captures {
        Some(caps) => ParsedError {
            error_class: caps
                .name("class")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            error_message: Some(
                caps.name("message")
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            ),
        },
        None => ParsedError {
            error_class: raw.to_string(),
            error_message: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn parsed(class: &str, message: Option<&str>) -> ParsedError {
        ParsedError {
            error_class: class.to_string(),
            error_message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_exception_style_message() {
        assert_eq!(
            parse_message("NullReferenceException: Object reference not set"),
            parsed("NullReferenceException", Some("Object reference not set"))
        );
    }

    #[test]
    fn test_message_is_trimmed() {
        assert_eq!(
            parse_message("IOError:    disk full   "),
            parsed("IOError", Some("disk full"))
        );
    }

    #[test]
    fn test_empty_remainder_yields_empty_message() {
        assert_eq!(parse_message("Timeout:"), parsed("Timeout", Some("")));
    }

    #[test]
    fn test_leading_whitespace_is_passed_through() {
        let raw = "  leading space: msg  ";
        assert_eq!(parse_message(raw), parsed(raw, None));
    }

    #[test]
    fn test_space_before_colon_is_passed_through() {
        let raw = "leading space: msg";
        assert_eq!(parse_message(raw), parsed(raw, None));
    }

    #[test]
    fn test_class_takes_last_colon_of_first_token() {
        // \S+ is greedy, so it backtracks only as far as the last colon that
        // still leaves a colon to match
        assert_eq!(
            parse_message("System.IO::Failure: gone"),
            parsed("System.IO::Failure", Some("gone"))
        );
        assert_eq!(parse_message("a:b:c d"), parsed("a:b", Some("c d")));
    }

    #[test]
    fn test_only_first_line_feeds_the_message() {
        assert_eq!(
            parse_message("ArgumentException: bad value\n  at Foo.Bar()"),
            parsed("ArgumentException", Some("bad value"))
        );
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(parse_message(""), parsed("", None));
    }

    #[quickcheck]
    fn prop_colon_free_text_is_passed_through(raw: String) -> bool {
        let raw = raw.replace(':', "");
        parse_message(&raw) == parsed(&raw, None)
    }

    #[quickcheck]
    fn prop_parser_tolerates_arbitrary_text(raw: String) -> bool {
        let result = parse_message(&raw);
        match result.error_message {
            // On a match the class is a prefix of the input
            Some(_) => raw.starts_with(&result.error_class) && !result.error_class.is_empty(),
            None => result.error_class == raw,
        }
    }
}
