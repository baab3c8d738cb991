use crate::core::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// One line of `cscope -L` output: `file function line text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// File as reported by cscope, usually relative to the project root
    pub source_file: String,
    /// Enclosing function, or `<global>` / `<unknown>`
    pub symbol: String,
    /// 0-based line number (cscope reports 1-based)
    pub line_number: usize,
    /// Rest of the line, verbatim
    pub matched_text: String,
    pub raw_line: String,
}

fn record_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)\s+(.*)$").expect("record pattern is valid")
    })
}

impl QueryRecord {
    /// Parse one output line
    pub fn parse(line: &str) -> Result<Self> {
        let caps = record_pattern()
            .captures(line)
            .ok_or_else(|| malformed(line, "expected four fields"))?;

        let line_number = caps[3]
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| malformed(line, "line number is not a positive integer"))?;

        Ok(Self {
            source_file: caps[1].to_string(),
            symbol: caps[2].to_string(),
            line_number: line_number - 1,
            matched_text: caps[4].to_string(),
            raw_line: line.to_string(),
        })
    }
}

fn malformed(line: &str, reason: &str) -> Error {
    Error::MalformedRecord {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition_line() {
        let record = QueryRecord::parse("foo.c main 10 int main() {").unwrap();
        assert_eq!(record.source_file, "foo.c");
        assert_eq!(record.symbol, "main");
        assert_eq!(record.line_number, 9);
        assert_eq!(record.matched_text, "int main() {");
        assert_eq!(record.raw_line, "foo.c main 10 int main() {");
    }

    #[test]
    fn test_rest_of_line_keeps_inner_spacing() {
        let record = QueryRecord::parse("src/a.c  <global>  3   x  =  y;  ").unwrap();
        assert_eq!(record.symbol, "<global>");
        assert_eq!(record.line_number, 2);
        assert_eq!(record.matched_text, "x  =  y;  ");
    }

    #[test]
    fn test_first_line_maps_to_zero() {
        let record = QueryRecord::parse("a.h <global> 1 #pragma once").unwrap();
        assert_eq!(record.line_number, 0);
    }

    #[test]
    fn test_too_few_fields() {
        assert!(matches!(
            QueryRecord::parse("foo.c main"),
            Err(Error::MalformedRecord { .. })
        ));
        assert!(QueryRecord::parse("").is_err());
    }

    #[test]
    fn test_bad_line_numbers() {
        assert!(QueryRecord::parse("foo.c main ten int main() {").is_err());
        assert!(QueryRecord::parse("foo.c main 0 int main() {").is_err());
        assert!(QueryRecord::parse("foo.c main -4 int main() {").is_err());
    }
}
