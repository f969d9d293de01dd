use serde::{Deserialize, Serialize};

/// A template syntax error. Fatal for the template it was raised on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{line}:{column}: {reason}")]
pub struct ParseError {
    /// Byte offset into the template source.
    pub offset: usize,
    /// 1-based line of `offset`.
    pub line: u32,
    /// 1-based column (in characters) of `offset`.
    pub column: u32,
    pub reason: String,
}

impl ParseError {
    /// Build an error at `offset`, computing line and column from `src`.
    pub fn at(src: &str, offset: usize, reason: impl Into<String>) -> Self {
        let offset = offset.min(src.len());
        let mut line = 1u32;
        let mut column = 1u32;
        for (i, c) in src.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        ParseError {
            offset,
            line,
            column,
            reason: reason.into(),
        }
    }

    /// Serialize for CLI output. Always includes every field.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "column": self.column,
            "line":   self.line,
            "offset": self.offset,
            "reason": self.reason,
        })
    }
}
