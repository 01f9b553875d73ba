//! Error types for the structural parser.

/// Reasons a candidate is not well-formed enough to model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: u32 },

    #[error("unterminated block comment starting at line {line}")]
    UnterminatedComment { line: u32 },

    #[error("unclosed '{delimiter}' opened at line {line}")]
    Unclosed { delimiter: char, line: u32 },

    #[error("unexpected '{found}' at line {line}")]
    UnexpectedCloser { found: char, line: u32 },

    #[error("mismatched '{found}' at line {line}, expected '{expected}'")]
    Mismatched {
        expected: char,
        found: char,
        line: u32,
    },

    #[error("source is empty")]
    Empty,
}

impl ParseError {
    /// Line the error points at, when there is one.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::UnterminatedString { line }
            | Self::UnterminatedComment { line }
            | Self::Unclosed { line, .. }
            | Self::UnexpectedCloser { line, .. }
            | Self::Mismatched { line, .. } => Some(*line),
            Self::Empty => None,
        }
    }
}
