use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ParserAttempt {
    pub parser: &'static str,
    pub message: String,
}

impl ParserAttempt {
    pub fn new(parser: &'static str, message: impl Into<String>) -> Self {
        Self {
            parser,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParserAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parser, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} format mismatch: {reason}")]
    FormatMismatch {
        parser: &'static str,
        reason: String,
    },

    #[error("{parser} header line {line_index} invalid: {message}")]
    InvalidHeader {
        parser: &'static str,
        line_index: usize,
        message: String,
    },

    #[error("{parser} data line {line_index} invalid: {message}")]
    DataRow {
        parser: &'static str,
        line_index: usize,
        message: String,
    },

    #[error("{parser} file did not contain any data lines")]
    EmptyData { parser: &'static str },

    /// No registered parser recognised the stream as logger output.
    #[error("not a recognized temperature logger file; attempts: {attempts:?}")]
    InvalidFormat { attempts: Vec<ParserAttempt> },
}
