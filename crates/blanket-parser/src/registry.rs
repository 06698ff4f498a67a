use crate::errors::{ParserAttempt, ParserError};
use crate::formats::AntaresParser;
use crate::model::ParsedLoggerFile;

/// One logger export format. A parser that does not recognise a stream at all
/// must answer [`ParserError::FormatMismatch`] so the next format is tried;
/// any other error means the stream was recognised but is broken.
pub trait LoggerParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedLoggerFile, ParserError>;
}

/// Ordered list of known logger formats.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn LoggerParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(AntaresParser);
        registry
    }
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    pub fn register(&mut self, parser: impl LoggerParser + 'static) -> &mut Self {
        self.parsers.push(Box::new(parser));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|parser| parser.name()).collect()
    }

    /// First format that accepts the stream wins. When none does, every
    /// rejection reason is returned in [`ParserError::InvalidFormat`].
    pub fn parse(&self, content: &str) -> Result<ParsedLoggerFile, ParserError> {
        let mut attempts = Vec::with_capacity(self.parsers.len());

        for parser in &self.parsers {
            match parser.parse(content) {
                Err(ParserError::FormatMismatch { reason, .. }) => {
                    attempts.push(ParserAttempt::new(parser.name(), reason));
                }
                result => return result,
            }
        }

        Err(ParserError::InvalidFormat { attempts })
    }
}

/// Parses a logger export with every built-in format.
pub fn parse_logger_file(content: &str) -> Result<ParsedLoggerFile, ParserError> {
    ParserRegistry::default().parse(content)
}
