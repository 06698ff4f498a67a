pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::{ParserAttempt, ParserError};
pub use formats::{DecodedLine, FieldKind, FieldValue, FixedWidthField, FixedWidthSchema};
pub use model::{LoggerHeader, LoggerRecord, ParsedLoggerFile, SensorId};
pub use registry::{parse_logger_file, LoggerParser, ParserRegistry};
