use crate::errors::ParserError;
use crate::model::{LoggerHeader, LoggerRecord, ParsedLoggerFile, SensorId};
use crate::registry::LoggerParser;

use super::schema::{
    ANTARES_RECORD_SCHEMA, BANNER_WIDTH, DAY, HOUR, IDENTIFIER_END, IDENTIFIER_LINE,
    IDENTIFIER_START, LAST_HEADER_LINE, MINUTE, MONTH, RAW_COUNT, RECORD_WIDTH, RESISTANCE,
    SECOND, TEMPERATURE, YEAR,
};
use super::{
    parse_header_datetime, parse_header_number, slice_columns, split_header_entry,
    strip_line_ending, DecodedLine,
};

/// Parser for the text export of ANTARES miniature temperature loggers.
pub struct AntaresParser;

impl Default for AntaresParser {
    fn default() -> Self {
        Self
    }
}

impl AntaresParser {
    const NAME: &'static str = "ANTARES";

    fn validate_banner(content: &str) -> Result<(), ParserError> {
        let bytes = content.as_bytes();
        let line_end = bytes.get(BANNER_WIDTH..).unwrap_or_default();
        let banner_ok = bytes.len() > BANNER_WIDTH
            && bytes[..BANNER_WIDTH].iter().all(|b| *b == b'#')
            && (line_end.starts_with(b"\n") || line_end.starts_with(b"\r\n"));
        if banner_ok {
            Ok(())
        } else {
            Err(ParserError::FormatMismatch {
                parser: Self::NAME,
                reason: format!(
                    "first line is not a banner of {BANNER_WIDTH} '#' characters followed by a newline"
                ),
            })
        }
    }

    fn extract_sensor_id(line: &str, line_index: usize) -> Result<SensorId, ParserError> {
        let raw = slice_columns(line, IDENTIFIER_START, IDENTIFIER_END).ok_or_else(|| {
            ParserError::InvalidHeader {
                parser: Self::NAME,
                line_index,
                message: "logger identifier is not valid text".to_string(),
            }
        })?;
        Ok(SensorId::new(raw))
    }

    fn apply_header_entry(header: &mut LoggerHeader, key: &str, value: &str) {
        let normalized: String = key
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        let text = (!value.is_empty()).then(|| value.to_string());

        match normalized.as_str() {
            "loggeridentifier" => header.logger_identifier = text,
            "comment" => header.comment = text,
            "pctime" => header.pc_time = parse_header_datetime(value),
            "loggertime" => header.logger_time = parse_header_datetime(value),
            "startbatteryvoltage" => header.start_battery_mv = parse_header_number(value),
            "endbatteryvoltage" => header.end_battery_mv = parse_header_number(value),
            "totalsamplecount" => {
                header.total_sample_count = value
                    .split_whitespace()
                    .next()
                    .and_then(|v| v.parse::<u64>().ok())
            }
            "resistanceoffset" => header.resistance_offset = parse_header_number(value),
            "resistancescale" => header.resistance_scale = parse_header_number(value),
            "temperatureoffset" => header.temperature_offset = parse_header_number(value),
            "temperaturelinear" => header.temperature_linear = parse_header_number(value),
            "temperaturecubic" => header.temperature_cubic = parse_header_number(value),
            _ => {}
        }
    }

    fn record_from_line(decoded: &DecodedLine) -> Result<LoggerRecord, ParserError> {
        let line_index = decoded.line_index();
        let narrow = |column: &str| -> Result<u32, ParserError> {
            let value = decoded.integer(Self::NAME, column)?;
            u32::try_from(value).map_err(|_| ParserError::DataRow {
                parser: Self::NAME,
                line_index,
                message: format!("column '{column}' out of range: {value}"),
            })
        };

        let year = decoded.integer(Self::NAME, YEAR)?;
        let year = i32::try_from(year).map_err(|_| ParserError::DataRow {
            parser: Self::NAME,
            line_index,
            message: format!("column '{YEAR}' out of range: {year}"),
        })?;

        Ok(LoggerRecord {
            year,
            month: narrow(MONTH)?,
            day: narrow(DAY)?,
            hour: narrow(HOUR)?,
            minute: narrow(MINUTE)?,
            second: narrow(SECOND)?,
            raw_count: decoded.decimal(Self::NAME, RAW_COUNT)?,
            resistance_ohm: decoded.decimal(Self::NAME, RESISTANCE)?,
            temperature_c: decoded.decimal(Self::NAME, TEMPERATURE)?,
        })
    }
}

impl LoggerParser for AntaresParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedLoggerFile, ParserError> {
        Self::validate_banner(content)?;

        // The export tool sizes its read loop from the stream length; short
        // header lines make this an upper bound that only bites on tiny files.
        let max_lines = content.len() / RECORD_WIDTH;

        let mut header = LoggerHeader::default();
        let mut sensor_id: Option<SensorId> = None;
        let mut records = Vec::with_capacity(max_lines.saturating_sub(LAST_HEADER_LINE + 1));

        for (line_index, raw_line) in content.split_inclusive('\n').take(max_lines).enumerate() {
            let line = strip_line_ending(raw_line);

            if line_index == IDENTIFIER_LINE {
                sensor_id = Some(Self::extract_sensor_id(line, line_index)?);
            }

            if line_index <= LAST_HEADER_LINE {
                if let Some((key, value)) = split_header_entry(line) {
                    Self::apply_header_entry(&mut header, key, value);
                }
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            let decoded = ANTARES_RECORD_SCHEMA.decode(Self::NAME, line, line_index)?;
            records.push(Self::record_from_line(&decoded)?);
        }

        let sensor_id = sensor_id.ok_or(ParserError::InvalidHeader {
            parser: Self::NAME,
            line_index: IDENTIFIER_LINE,
            message: "file ended before the logger identifier line".to_string(),
        })?;

        if records.is_empty() {
            return Err(ParserError::EmptyData { parser: Self::NAME });
        }

        Ok(ParsedLoggerFile {
            parser: Self::NAME,
            sensor_id,
            header,
            records,
        })
    }
}
