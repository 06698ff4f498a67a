use super::{FieldKind, FixedWidthField, FixedWidthSchema};

/// Width of the `#` banner that opens (and closes) the header block.
pub const BANNER_WIDTH: usize = 70;

/// Nominal byte width of one data line; the stream length divided by this
/// bounds how many lines are read.
pub const RECORD_WIDTH: usize = 54;

pub const IDENTIFIER_LINE: usize = 2;
pub const IDENTIFIER_START: usize = 24;
pub const IDENTIFIER_END: usize = 31;

/// Lines with an index above this one are data lines.
pub const LAST_HEADER_LINE: usize = 15;

pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const DAY: &str = "day";
pub const HOUR: &str = "hour";
pub const MINUTE: &str = "minute";
pub const SECOND: &str = "second";
pub const RAW_COUNT: &str = "raw_count";
pub const RESISTANCE: &str = "resistance_ohm";
pub const TEMPERATURE: &str = "temperature_c";

const ANTARES_FIELDS: &[FixedWidthField] = &[
    FixedWidthField::new(YEAR, 0, 4, FieldKind::Integer),
    FixedWidthField::new(MONTH, 5, 7, FieldKind::Integer),
    FixedWidthField::new(DAY, 8, 10, FieldKind::Integer),
    FixedWidthField::new(HOUR, 11, 13, FieldKind::Integer),
    FixedWidthField::new(MINUTE, 14, 16, FieldKind::Integer),
    FixedWidthField::new(SECOND, 17, 19, FieldKind::Integer),
    FixedWidthField::new(RAW_COUNT, 23, 28, FieldKind::Decimal),
    FixedWidthField::new(RESISTANCE, 32, 41, FieldKind::Decimal),
    FixedWidthField::new(TEMPERATURE, 48, 54, FieldKind::Decimal),
];

pub const ANTARES_RECORD_SCHEMA: FixedWidthSchema = FixedWidthSchema::new(ANTARES_FIELDS);
