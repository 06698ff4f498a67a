mod antares;
mod common;
mod fixed_width;
pub(crate) mod schema;

pub use antares::AntaresParser;
pub use fixed_width::{DecodedLine, FieldKind, FieldValue, FixedWidthField, FixedWidthSchema};

pub(crate) use common::{
    parse_header_datetime, parse_header_number, slice_columns, split_header_entry,
    strip_line_ending,
};
