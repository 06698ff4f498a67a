use chrono::NaiveDateTime;

/// Byte slice `[start, end)` of `line`, clamped to its length the way a
/// short line yields a short (or empty) column. `None` when the range splits
/// a multi-byte character.
pub(crate) fn slice_columns(line: &str, start: usize, end: usize) -> Option<&str> {
    let end = end.min(line.len());
    let start = start.min(end);
    line.get(start..end)
}

pub(crate) fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(line)
}

/// Splits a `# Key   : value` header line. Keys never contain a colon, so the
/// first one is the separator even when the value is a clock time.
pub(crate) fn split_header_entry(line: &str) -> Option<(&str, &str)> {
    let body = line.trim_start_matches('#');
    let (key, value) = body.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Leading numeric token of a header value, ignoring a trailing unit such as `mV`.
pub(crate) fn parse_header_number(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse::<f64>().ok()
}

pub(crate) fn parse_header_datetime(value: &str) -> Option<NaiveDateTime> {
    static FORMATS: &[&str] = &["%d %B %Y , %H:%M:%S", "%d %B %Y, %H:%M:%S"];
    let trimmed = value.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}
