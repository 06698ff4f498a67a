use crate::errors::ParserError;

use super::slice_columns;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(value) => Some(*value),
            FieldValue::Decimal(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(value) => *value as f64,
            FieldValue::Decimal(value) => *value,
        }
    }
}

/// A named column occupying the byte range `[start, end)` of a line.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthField {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
    pub kind: FieldKind,
}

impl FixedWidthField {
    pub const fn new(name: &'static str, start: usize, end: usize, kind: FieldKind) -> Self {
        Self {
            name,
            start,
            end,
            kind,
        }
    }

    pub const fn width(&self) -> usize {
        self.end - self.start
    }

    fn decode(
        &self,
        parser: &'static str,
        line: &str,
        line_index: usize,
    ) -> Result<FieldValue, ParserError> {
        let raw = slice_columns(line, self.start, self.end).ok_or_else(|| ParserError::DataRow {
            parser,
            line_index,
            message: format!(
                "column '{}' [{}..{}) does not fall on character boundaries",
                self.name, self.start, self.end
            ),
        })?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParserError::DataRow {
                parser,
                line_index,
                message: format!("column '{}' is empty", self.name),
            });
        }

        match self.kind {
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|err| ParserError::DataRow {
                    parser,
                    line_index,
                    message: format!(
                        "failed to parse column '{}' as integer ('{trimmed}'): {err}",
                        self.name
                    ),
                }),
            FieldKind::Decimal => trimmed
                .parse::<f64>()
                .map(FieldValue::Decimal)
                .map_err(|err| ParserError::DataRow {
                    parser,
                    line_index,
                    message: format!(
                        "failed to parse column '{}' as decimal ('{trimmed}'): {err}",
                        self.name
                    ),
                }),
        }
    }
}

/// Declarative layout of a fixed-width record line.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthSchema {
    fields: &'static [FixedWidthField],
}

impl FixedWidthSchema {
    pub const fn new(fields: &'static [FixedWidthField]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FixedWidthField] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FixedWidthField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Smallest line length that covers every field.
    pub fn line_width(&self) -> usize {
        self.fields.iter().map(|field| field.end).max().unwrap_or(0)
    }

    pub fn decode(
        &self,
        parser: &'static str,
        line: &str,
        line_index: usize,
    ) -> Result<DecodedLine, ParserError> {
        let values = self
            .fields
            .iter()
            .map(|field| field.decode(parser, line, line_index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecodedLine {
            schema: *self,
            line_index,
            values,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DecodedLine {
    schema: FixedWidthSchema,
    line_index: usize,
    values: Vec<FieldValue>,
}

impl DecodedLine {
    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.schema
            .fields
            .iter()
            .position(|field| field.name == name)
            .map(|idx| self.values[idx])
    }

    pub fn integer(&self, parser: &'static str, name: &str) -> Result<i64, ParserError> {
        self.get(name)
            .and_then(|value| value.as_i64())
            .ok_or_else(|| ParserError::DataRow {
                parser,
                line_index: self.line_index,
                message: format!("schema has no integer column '{name}'"),
            })
    }

    pub fn decimal(&self, parser: &'static str, name: &str) -> Result<f64, ParserError> {
        self.get(name)
            .map(|value| value.as_f64())
            .ok_or_else(|| ParserError::DataRow {
                parser,
                line_index: self.line_index,
                message: format!("schema has no column '{name}'"),
            })
    }
}
