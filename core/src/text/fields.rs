use std::str::SplitWhitespace;

use crate::math::Vector3;
use crate::prelude::{PatternError, PatternResult};

/// Parses a floating-point literal with a fixed `.` decimal point.
pub fn parse_f64(text: &str, expected: &'static str) -> PatternResult<f64> {
    let trimmed = text.trim();
    trimmed.parse::<f64>().map_err(|_| PatternError::Data {
        line: None,
        text: trimmed.to_string(),
        expected,
    })
}

pub fn parse_usize(text: &str, expected: &'static str) -> PatternResult<usize> {
    let trimmed = text.trim();
    trimmed.parse::<usize>().map_err(|_| PatternError::Data {
        line: None,
        text: trimmed.to_string(),
        expected,
    })
}

/// Parses `x y z`.
pub fn parse_vector3(line: &str, what: &'static str) -> PatternResult<Vector3> {
    let mut fields = FieldReader::new(line);
    let x = fields.next_f64(what)?;
    let y = fields.next_f64(what)?;
    let z = fields.next_f64(what)?;
    Ok(Vector3::new(x, y, z))
}

/// Parses a whitespace-separated pair of counts, e.g. `73 37`.
pub fn parse_count_pair(line: &str, what: &'static str) -> PatternResult<(usize, usize)> {
    let mut fields = FieldReader::new(line);
    let first = parse_usize(fields.next_field(what)?, what)?;
    let second = parse_usize(fields.next_field(what)?, what)?;
    Ok((first, second))
}

/// Positional reader over the whitespace-separated fields of one line.
pub struct FieldReader<'a> {
    line: &'a str,
    fields: SplitWhitespace<'a>,
}

impl<'a> FieldReader<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            fields: line.split_whitespace(),
        }
    }

    /// Next raw field; a missing field means the line was truncated.
    pub fn next_field(&mut self, what: &'static str) -> PatternResult<&'a str> {
        self.fields.next().ok_or_else(|| {
            PatternError::missing(format!("truncated line {:?}: missing {what}", self.line))
        })
    }

    pub fn next_f64(&mut self, what: &'static str) -> PatternResult<f64> {
        parse_f64(self.next_field(what)?, what)
    }
}
