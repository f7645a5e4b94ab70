//! Textual keyframe encoding for the collaborator serializer.
//!
//! Continuous keyframes use a stable whitespace-delimited layout:
//!
//! ```text
//! time in_value... out_value... in_tangent... out_tangent... interp_in interp_out
//! ```
//!
//! Value components expand in order (a Vec3 keyframe has 3 fields per value
//! slot), and the interpolation modes are the stable numeric codes from
//! [`Interp::code`]. Discrete keyframes encode as `time value`; a string
//! payload consumes the rest of the line.
//!
//! Malformed input is a hard [`FormatError`] propagated to the caller: a
//! silently zero-initialized keyframe would corrupt a curve invisibly.

use std::fmt::Write as _;

use thiserror::Error;

use crate::keyframe::{Interp, Keyframe, StepKeyframe};
use crate::value::{Interpolate, Quat};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("empty input")]
    Empty,
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("truncated input")]
    Truncated,
    #[error("invalid number {token:?}")]
    Number { token: String },
    #[error("invalid boolean {token:?}")]
    Bool { token: String },
    #[error("unknown interpolation code {0}")]
    InterpCode(u32),
}

fn parse_f32(token: &str) -> Result<f32, FormatError> {
    token.parse::<f32>().map_err(|_| FormatError::Number {
        token: token.to_string(),
    })
}

fn take<'a>(it: &mut impl Iterator<Item = &'a str>) -> Result<&'a str, FormatError> {
    it.next().ok_or(FormatError::Truncated)
}

fn parse_interp(token: &str) -> Result<Interp, FormatError> {
    let code = token.parse::<u32>().map_err(|_| FormatError::Number {
        token: token.to_string(),
    })?;
    Interp::from_code(code).ok_or(FormatError::InterpCode(code))
}

/// Per-type field-level encoding for the textual keyframe layout.
pub trait TextFields: Sized {
    /// Number of whitespace-delimited fields one value occupies.
    const FIELDS: usize;

    fn write_fields(&self, out: &mut String);

    fn read_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, FormatError>;
}

impl TextFields for f32 {
    const FIELDS: usize = 1;

    fn write_fields(&self, out: &mut String) {
        let _ = write!(out, "{self}");
    }

    fn read_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, FormatError> {
        parse_f32(take(fields)?)
    }
}

macro_rules! impl_text_fields_array {
    ($($n:literal),*) => {$(
        impl TextFields for [f32; $n] {
            const FIELDS: usize = $n;

            fn write_fields(&self, out: &mut String) {
                for (i, v) in self.iter().enumerate() {
                    if i > 0 {
                        out.push(' ');
                    }
                    let _ = write!(out, "{v}");
                }
            }

            fn read_fields<'a>(
                fields: &mut impl Iterator<Item = &'a str>,
            ) -> Result<Self, FormatError> {
                let mut value = [0.0f32; $n];
                for slot in value.iter_mut() {
                    *slot = parse_f32(take(fields)?)?;
                }
                Ok(value)
            }
        }
    )*};
}

impl_text_fields_array!(2, 3, 4, 16);

impl TextFields for Quat {
    const FIELDS: usize = 4;

    fn write_fields(&self, out: &mut String) {
        self.0.write_fields(out);
    }

    fn read_fields<'a>(fields: &mut impl Iterator<Item = &'a str>) -> Result<Self, FormatError> {
        Ok(Quat(<[f32; 4]>::read_fields(fields)?))
    }
}

impl<T: Interpolate + TextFields> Keyframe<T> {
    /// Total field count of the canonical layout for this value type.
    pub const TEXT_FIELDS: usize = 1 + 4 * T::FIELDS + 2;

    /// Encode to the canonical whitespace-delimited layout.
    pub fn write_to_string(&self) -> String {
        let mut s = String::new();
        let _ = write!(s, "{}", self.time);
        for v in [
            &self.in_value,
            &self.out_value,
            &self.in_tangent,
            &self.out_tangent,
        ] {
            s.push(' ');
            v.write_fields(&mut s);
        }
        let _ = write!(s, " {} {}", self.interp_in.code(), self.interp_out.code());
        s
    }

    /// Decode from the canonical layout.
    pub fn read_from_str(s: &str) -> Result<Self, FormatError> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.is_empty() {
            return Err(FormatError::Empty);
        }
        if fields.len() != Self::TEXT_FIELDS {
            return Err(FormatError::FieldCount {
                expected: Self::TEXT_FIELDS,
                found: fields.len(),
            });
        }
        let mut it = fields.into_iter();
        let time = parse_f32(take(&mut it)?)?;
        let in_value = T::read_fields(&mut it)?;
        let out_value = T::read_fields(&mut it)?;
        let in_tangent = T::read_fields(&mut it)?;
        let out_tangent = T::read_fields(&mut it)?;
        let interp_in = parse_interp(take(&mut it)?)?;
        let interp_out = parse_interp(take(&mut it)?)?;
        Ok(Self {
            time,
            in_value,
            out_value,
            in_tangent,
            out_tangent,
            interp_in,
            interp_out,
        })
    }
}

impl StepKeyframe<bool> {
    pub fn write_to_string(&self) -> String {
        format!("{} {}", self.time, self.value)
    }

    pub fn read_from_str(s: &str) -> Result<Self, FormatError> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.is_empty() {
            return Err(FormatError::Empty);
        }
        if fields.len() != 2 {
            return Err(FormatError::FieldCount {
                expected: 2,
                found: fields.len(),
            });
        }
        let time = parse_f32(fields[0])?;
        let value = fields[1].parse::<bool>().map_err(|_| FormatError::Bool {
            token: fields[1].to_string(),
        })?;
        Ok(Self { time, value })
    }
}

impl StepKeyframe<String> {
    pub fn write_to_string(&self) -> String {
        format!("{} {}", self.time, self.value)
    }

    /// The value is everything after the time token, so strings may contain
    /// spaces. A missing value decodes as the empty string.
    pub fn read_from_str(s: &str) -> Result<Self, FormatError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FormatError::Empty);
        }
        let (time_token, rest) = match s.split_once(char::is_whitespace) {
            Some((a, b)) => (a, b.trim_start()),
            None => (s, ""),
        };
        let time = parse_f32(time_token)?;
        Ok(Self {
            time,
            value: rest.to_string(),
        })
    }
}
