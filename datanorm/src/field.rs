// datanorm - a writer for DATANORM catalog interchange files.
// Copyright (C) 2025 The datanorm authors.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Fields, the columns of a DATANORM record.
//!
//! A [FieldSpec] describes a field's constraints.  Building it yields a
//! [Field], which converts raw [Value]s into the text that appears in the
//! record, or rejects them with a [ValidationError].

use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};
use displaydoc::Display;
use thiserror::Error as ThisError;

/// A raw value supplied for a field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Integer(i64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    /// Returns true if this is an empty string.
    ///
    /// Integers and dates are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Text(text) if text.is_empty())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Date(_) => ValueType::Date,
            Value::Text(_) => ValueType::Text,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Integer(integer) => write!(f, "{integer}"),
            Value::Date(date) => write!(f, "{date}"),
            Value::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::Text(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value.date())
    }
}

impl<Tz> From<DateTime<Tz>> for Value
where
    Tz: TimeZone,
{
    fn from(value: DateTime<Tz>) -> Self {
        Self::Date(value.date_naive())
    }
}

/// The type of a [Value].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Date,
    Text,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            ValueType::Integer => "an integer",
            ValueType::Date => "a date",
            ValueType::Text => "text",
        })
    }
}

/// The kind of data in a field, which determines how it converts values to
/// text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Free text.  New-lines are written as spaces.
    Text,

    /// Decimal integer, zero-padded if the field has a fixed length.
    Integer,

    /// Always the given text.
    Static(String),

    /// Date as `DDMMYY`.
    ShortDate,

    /// Date as `YYYYMMDD`.
    LongDate,

    /// ISO 4217 currency code, such as `EUR`.  The code itself is not
    /// checked against ISO 4217.
    Currency,
}

impl Kind {
    /// Returns the type of value that fields of this kind accept.
    pub fn value_type(&self) -> ValueType {
        match self {
            Kind::Integer => ValueType::Integer,
            Kind::ShortDate | Kind::LongDate => ValueType::Date,
            Kind::Text | Kind::Static(_) | Kind::Currency => ValueType::Text,
        }
    }

    /// Returns the length that every field of this kind has, if any.
    pub fn implied_length(&self) -> Option<usize> {
        match self {
            Kind::Static(constant) => Some(constant.chars().count()),
            Kind::ShortDate => Some(6),
            Kind::LongDate => Some(8),
            Kind::Currency => Some(3),
            Kind::Text | Kind::Integer => None,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Kind::ShortDate | Kind::LongDate)
    }
}

/// An invalid field declaration.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Field name may not be empty.")]
    EmptyName,

    #[error("Field {field} has length {length} but max_length {max_length}.")]
    LengthConflict {
        field: String,
        length: usize,
        max_length: usize,
    },

    #[error("Field {field} always has length {implied}, so it may not be given length {length}.")]
    ImpliedLength {
        field: String,
        implied: usize,
        length: usize,
    },

    #[error("Field {field} accepts {expected}, so it can't permit value {value:?}.")]
    ValueTypeMismatch {
        field: String,
        value: String,
        expected: ValueType,
    },

    #[error("Row {row} declares field {field} more than once.")]
    DuplicateField { row: String, field: String },
}

/// A reason that a field rejected a value.
#[derive(Clone, Debug, Display, ThisError, PartialEq, Eq)]
pub enum ValidationError {
    /// Field must not be empty.
    Empty,

    /// Value {0} is not permitted.
    NotPermitted(String),

    /// Field with fixed length can't be empty.
    FixedLengthEmpty,

    /// Value {value:?} has length {actual} but the field requires length {expected}.
    LengthMismatch {
        value: String,
        expected: usize,
        actual: usize,
    },

    /// Value {value:?} has length {actual}, which exceeds maximum length {max_length}.
    TooLong {
        value: String,
        max_length: usize,
        actual: usize,
    },

    /// Number {value} is too large for maximum length {max_length}.
    IntegerTooLarge { value: i64, max_length: usize },

    /// Value {actual:?} does not match constant {expected:?}.
    ConstantMismatch { expected: String, actual: String },

    /// A date is required.
    DateRequired,

    /// Value {value:?} can't be converted because the field expects {expected}.
    WrongType { value: String, expected: ValueType },
}

/// A value rejected by a particular field.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
#[error("Field {number} ({label}): {details}")]
pub struct FieldError {
    /// The field's label.
    pub label: String,

    /// The field's 1-based position in its row.
    pub number: usize,

    pub details: ValidationError,
}

/// A declaration of a field, used to build a [Field].
#[derive(Clone, Debug)]
pub struct FieldSpec {
    name: String,
    label: Option<String>,
    kind: Kind,
    length: Option<usize>,
    max_length: Option<usize>,
    values: Option<Vec<Value>>,
    required: bool,
    blank: bool,
}

impl FieldSpec {
    /// Declares a field of the given `kind`, named `name`.
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            length: None,
            max_length: None,
            values: None,
            required: false,
            blank: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Integer)
    }

    /// Declares a field that always contains `constant`.
    pub fn constant(name: impl Into<String>, constant: impl Into<String>) -> Self {
        Self::new(name, Kind::Static(constant.into()))
    }

    pub fn short_date(name: impl Into<String>) -> Self {
        Self::new(name, Kind::ShortDate)
    }

    pub fn long_date(name: impl Into<String>) -> Self {
        Self::new(name, Kind::LongDate)
    }

    pub fn currency(name: impl Into<String>) -> Self {
        Self::new(name, Kind::Currency)
    }

    /// Returns `self` with the exact length, in characters, set to `length`.
    pub fn length(self, length: usize) -> Self {
        Self {
            length: Some(length),
            ..self
        }
    }

    /// Returns `self` with the maximum length, in characters, set to
    /// `max_length`.
    pub fn max_length(self, max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..self
        }
    }

    /// Returns `self` restricted to the given permitted values.
    pub fn values<I, T>(self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self {
            values: Some(values.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// Returns `self` with empty values rejected.
    pub fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Returns `self` with empty values written as empty fields, without
    /// further checks.
    pub fn allow_blank(self) -> Self {
        Self { blank: true, ..self }
    }

    /// Returns `self` with the label set to `label`.  Without a label, the
    /// label is derived from the name.
    pub fn label(self, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a stand-alone field, at the first position in its row.
    pub fn build(self) -> Result<Field, DefinitionError> {
        self.build_at(0)
    }

    pub(crate) fn build_at(self, ordinal: usize) -> Result<Field, DefinitionError> {
        if self.name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        let length = match (self.kind.implied_length(), self.length) {
            (Some(implied), Some(length)) if implied != length => {
                return Err(DefinitionError::ImpliedLength {
                    field: self.name,
                    implied,
                    length,
                });
            }
            (implied, length) => implied.or(length),
        };
        if let Some(length) = length
            && let Some(max_length) = self.max_length
            && length != max_length
        {
            return Err(DefinitionError::LengthConflict {
                field: self.name,
                length,
                max_length,
            });
        }

        let expected = self.kind.value_type();
        if let Some(mismatch) = self
            .values
            .iter()
            .flatten()
            .find(|value| value.value_type() != expected)
        {
            return Err(DefinitionError::ValueTypeMismatch {
                value: mismatch.to_string(),
                field: self.name,
                expected,
            });
        }

        Ok(Field {
            label: self.label.unwrap_or_else(|| default_label(&self.name)),
            name: self.name,
            ordinal,
            kind: self.kind,
            fixed_length: length,
            max_length: self.max_length,
            values: self.values,
            required: self.required,
            blank: self.blank,
        })
    }
}

/// Turns a name such as `kurztext_1` into a label such as `Kurztext 1`.
fn default_label(name: &str) -> String {
    let mut chars = name.chars().map(|c| if c == '_' { ' ' } else { c });
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// A field in a row definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
    label: String,
    ordinal: usize,
    kind: Kind,
    fixed_length: Option<usize>,
    max_length: Option<usize>,
    values: Option<Vec<Value>>,
    required: bool,
    blank: bool,
}

impl Field {
    /// The name that values for this field are supplied under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The field's 0-based position in its row.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// The field's 1-based position in its row, as used in DATANORM
    /// documentation.
    pub fn number(&self) -> usize {
        self.ordinal + 1
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn fixed_length(&self) -> Option<usize> {
        self.fixed_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn values(&self) -> Option<&[Value]> {
        self.values.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allows_blank(&self) -> bool {
        self.blank
    }

    /// Converts `value` into the text for this field.
    pub fn process(&self, value: Option<&Value>) -> Result<String, FieldError> {
        self.convert(value).map_err(|details| FieldError {
            label: self.label.clone(),
            number: self.number(),
            details,
        })
    }

    fn convert(&self, value: Option<&Value>) -> Result<String, ValidationError> {
        if let Kind::Static(constant) = &self.kind {
            return match value {
                None => Ok(constant.clone()),
                Some(Value::Text(text)) if text == constant => Ok(constant.clone()),
                Some(other) => Err(ValidationError::ConstantMismatch {
                    expected: constant.clone(),
                    actual: other.to_string(),
                }),
            };
        }

        let blank = value.is_none_or(Value::is_empty);
        if blank && self.blank {
            return Ok(String::new());
        }
        if blank && self.required {
            return Err(ValidationError::Empty);
        }
        if let Some(values) = &self.values
            && !value.is_some_and(|value| values.contains(value))
        {
            return Err(ValidationError::NotPermitted(match value {
                Some(value) => value.to_string(),
                None => String::from("(none)"),
            }));
        }

        let text = match (&self.kind, value) {
            (kind, None) if kind.is_date() => return Err(ValidationError::DateRequired),
            (_, None) if self.fixed_length.is_some() => {
                return Err(ValidationError::FixedLengthEmpty);
            }
            (Kind::Integer, Some(Value::Integer(integer))) => match self.fixed_length {
                Some(width) => format!("{integer:0width$}"),
                None => {
                    let text = integer.to_string();
                    if let Some(max_length) = self.max_length
                        && text.len() > max_length
                    {
                        return Err(ValidationError::IntegerTooLarge {
                            value: *integer,
                            max_length,
                        });
                    }
                    text
                }
            },
            (Kind::ShortDate, Some(Value::Date(date))) => date.format("%d%m%y").to_string(),
            (Kind::LongDate, Some(Value::Date(date))) => {
                format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
            }
            (Kind::Text | Kind::Currency, Some(value)) => value.to_string(),
            (_, None) => String::new(),
            (kind, Some(value)) => {
                return Err(ValidationError::WrongType {
                    value: value.to_string(),
                    expected: kind.value_type(),
                });
            }
        };

        let length = text.chars().count();
        if let Some(expected) = self.fixed_length {
            if length != expected {
                return Err(ValidationError::LengthMismatch {
                    value: text,
                    expected,
                    actual: length,
                });
            }
        } else if let Some(max_length) = self.max_length
            && length > max_length
        {
            return Err(ValidationError::TooLong {
                value: text,
                max_length,
                actual: length,
            });
        }

        // Replacing one character by another keeps the length checked above.
        Ok(match self.kind {
            Kind::Text | Kind::Currency => text.replace('\n', " "),
            _ => text,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use crate::field::{
        DefinitionError, FieldError, FieldSpec, Kind, ValidationError, Value, ValueType,
    };

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 10, 11).unwrap()
    }

    #[track_caller]
    fn process(spec: FieldSpec, value: impl Into<Value>) -> Result<String, ValidationError> {
        spec.build()
            .unwrap()
            .process(Some(&value.into()))
            .map_err(|error| error.details)
    }

    #[track_caller]
    fn process_none(spec: FieldSpec) -> Result<String, ValidationError> {
        spec.build()
            .unwrap()
            .process(None)
            .map_err(|error| error.details)
    }

    #[test]
    fn integer_padding() {
        assert_eq!(process(FieldSpec::integer("f").length(3), 10).unwrap(), "010");
        assert_eq!(process(FieldSpec::integer("f").length(3), 0).unwrap(), "000");
        assert_eq!(process(FieldSpec::integer("f").length(3), 999).unwrap(), "999");
        assert!(matches!(
            process(FieldSpec::integer("f").length(3), 1000),
            Err(ValidationError::LengthMismatch { expected: 3, actual: 4, .. })
        ));
    }

    #[test]
    fn integer_values() {
        let spec = FieldSpec::integer("f").values([0, 1, 2]);
        assert_eq!(
            process(spec.clone(), 4),
            Err(ValidationError::NotPermitted(String::from("4")))
        );
        assert_eq!(process(spec.clone(), 0).unwrap(), "0");
        assert!(process_none(spec).is_err());
    }

    #[test]
    fn integer_max_length() {
        let spec = FieldSpec::integer("preis").max_length(8);
        assert_eq!(process(spec.clone(), 1999).unwrap(), "1999");
        assert_eq!(process(spec.clone(), 99_999_999).unwrap(), "99999999");
        assert_eq!(
            process(spec.clone(), 100_000_000),
            Err(ValidationError::IntegerTooLarge {
                value: 100_000_000,
                max_length: 8
            })
        );
        assert_eq!(process_none(spec.clone()).unwrap(), "");
        assert_eq!(
            process(spec, "12"),
            Err(ValidationError::WrongType {
                value: String::from("12"),
                expected: ValueType::Integer
            })
        );
    }

    #[test]
    fn integer_fixed_length_none() {
        assert_eq!(
            process_none(FieldSpec::integer("f").length(2)),
            Err(ValidationError::FixedLengthEmpty)
        );
        assert_eq!(
            process_none(FieldSpec::integer("f").length(2).allow_blank()).unwrap(),
            ""
        );
    }

    #[test]
    fn text_length() {
        assert!(matches!(
            process(FieldSpec::text("f").length(5), "abc"),
            Err(ValidationError::LengthMismatch { expected: 5, actual: 3, .. })
        ));
        assert_eq!(process(FieldSpec::text("f").length(5), "abcde").unwrap(), "abcde");
        assert_eq!(process(FieldSpec::text("f").length(2), "äö").unwrap(), "äö");
        assert!(matches!(
            process(FieldSpec::text("f").max_length(5), "abcdef"),
            Err(ValidationError::TooLong { max_length: 5, actual: 6, .. })
        ));
        assert_eq!(process(FieldSpec::text("f").max_length(5), "abc").unwrap(), "abc");
        assert_eq!(process_none(FieldSpec::text("f").max_length(5)).unwrap(), "");
    }

    #[test]
    fn text_new_lines() {
        assert_eq!(
            process(FieldSpec::text("f").max_length(5), "a\nb\nc").unwrap(),
            "a b c"
        );
    }

    #[test]
    fn text_coerces_integers() {
        assert_eq!(process(FieldSpec::text("f").max_length(5), 42).unwrap(), "42");
    }

    #[test]
    fn required_and_blank() {
        let required = FieldSpec::text("f").required();
        assert_eq!(process(required.clone(), ""), Err(ValidationError::Empty));
        assert_eq!(process_none(required.clone()), Err(ValidationError::Empty));

        // A blank field skips every other check.
        let blank = required.length(3).values(["abc"]).allow_blank();
        assert_eq!(process(blank.clone(), "").unwrap(), "");
        assert_eq!(process_none(blank.clone()).unwrap(), "");
        assert_eq!(process(blank, "abc").unwrap(), "abc");
    }

    #[test]
    fn text_values() {
        let spec = FieldSpec::text("verarbeitungsmerker").length(1).values(["A", "N"]);
        assert_eq!(process(spec.clone(), "N").unwrap(), "N");
        assert!(matches!(
            process(spec.clone(), "L"),
            Err(ValidationError::NotPermitted(_))
        ));
        // No coercion between types.
        let spec = FieldSpec::text("f").length(1).values(["1", "2"]);
        assert!(process(spec, 1).is_err());
    }

    #[test]
    fn static_field() {
        assert_eq!(process_none(FieldSpec::constant("f", "a")).unwrap(), "a");
        assert_eq!(process(FieldSpec::constant("f", "abc"), "abc").unwrap(), "abc");
        assert_eq!(
            process(FieldSpec::constant("f", "abc"), "d"),
            Err(ValidationError::ConstantMismatch {
                expected: String::from("abc"),
                actual: String::from("d")
            })
        );
        assert_eq!(process_none(FieldSpec::constant("f", "")).unwrap(), "");

        let field = FieldSpec::constant("f", "EUR").build().unwrap();
        assert_eq!(field.fixed_length(), Some(3));
    }

    #[test]
    fn dates() {
        assert_eq!(process(FieldSpec::long_date("f"), date()).unwrap(), "20141011");
        assert_eq!(process(FieldSpec::short_date("f"), date()).unwrap(), "111014");

        let date_time = NaiveDateTime::new(date(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(process(FieldSpec::short_date("f"), date_time).unwrap(), "111014");

        assert_eq!(
            process_none(FieldSpec::short_date("f")),
            Err(ValidationError::DateRequired)
        );
        assert_eq!(
            process_none(FieldSpec::long_date("f").allow_blank()).unwrap(),
            ""
        );
        assert!(matches!(
            process(FieldSpec::long_date("f"), "20141011"),
            Err(ValidationError::WrongType { .. })
        ));
    }

    #[test]
    fn currency() {
        assert_eq!(process(FieldSpec::currency("f"), "EUR").unwrap(), "EUR");
        assert!(process(FieldSpec::currency("f"), "EURO").is_err());
        assert_eq!(
            process_none(FieldSpec::currency("f")),
            Err(ValidationError::FixedLengthEmpty)
        );
    }

    #[test]
    fn definition_errors() {
        assert_eq!(
            FieldSpec::text("f").length(3).max_length(4).build(),
            Err(DefinitionError::LengthConflict {
                field: String::from("f"),
                length: 3,
                max_length: 4
            })
        );
        assert!(FieldSpec::text("f").length(3).max_length(3).build().is_ok());
        assert!(matches!(
            FieldSpec::short_date("f").length(8).build(),
            Err(DefinitionError::ImpliedLength { implied: 6, length: 8, .. })
        ));
        assert!(matches!(
            FieldSpec::integer("f").values(["1"]).build(),
            Err(DefinitionError::ValueTypeMismatch { .. })
        ));
        assert_eq!(FieldSpec::text("").build(), Err(DefinitionError::EmptyName));
    }

    #[test]
    fn labels() {
        let field = FieldSpec::text("kurztext_1").build().unwrap();
        assert_eq!(field.label(), "Kurztext 1");
        let field = FieldSpec::text("EAN_code").build().unwrap();
        assert_eq!(field.label(), "Ean code");
        let field = FieldSpec::text("ean").label("EAN").build().unwrap();
        assert_eq!(field.label(), "EAN");
        assert_eq!(field.kind(), &Kind::Text);
    }

    #[test]
    fn error_message() {
        let field = FieldSpec::text("artikelnummer").max_length(3).build().unwrap();
        let error: FieldError = field.process(Some(&Value::from("12345"))).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Field 1 (Artikelnummer): Value \"12345\" has length 5, which exceeds maximum length 3."
        );
    }
}
