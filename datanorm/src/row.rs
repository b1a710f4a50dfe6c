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

//! Row definitions and the rows built from them.
//!
//! A [RowDefinition] is an ordered set of [Field]s plus the delimiter and
//! [CharsetTable] used to write them.  It is built once, with
//! [RowDefinition::builder], and then shared by every [Row] of that type.  A
//! [Row] binds values to the fields by name and encodes them as one line of
//! output.

use std::{borrow::Cow, collections::HashMap};

use indexmap::{IndexMap, map::Entry};
use itertools::Itertools;
use thiserror::Error as ThisError;

use crate::{
    charset::{CharsetTable, CharsetWarning, log_warning},
    field::{DefinitionError, Field, FieldError, FieldSpec, Value},
};

/// An error encoding a [Row].
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    #[error("{row} record: {error}")]
    Field {
        row: String,
        #[source]
        error: FieldError,
    },

    /// The row's fields add up to the wrong total length.  This indicates a
    /// mistake in the row definition rather than in the data.
    #[error("{row} record is {actual} bytes long but must be exactly {expected} bytes.")]
    TotalLength {
        row: String,
        expected: usize,
        actual: usize,
    },
}

/// Builds a [RowDefinition].
#[derive(Clone, Debug)]
pub struct RowDefinitionBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    delimiter: Vec<u8>,
    charset: Cow<'static, CharsetTable>,
    total_length: Option<usize>,
}

impl RowDefinitionBuilder {
    /// Appends `field` to the row.  Fields are written in the order they are
    /// added.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends each of `fields` to the row, in order.
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Sets the bytes written after each field.  The default is `;`.
    pub fn delimiter(self, delimiter: impl AsRef<[u8]>) -> Self {
        Self {
            delimiter: delimiter.as_ref().into(),
            ..self
        }
    }

    /// Encodes the row with `charset` instead of [CharsetTable::datanorm].
    pub fn charset(self, charset: CharsetTable) -> Self {
        Self {
            charset: Cow::Owned(charset),
            ..self
        }
    }

    /// Like [RowDefinitionBuilder::charset], for a table that lives forever.
    pub fn shared_charset(self, charset: &'static CharsetTable) -> Self {
        Self {
            charset: Cow::Borrowed(charset),
            ..self
        }
    }

    /// Requires every encoded row to be exactly `total_length` bytes long.
    pub fn total_length(self, total_length: usize) -> Self {
        Self {
            total_length: Some(total_length),
            ..self
        }
    }

    pub fn build(self) -> Result<RowDefinition, DefinitionError> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for (ordinal, spec) in self.fields.into_iter().enumerate() {
            match fields.entry(spec.name().to_string()) {
                Entry::Occupied(entry) => {
                    return Err(DefinitionError::DuplicateField {
                        row: self.name,
                        field: entry.key().clone(),
                    });
                }
                Entry::Vacant(entry) => {
                    entry.insert(spec.build_at(ordinal)?);
                }
            }
        }
        Ok(RowDefinition {
            name: self.name,
            fields,
            delimiter: self.delimiter,
            charset: self.charset,
            total_length: self.total_length,
        })
    }
}

/// The definition of a type of record.
#[derive(Clone, Debug)]
pub struct RowDefinition {
    name: String,
    fields: IndexMap<String, Field>,
    delimiter: Vec<u8>,
    charset: Cow<'static, CharsetTable>,
    total_length: Option<usize>,
}

impl RowDefinition {
    /// Starts building a definition for records called `name`.
    pub fn builder(name: impl Into<String>) -> RowDefinitionBuilder {
        RowDefinitionBuilder {
            name: name.into(),
            fields: Vec::new(),
            delimiter: b";".into(),
            charset: Cow::Borrowed(CharsetTable::datanorm()),
            total_length: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Field> + '_ {
        self.fields.values()
    }

    /// Returns the field named `name`, if there is one.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }

    pub fn charset(&self) -> &CharsetTable {
        &self.charset
    }

    pub fn total_length(&self) -> Option<usize> {
        self.total_length
    }

    /// Returns a copy of this definition that encodes with `charset`.
    pub fn with_charset(&self, charset: &'static CharsetTable) -> Self {
        Self {
            charset: Cow::Borrowed(charset),
            ..self.clone()
        }
    }

    /// Returns a legend for the row's columns, as `number:label` pairs
    /// separated by the delimiter, e.g. `1:Satzartenkennzeichen;2:Verarbeitungsmerker`.
    pub fn describe(&self) -> String {
        let delimiter = String::from_utf8_lossy(&self.delimiter);
        self.fields()
            .map(|field| format!("{}:{}", field.number(), field.label()))
            .join(&delimiter)
    }

    /// Returns a new, empty row of this type.
    pub fn row(&self) -> Row<'_> {
        Row {
            definition: self,
            values: HashMap::new(),
        }
    }

    /// Encodes a row with the given `values`, logging any characters that
    /// can't be encoded.
    pub fn output<I, K, V>(&self, values: I) -> Result<Vec<u8>, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .fold(self.row(), |row, (name, value)| row.with(name, value))
            .output()
    }
}

/// A [RowDefinition] with values for its fields.
#[derive(Clone, Debug)]
pub struct Row<'a> {
    definition: &'a RowDefinition,
    values: HashMap<String, Value>,
}

impl<'a> Row<'a> {
    pub fn definition(&self) -> &'a RowDefinition {
        self.definition
    }

    /// Sets the value of the field named `name`.  Names that aren't fields of
    /// this row are ignored.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if self.definition.fields.contains_key(&name) {
            self.values.insert(name, value.into());
        } else {
            log::debug!("{} record has no field {name:?}", self.definition.name);
        }
    }

    /// Returns `self` with the field named `name` set to `value`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns `self` with the field named `name` set to `value`, if it is
    /// `Some`.
    pub fn with_opt<V>(self, name: impl Into<String>, value: Option<V>) -> Self
    where
        V: Into<Value>,
    {
        match value {
            Some(value) => self.with(name, value),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Encodes the row, logging any characters that can't be encoded.
    pub fn output(&self) -> Result<Vec<u8>, Error> {
        self.output_with(log_warning)
    }

    /// Encodes the row, passing a warning to `warn` for each field that
    /// contains characters that can't be encoded.
    ///
    /// Each field is followed by the delimiter, including the last one.
    pub fn output_with<F>(&self, mut warn: F) -> Result<Vec<u8>, Error>
    where
        F: FnMut(CharsetWarning),
    {
        let definition = self.definition;
        let mut output = Vec::new();
        for field in definition.fields() {
            let text = field
                .process(self.values.get(field.name()))
                .map_err(|error| Error::Field {
                    row: definition.name.clone(),
                    error,
                })?;
            output.extend(
                definition
                    .charset
                    .encode(&text, Some(field.label()), &mut warn),
            );
            output.extend_from_slice(&definition.delimiter);
        }

        if let Some(expected) = definition.total_length
            && output.len() != expected
        {
            return Err(Error::TotalLength {
                row: definition.name.clone(),
                expected,
                actual: output.len(),
            });
        }
        Ok(output)
    }
}
