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

//! Options for writing a DATANORM file.

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::{
    charset::CharsetTable,
    records::{LONG_TEXT_WIDTH, PriceKind, PriceUnit, Processing},
};

/// Character set for an export.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// ASCII plus German umlauts and `ß`.
    #[default]
    Datanorm,

    /// All of code page 437.
    Cp437,
}

impl Charset {
    pub fn table(&self) -> &'static CharsetTable {
        match self {
            Charset::Datanorm => CharsetTable::datanorm(),
            Charset::Cp437 => CharsetTable::cp437(),
        }
    }
}

/// Options for an [Export](crate::export::Export).
///
/// These are usually read from a TOML file, in which every key is optional:
///
/// ```toml
/// info_text_1 = "Preisliste 2025"
/// date = "2025-01-31"
/// charset = "cp437"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportOptions {
    /// Processing flag for every record written.  Articles can't be
    /// deleted, so [Processing::Delete] is rejected.
    #[serde(deserialize_with = "deserialize_processing")]
    pub processing: Processing,

    /// Free text for the header, up to 40 characters.
    pub info_text_1: String,

    /// Free text for the header, up to 40 characters.
    pub info_text_2: String,

    /// Free text for the header, up to 35 characters.
    pub info_text_3: String,

    /// Creation date written to the header.  Defaults to today.
    pub date: Option<NaiveDate>,

    /// ISO 4217 currency code for prices.
    pub currency: String,

    pub charset: Charset,

    /// Maximum length of a line of long text.
    pub long_text_width: usize,

    pub price_kind: PriceKind,

    pub price_unit: PriceUnit,
}

fn deserialize_processing<'de, D>(deserializer: D) -> Result<Processing, D::Error>
where
    D: Deserializer<'de>,
{
    match Processing::deserialize(deserializer)? {
        Processing::Delete => Err(D::Error::custom(
            "article records can't be deleted, so processing must be \"new\" or \"change\"",
        )),
        processing => Ok(processing),
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            processing: Processing::default(),
            info_text_1: String::new(),
            info_text_2: String::new(),
            info_text_3: String::new(),
            date: None,
            currency: String::from("EUR"),
            charset: Charset::default(),
            long_text_width: LONG_TEXT_WIDTH,
            price_kind: PriceKind::default(),
            price_unit: PriceUnit::default(),
        }
    }
}

impl ExportOptions {
    /// Constructs a new set of default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from TOML.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Returns `self` with the creation date set to `date`.
    pub fn with_date(self, date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..self
        }
    }

    /// Returns `self` with the character set set to `charset`.
    pub fn with_charset(self, charset: Charset) -> Self {
        Self { charset, ..self }
    }

    /// Returns `self` with the processing flag set to `processing`.
    pub fn with_processing(self, processing: Processing) -> Self {
        Self { processing, ..self }
    }

    /// Returns `self` with the header's information texts set to `texts`.
    pub fn with_info_texts(self, texts: [&str; 3]) -> Self {
        let [info_text_1, info_text_2, info_text_3] = texts.map(String::from);
        Self {
            info_text_1,
            info_text_2,
            info_text_3,
            ..self
        }
    }

    /// Returns the creation date to write, which is today if none was set.
    pub fn date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }
}
