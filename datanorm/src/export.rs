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

//! Writing a complete DATANORM file from a list of products.

use std::{
    borrow::Cow,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Result as IoResult, Write},
    str::FromStr,
};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error as DeError, Unexpected, Visitor},
};
use thiserror::Error as ThisError;

use crate::{
    charset::{CharsetWarning, log_warning},
    chunk::chunk_text,
    records::{self, TextComposition, TextKey, TierBasis},
    row::{Error as RowError, RowDefinition},
    settings::{Charset, ExportOptions},
};

/// An amount of money in hundredths of the currency unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(pub i64);

impl Cents {
    fn from_f64(amount: f64) -> Option<Self> {
        let cents = (amount * 100.0).round();
        (cents.is_finite() && cents.abs() < 1e15).then_some(Self(cents as i64))
    }
}

/// A string that is not a valid price.
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
#[error("{0:?} is not a valid price.")]
pub struct ParseCentsError(String);

impl FromStr for Cents {
    type Err = ParseCentsError;

    /// Parses a decimal amount with at most two digits after the decimal
    /// point, which may be `.` or `,`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseCentsError(s.into());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (units, fraction) = digits
            .split_once(|c: char| c == '.' || c == ',')
            .unwrap_or((digits, ""));
        if (units.is_empty() && fraction.is_empty())
            || fraction.len() > 2
            || !units
                .chars()
                .chain(fraction.chars())
                .all(|c| c.is_ascii_digit())
        {
            return Err(error());
        }

        let units = match units {
            "" => 0,
            _ => units.parse::<i64>().map_err(|_| error())?,
        };
        let fraction = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| error())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| error())?,
        };
        let cents = units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(error)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl Serialize for Cents {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cents {
    /// Accepts a decimal string such as `"19.99"`, an integer number of
    /// currency units, or a floating-point amount.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CentsVisitor;

        impl Visitor<'_> for CentsVisitor {
            type Value = Cents;

            fn expecting(&self, f: &mut Formatter) -> FmtResult {
                write!(f, "a price such as \"19.99\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                v.parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                v.checked_mul(100)
                    .map(Cents)
                    .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &self))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(100))
                    .map(Cents)
                    .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                Cents::from_f64(v).ok_or_else(|| E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        deserializer.deserialize_any(CentsVisitor)
    }
}

/// A price that applies to a range of quantities (or other basis).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriceTier {
    /// Lower bound of the range.
    pub from: i64,

    /// Upper bound of the range.
    pub to: i64,

    pub price: Cents,

    #[serde(default)]
    pub basis: TierBasis,

    #[serde(default)]
    pub description: String,
}

/// A product to export.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Product {
    /// The product's EAN/GTIN barcode number.
    pub gtin: String,
    pub item_number: String,
    pub name: String,

    /// Unit in which the product is sold, e.g. `PCE`.  Only the first 4
    /// characters are written.
    pub price_unit: String,
    pub price: Cents,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiers: Vec<PriceTier>,
}

/// An error writing an [Export].
#[derive(Clone, Debug, ThisError, PartialEq, Eq)]
pub enum Error {
    #[error("Header: {0}")]
    Header(#[source] RowError),

    #[error("Product {item_number:?}: {error}")]
    Product {
        item_number: String,
        #[source]
        error: RowError,
    },
}

struct Definitions {
    header: Cow<'static, RowDefinition>,
    article: Cow<'static, RowDefinition>,
    article_details: Cow<'static, RowDefinition>,
    long_text: Cow<'static, RowDefinition>,
    price_tier: Cow<'static, RowDefinition>,
}

impl Definitions {
    fn new(charset: Charset) -> Self {
        let get = |definition: &'static RowDefinition| match charset {
            Charset::Datanorm => Cow::Borrowed(definition),
            _ => Cow::Owned(definition.with_charset(charset.table())),
        };
        Self {
            header: get(records::header()),
            article: get(records::article()),
            article_details: get(records::article_details()),
            long_text: get(records::long_text()),
            price_tier: get(records::price_tier()),
        }
    }
}

/// A DATANORM file under construction.
///
/// Constructing an export writes its header.  Each call to
/// [add_product](Self::add_product) then appends the records for one product.
/// A product whose records cannot be encoded is rejected as a whole, leaving
/// the export as it was.
///
/// Long texts are numbered from 1 in the order they are added, since item
/// numbers may be too long for the long text records.
pub struct Export<F = fn(CharsetWarning)> {
    options: ExportOptions,
    definitions: Definitions,
    lines: Vec<Vec<u8>>,
    long_texts: u32,
    warn: F,
}

impl Export {
    /// Starts an export with `options`, logging characters that can't be
    /// encoded.
    pub fn new(options: ExportOptions) -> Result<Self, Error> {
        Self::with_warn(options, log_warning)
    }
}

impl<F> Export<F>
where
    F: FnMut(CharsetWarning),
{
    /// Starts an export with `options`, passing characters that can't be
    /// encoded to `warn`.
    pub fn with_warn(options: ExportOptions, mut warn: F) -> Result<Self, Error> {
        let definitions = Definitions::new(options.charset);
        let header = definitions
            .header
            .row()
            .with("erstellungsdatum", options.date())
            .with("informationstext1", format!("{:<40}", options.info_text_1))
            .with("informationstext2", format!("{:<40}", options.info_text_2))
            .with("informationstext3", format!("{:<35}", options.info_text_3))
            .with("waehrungskennzeichen", options.currency.as_str())
            .output_with(&mut warn)
            .map_err(Error::Header)?;
        Ok(Self {
            options,
            definitions,
            lines: vec![header],
            long_texts: 0,
            warn,
        })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Appends the records for `product`.
    pub fn add_product(&mut self, product: &Product) -> Result<(), Error> {
        let lines = self
            .product_lines(product)
            .map_err(|error| Error::Product {
                item_number: product.item_number.clone(),
                error,
            })?;
        self.lines.extend(lines);
        Ok(())
    }

    /// Appends the records for each of `products`, stopping at the first
    /// one that fails.
    pub fn add_products<'a>(
        &mut self,
        products: impl IntoIterator<Item = &'a Product>,
    ) -> Result<(), Error> {
        for product in products {
            self.add_product(product)?;
        }
        Ok(())
    }

    fn product_lines(&mut self, product: &Product) -> Result<Vec<Vec<u8>>, RowError> {
        let Self {
            options,
            definitions,
            long_texts,
            warn,
            ..
        } = self;
        let processing = options.processing;
        let long_text = product
            .long_text
            .as_deref()
            .map(|text| chunk_text(text, options.long_text_width))
            .filter(|lines| !lines.is_empty());
        let long_text_number = match long_text {
            Some(_) => (*long_texts + 1).to_string(),
            None => String::from(" "),
        };

        let mut lines = vec![
            definitions
                .article
                .row()
                .with("verarbeitungsmerker", processing)
                .with("artikelnummer", product.item_number.as_str())
                .with(
                    "textkennzeichen",
                    TextKey::new(TextComposition::Long, true),
                )
                .with("kurztext_1", product.name.chars().take(40).collect::<String>())
                .with("kurztext_2", " ")
                .with("preiskennzeichen", options.price_kind)
                .with("preiseinheit", options.price_unit)
                .with(
                    "mengeneinheit",
                    product.price_unit.chars().take(4).collect::<String>(),
                )
                .with("preis", product.price.0)
                .with("rabattgruppe", " ")
                .with("hauptwarengruppe", " ")
                .with("langtextnummer", long_text_number.as_str())
                .output_with(&mut *warn)?,
            definitions
                .article_details
                .row()
                .with("verarbeitungsmerker", processing)
                .with("artikelnummer", product.item_number.as_str())
                .with("matchcode", " ")
                .with("alternativ_artikelnummer", " ")
                .with("katalogseite", " ")
                .with("ean", product.gtin.as_str())
                .with("anbindungsnummer", " ")
                .with("warengruppe", " ")
                .with("verpackungsmenge", 1)
                .with("referenznummer_erstellerkuerzel", " ")
                .with("referenznummer", " ")
                .output_with(&mut *warn)?,
        ];

        for (index, pair) in long_text.iter().flat_map(|lines| lines.chunks(2)).enumerate() {
            let number = 2 * index as i64 + 1;
            let second = pair.get(1);
            lines.push(
                definitions
                    .long_text
                    .row()
                    .with("verarbeitungsmerker", processing)
                    .with("langtextnummer", long_text_number.as_str())
                    .with("zeilennummer_1", number)
                    .with("langtextzeile_1", pair[0].as_str())
                    .with_opt("zeilennummer_2", second.map(|_| number + 1))
                    .with_opt("langtextzeile_2", second.map(String::as_str))
                    .output_with(&mut *warn)?,
            );
        }

        for (index, tier) in product.tiers.iter().enumerate() {
            lines.push(
                definitions
                    .price_tier
                    .row()
                    .with("verarbeitungsmerker", processing)
                    .with("artikelnummer", product.item_number.as_str())
                    .with("satznummer", index as i64 + 1)
                    .with("basismerker", tier.basis)
                    .with("basisbeschreibung", tier.description.as_str())
                    .with("preiskennzeichen", options.price_kind.as_str())
                    .with("preis", tier.price.0)
                    .with("von_basis", tier.from)
                    .with("bis_basis", tier.to)
                    .output_with(&mut *warn)?,
            );
        }

        if long_text.is_some() {
            *long_texts += 1;
        }
        Ok(lines)
    }
}

impl<F> Export<F> {
    /// Returns the records written so far, without line terminators.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.lines.iter().map(Vec::as_slice)
    }

    /// Writes the file to `writer`, terminating each record with CR LF.
    pub fn write_to<W>(&self, mut writer: W) -> IoResult<()>
    where
        W: Write,
    {
        for line in &self.lines {
            writer.write_all(line)?;
            writer.write_all(b"\r\n")?;
        }
        Ok(())
    }

    /// Returns the file's contents, terminating each record with CR LF.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.lines.iter().map(|line| line.len() + 2).sum());
        for line in self.lines {
            output.extend(line);
            output.extend_from_slice(b"\r\n");
        }
        output
    }
}
