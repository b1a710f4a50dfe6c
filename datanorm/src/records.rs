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

//! The DATANORM 4 record types.
//!
//! Each function here returns the [RowDefinition] for one record type.  The
//! definitions are built on first use and shared afterward.  Field names
//! follow the German names used in the DATANORM documentation.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::LazyLock,
};

use clap::ValueEnum;
use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::{
    field::{FieldSpec, Value},
    row::RowDefinition,
};

/// Length of a DATANORM 4 header record.
pub const HEADER_LENGTH: usize = 128;

/// Maximum length of a line of long text, in characters.
pub const LONG_TEXT_WIDTH: usize = 40;

/// What the receiver should do with a record (`Verarbeitungsmerker`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Processing {
    /// Add a new article.
    #[default]
    New,

    /// Change an existing article.
    Change,

    /// Delete an article.  Only long text and price tier records may be
    /// deleted this way.
    Delete,
}

impl Processing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Processing::New => "N",
            Processing::Change => "A",
            Processing::Delete => "L",
        }
    }
}

impl From<Processing> for Value {
    fn from(value: Processing) -> Self {
        value.as_str().into()
    }
}

/// Which texts describe an article (first digit of `Textkennzeichen`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextComposition {
    /// Short texts 1 and 2.
    Short,

    /// Long text and short text 2.
    Long,

    /// Short text 1 and dimension text.
    ShortDimension,

    /// Long text and dimension text.
    LongDimension,

    /// Short texts 1 and 2 and long text.
    ShortLong,

    /// Short texts 1 and 2 and dimension text.
    ShortShortDimension,

    /// Short texts 1 and 2, long text, and dimension text.
    ShortLongDimension,
}

impl TextComposition {
    pub const ALL: [TextComposition; 7] = [
        TextComposition::Short,
        TextComposition::Long,
        TextComposition::ShortDimension,
        TextComposition::LongDimension,
        TextComposition::ShortLong,
        TextComposition::ShortShortDimension,
        TextComposition::ShortLongDimension,
    ];

    pub fn as_char(&self) -> char {
        match self {
            TextComposition::Short => '0',
            TextComposition::Long => '1',
            TextComposition::ShortDimension => '2',
            TextComposition::LongDimension => '3',
            TextComposition::ShortLong => '4',
            TextComposition::ShortShortDimension => '5',
            TextComposition::ShortLongDimension => '6',
        }
    }
}

/// An article's `Textkennzeichen`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TextKey {
    pub composition: TextComposition,

    /// Whether the article has a second short text.
    pub has_short_text_2: bool,
}

impl TextKey {
    pub fn new(composition: TextComposition, has_short_text_2: bool) -> Self {
        Self {
            composition,
            has_short_text_2,
        }
    }
}

impl Display for TextKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // `0` means that there is a second short text.
        let short_text_2 = if self.has_short_text_2 { '0' } else { '1' };
        write!(f, "{}{short_text_2}", self.composition.as_char())
    }
}

impl From<TextKey> for Value {
    fn from(value: TextKey) -> Self {
        value.to_string().into()
    }
}

/// Whether a price is a list price or a net price (`Preiskennzeichen`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    #[default]
    List,
    Net,
}

impl PriceKind {
    pub fn code(&self) -> i64 {
        match self {
            PriceKind::List => 1,
            PriceKind::Net => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceKind::List => "1",
            PriceKind::Net => "2",
        }
    }
}

impl From<PriceKind> for Value {
    fn from(value: PriceKind) -> Self {
        value.code().into()
    }
}

/// Number of units that a price applies to (`Preiseinheit`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    #[default]
    PerOne,
    PerTen,
    PerHundred,
    PerThousand,
}

impl PriceUnit {
    pub fn code(&self) -> i64 {
        match self {
            PriceUnit::PerOne => 0,
            PriceUnit::PerTen => 1,
            PriceUnit::PerHundred => 2,
            PriceUnit::PerThousand => 3,
        }
    }
}

impl From<PriceUnit> for Value {
    fn from(value: PriceUnit) -> Self {
        value.code().into()
    }
}

/// What the bounds of a price tier measure (`Basismerker`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBasis {
    #[default]
    OrderQuantity,
    DistanceKm,
    Date,
    Other,
}

impl TierBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierBasis::OrderQuantity => "1",
            TierBasis::DistanceKm => "2",
            TierBasis::Date => "3",
            TierBasis::Other => "4",
        }
    }
}

impl From<TierBasis> for Value {
    fn from(value: TierBasis) -> Self {
        value.as_str().into()
    }
}

fn processing(values: &[Processing]) -> FieldSpec {
    FieldSpec::text("verarbeitungsmerker")
        .length(1)
        .values(values.iter().copied())
}

/// The header record (`Vorlaufsatz`), which starts every file.
///
/// Its fields have no delimiter, and it is always exactly [HEADER_LENGTH]
/// bytes long.
pub fn header() -> &'static RowDefinition {
    static HEADER: LazyLock<RowDefinition> = LazyLock::new(|| {
        RowDefinition::builder("Vorlaufsatz")
            .delimiter(b"")
            .total_length(HEADER_LENGTH)
            .fields([
                FieldSpec::constant("satzartenkennzeichen", "V"),
                FieldSpec::constant("dummy", " "),
                FieldSpec::short_date("erstellungsdatum"),
                FieldSpec::text("informationstext1").length(40),
                FieldSpec::text("informationstext2").length(40),
                FieldSpec::text("informationstext3").length(35),
                FieldSpec::constant("version", "04"),
                FieldSpec::currency("waehrungskennzeichen"),
            ])
            .build()
            .expect("header record definition is valid")
    });
    &HEADER
}

/// The main article record (`Artikelsatz A`).
pub fn article() -> &'static RowDefinition {
    static ARTICLE: LazyLock<RowDefinition> = LazyLock::new(|| {
        let text_keys = iproduct!(TextComposition::ALL, [true, false])
            .map(|(composition, has_short_text_2)| TextKey::new(composition, has_short_text_2));
        RowDefinition::builder("Artikelsatz A")
            .fields([
                FieldSpec::constant("satzartenkennzeichen", "A"),
                processing(&[Processing::Change, Processing::New]),
                FieldSpec::text("artikelnummer").max_length(15),
                FieldSpec::text("textkennzeichen").length(2).values(text_keys),
                FieldSpec::text("kurztext_1").max_length(40),
                FieldSpec::text("kurztext_2").max_length(40),
                FieldSpec::integer("preiskennzeichen")
                    .length(1)
                    .values([PriceKind::List, PriceKind::Net]),
                FieldSpec::integer("preiseinheit").max_length(6).values([
                    PriceUnit::PerOne,
                    PriceUnit::PerTen,
                    PriceUnit::PerHundred,
                    PriceUnit::PerThousand,
                ]),
                FieldSpec::text("mengeneinheit").max_length(4),
                // In cents.
                FieldSpec::integer("preis").max_length(8),
                FieldSpec::text("rabattgruppe").max_length(4),
                FieldSpec::text("hauptwarengruppe").max_length(3),
                FieldSpec::text("langtextnummer").max_length(15),
            ])
            .build()
            .expect("article record definition is valid")
    });
    &ARTICLE
}

/// The supplementary article record (`Artikelsatz B`).
pub fn article_details() -> &'static RowDefinition {
    static ARTICLE_DETAILS: LazyLock<RowDefinition> = LazyLock::new(|| {
        RowDefinition::builder("Artikelsatz B")
            .fields([
                FieldSpec::constant("satzartenkennzeichen", "B"),
                processing(&[Processing::Change, Processing::New]),
                FieldSpec::text("artikelnummer").max_length(15),
                FieldSpec::text("matchcode").max_length(15),
                FieldSpec::text("alternativ_artikelnummer").max_length(15),
                FieldSpec::text("katalogseite").max_length(8),
                FieldSpec::constant("kupfer_gewichtsmerker", "0"),
                FieldSpec::constant("kupfer_kennzahl", "0"),
                FieldSpec::constant("kupfer_gewicht", "0"),
                FieldSpec::text("ean").max_length(18),
                FieldSpec::text("anbindungsnummer").max_length(12),
                FieldSpec::text("warengruppe").max_length(10),
                FieldSpec::constant("kostenart", "0"),
                // Smallest number of price units that can be ordered.
                FieldSpec::integer("verpackungsmenge").max_length(5),
                FieldSpec::text("referenznummer_erstellerkuerzel").max_length(4),
                FieldSpec::text("referenznummer").max_length(17),
            ])
            .build()
            .expect("article details record definition is valid")
    });
    &ARTICLE_DETAILS
}

/// The long text record (`Langtextsatz T`), which carries two lines of an
/// article's long text.
pub fn long_text() -> &'static RowDefinition {
    static LONG_TEXT: LazyLock<RowDefinition> = LazyLock::new(|| {
        RowDefinition::builder("Langtextsatz T")
            .fields([
                FieldSpec::constant("satzartenkennzeichen", "T"),
                processing(&[Processing::Change, Processing::New, Processing::Delete]),
                FieldSpec::text("langtextnummer").max_length(8),
                FieldSpec::constant("dummy_1", ""),
                FieldSpec::integer("zeilennummer_1").max_length(2),
                FieldSpec::constant("dummy_2", ""),
                FieldSpec::text("langtextzeile_1").max_length(LONG_TEXT_WIDTH),
                FieldSpec::integer("zeilennummer_2").max_length(2),
                FieldSpec::constant("dummy_3", ""),
                FieldSpec::text("langtextzeile_2").max_length(LONG_TEXT_WIDTH),
            ])
            .build()
            .expect("long text record definition is valid")
    });
    &LONG_TEXT
}

/// The price tier record (`Staffelpreissatz Z`).
pub fn price_tier() -> &'static RowDefinition {
    static PRICE_TIER: LazyLock<RowDefinition> = LazyLock::new(|| {
        RowDefinition::builder("Staffelpreissatz Z")
            .fields([
                FieldSpec::constant("satzartenkennzeichen", "Z"),
                processing(&[Processing::Change, Processing::New, Processing::Delete]),
                FieldSpec::text("artikelnummer").max_length(15),
                // Counts from 1.
                FieldSpec::integer("satznummer").max_length(2),
                FieldSpec::constant("bearbeitungsmerker", "1"),
                FieldSpec::text("basismerker").length(1).values([
                    TierBasis::OrderQuantity,
                    TierBasis::DistanceKm,
                    TierBasis::Date,
                    TierBasis::Other,
                ]),
                FieldSpec::text("basisbeschreibung").max_length(28),
                FieldSpec::text("preiskennzeichen")
                    .length(1)
                    .values([PriceKind::List.as_str(), PriceKind::Net.as_str()]),
                // In cents.
                FieldSpec::integer("preis").max_length(8),
                FieldSpec::integer("von_basis").max_length(8),
                FieldSpec::integer("bis_basis").max_length(8),
            ])
            .build()
            .expect("price tier record definition is valid")
    });
    &PRICE_TIER
}

/// A DATANORM record type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecordType {
    /// `V`: header.
    Header,

    /// `A`: article.
    Article,

    /// `B`: article details.
    ArticleDetails,

    /// `T`: long text.
    LongText,

    /// `Z`: price tier.
    PriceTier,
}

impl RecordType {
    pub const ALL: [RecordType; 5] = [
        RecordType::Header,
        RecordType::Article,
        RecordType::ArticleDetails,
        RecordType::LongText,
        RecordType::PriceTier,
    ];

    pub fn definition(&self) -> &'static RowDefinition {
        match self {
            RecordType::Header => header(),
            RecordType::Article => article(),
            RecordType::ArticleDetails => article_details(),
            RecordType::LongText => long_text(),
            RecordType::PriceTier => price_tier(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::{
        field::ValidationError,
        records::{
            PriceKind, PriceUnit, Processing, RecordType, TextComposition, TextKey, TierBasis,
            article, article_details, header, long_text, price_tier,
        },
        row::Error,
    };

    #[test]
    fn definitions_build() {
        for record_type in RecordType::ALL {
            let definition = record_type.definition();
            assert!(!definition.is_empty(), "{}", definition.name());
            assert_eq!(
                definition.field("satzartenkennzeichen").unwrap().ordinal(),
                0
            );
        }
        assert_eq!(article().len(), 13);
        assert_eq!(article_details().len(), 16);
    }

    #[test]
    fn header_fields_add_up() {
        let total = header()
            .fields()
            .map(|field| field.fixed_length().unwrap())
            .sum::<usize>();
        assert_eq!(total, 128);
    }

    #[test]
    fn header_output() {
        let output = header()
            .row()
            .with("erstellungsdatum", NaiveDate::from_ymd_opt(2014, 10, 11).unwrap())
            .with("informationstext1", format!("{:<40}", "Preisliste 2014"))
            .with("informationstext2", " ".repeat(40))
            .with("informationstext3", " ".repeat(35))
            .with("waehrungskennzeichen", "EUR")
            .output()
            .unwrap();
        assert_eq!(output.len(), 128);
        assert!(output.starts_with(b"V 111014Preisliste 2014 "));
        assert!(output.ends_with(b"04EUR"));
    }

    #[test]
    fn text_keys() {
        assert_eq!(
            TextKey::new(TextComposition::Long, true).to_string(),
            "10"
        );
        assert_eq!(
            TextKey::new(TextComposition::ShortLongDimension, false).to_string(),
            "61"
        );
        assert_eq!(
            article()
                .field("textkennzeichen")
                .unwrap()
                .values()
                .unwrap()
                .len(),
            14
        );
    }

    #[test]
    fn article_output() {
        let output = article()
            .row()
            .with("verarbeitungsmerker", Processing::New)
            .with("artikelnummer", "4711")
            .with("textkennzeichen", TextKey::new(TextComposition::Short, true))
            .with("kurztext_1", "üÜöÖäÄß")
            .with("preiskennzeichen", PriceKind::Net)
            .with("preiseinheit", PriceUnit::PerHundred)
            .with("preis", 1250)
            .output()
            .unwrap();
        assert_eq!(output, b"A;N;4711;00;\x81\x9a\x94\x99\x84\x8e\xe1;;2;2;;1250;;;;");
    }

    #[test]
    fn article_rejects_bad_codes() {
        let error = article()
            .row()
            .with("verarbeitungsmerker", Processing::Delete)
            .with("textkennzeichen", "00")
            .with("preiskennzeichen", PriceKind::List)
            .with("preiseinheit", PriceUnit::PerOne)
            .output()
            .unwrap_err();
        let Error::Field { error, .. } = error else {
            panic!()
        };
        assert_eq!(error.number, 2);
        assert_eq!(error.details, ValidationError::NotPermitted(String::from("L")));
    }

    #[test]
    fn long_text_output() {
        let output = long_text()
            .row()
            .with("verarbeitungsmerker", Processing::New)
            .with("langtextnummer", "12345")
            .with("zeilennummer_1", 1)
            .with("langtextzeile_1", "Erste Zeile")
            .with("zeilennummer_2", 2)
            .with("langtextzeile_2", "Zweite Zeile")
            .output()
            .unwrap();
        assert_eq!(output, b"T;N;12345;;1;;Erste Zeile;2;;Zweite Zeile;");
    }

    #[test]
    fn price_tier_output() {
        let output = price_tier()
            .row()
            .with("verarbeitungsmerker", Processing::New)
            .with("artikelnummer", "12345")
            .with("satznummer", 1)
            .with("basismerker", TierBasis::OrderQuantity)
            .with("basisbeschreibung", "Stück")
            .with("preiskennzeichen", PriceKind::List.as_str())
            .with("preis", 1899)
            .with("von_basis", 10)
            .with("bis_basis", 99)
            .output()
            .unwrap();
        assert_eq!(output, b"Z;N;12345;1;1;1;St\x81ck;1;1899;10;99;");
    }
}
