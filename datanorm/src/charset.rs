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

//! The DATANORM character set.
//!
//! DATANORM files are written in a single-byte legacy character set.  Its
//! ASCII part is a subset of ASCII, and the German umlauts and `ß` use the
//! code points they have in code page 437.  A [CharsetTable] maps Unicode
//! characters, after NFKC normalization, to the bytes that represent them in
//! the output.
//!
//! Characters that a table cannot represent are dropped from the output.  The
//! encoder reports them through a [CharsetWarning] rather than failing, since
//! an export with slightly degraded text is more useful than no export.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result as FmtResult},
    sync::LazyLock,
};

use codepage_437::CP437_CONTROL;
use indexmap::IndexSet;
use itertools::Itertools;
use smallvec::SmallVec;
use unicode_normalization::UnicodeNormalization;

/// ASCII characters that DATANORM files may contain.
///
/// `;` is missing because it separates fields.
static ASCII_CHARACTERS: &str = concat!(
    "\t !\"#$%&'()*+,-./0123456789:<=>?@^_",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijklmnopqrstuvwxyz[]",
);

/// Non-ASCII characters in the DATANORM character set, with their code page
/// 437 encodings.
static UMLAUTS: [(char, u8); 7] = [
    ('ü', 0x81),
    ('ö', 0x94),
    ('ä', 0x84),
    ('Ü', 0x9a),
    ('Ä', 0x8e),
    ('Ö', 0x99),
    ('ß', 0xe1),
];

/// A mapping from Unicode characters to their encodings in an output
/// character set.
///
/// Lookups are by single normalized character.  Most tables map each
/// character to one byte, but a character may map to any byte sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharsetTable(HashMap<char, SmallVec<[u8; 1]>>);

impl CharsetTable {
    /// Creates an empty table, which can't encode any characters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the standard DATANORM table.
    pub fn datanorm() -> &'static Self {
        static DATANORM: LazyLock<CharsetTable> = LazyLock::new(|| {
            ASCII_CHARACTERS
                .chars()
                .map(|c| (c, [c as u8]))
                .chain(UMLAUTS.iter().map(|(c, byte)| (*c, [*byte])))
                .collect()
        });
        &DATANORM
    }

    /// Returns a table for all of the printable characters in code page 437,
    /// except for the field delimiter `;`.
    ///
    /// This is a superset of [CharsetTable::datanorm].  Some consumers accept
    /// the full code page.
    pub fn cp437() -> &'static Self {
        static CP437: LazyLock<CharsetTable> = LazyLock::new(|| {
            let mut table = CharsetTable::new().with('\t', b"\t");
            for byte in 0x20..=0xff_u8 {
                let c = CP437_CONTROL.decode(byte);
                if c.is_control() || c == ';' {
                    continue;
                }
                table.0.entry(c).or_insert_with(|| SmallVec::from_slice(&[byte]));

                // Input is normalized before lookup, so make the normalized
                // form of compatibility characters, such as `µ`, findable too.
                if let Ok(normalized) = std::iter::once(c).nfkc().exactly_one() {
                    table
                        .0
                        .entry(normalized)
                        .or_insert_with(|| SmallVec::from_slice(&[byte]));
                }
            }
            table
        });
        &CP437
    }

    /// Adds `c` to the table, encoded as `bytes`, replacing any previous
    /// encoding for `c`.
    pub fn insert(&mut self, c: char, bytes: impl AsRef<[u8]>) {
        self.0.insert(c, SmallVec::from_slice(bytes.as_ref()));
    }

    /// Returns `self` with `c` encoded as `bytes`.
    pub fn with(mut self, c: char, bytes: impl AsRef<[u8]>) -> Self {
        self.insert(c, bytes);
        self
    }

    /// Returns the encoding of `c`, if the table has one.
    pub fn get(&self, c: char) -> Option<&[u8]> {
        self.0.get(&c).map(|bytes| bytes.as_slice())
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains_key(&c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Normalizes `text` to NFKC and encodes it using this table.
    ///
    /// Characters without an encoding are left out of the output.  If there
    /// are any, `warn` is invoked once with all of them.  `field`, if given,
    /// names the field being encoded, for the warning.
    pub fn encode<F>(&self, text: &str, field: Option<&str>, mut warn: F) -> Vec<u8>
    where
        F: FnMut(CharsetWarning),
    {
        let mut output = Vec::with_capacity(text.len());
        let mut invalid = IndexSet::new();
        let mut dropped = 0;
        for c in text.nfkc() {
            match self.0.get(&c) {
                Some(bytes) => output.extend_from_slice(bytes),
                None => {
                    invalid.insert(c);
                    dropped += 1;
                }
            }
        }
        if !invalid.is_empty() {
            warn(CharsetWarning {
                characters: invalid.into_iter().collect(),
                dropped,
                field: field.map(String::from),
            });
        }
        output
    }

    /// Like [CharsetTable::encode], but logs warnings.
    pub fn encode_logged(&self, text: &str, field: Option<&str>) -> Vec<u8> {
        self.encode(text, field, log_warning)
    }
}

impl<B> FromIterator<(char, B)> for CharsetTable
where
    B: AsRef<[u8]>,
{
    fn from_iter<T: IntoIterator<Item = (char, B)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(c, bytes)| (c, SmallVec::from_slice(bytes.as_ref())))
                .collect(),
        )
    }
}

/// Characters dropped while encoding text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharsetWarning {
    /// Each distinct character that could not be encoded, in order of first
    /// appearance.
    pub characters: Vec<char>,

    /// Number of characters dropped, counting repeats.
    pub dropped: usize,

    /// Name of the field being encoded, if known.
    pub field: Option<String>,
}

impl std::error::Error for CharsetWarning {}

impl Display for CharsetWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Invalid characters {} in string",
            self.characters
                .iter()
                .format_with(", ", |c, f| f(&format_args!("{c:?}")))
        )?;
        if let Some(field) = &self.field {
            write!(f, " translating field {field}")?;
        }
        Ok(())
    }
}

/// Logs `warning` as an error.
pub fn log_warning(warning: CharsetWarning) {
    log::error!("{warning}");
}

#[cfg(test)]
mod tests {
    use codepage_437::CP437_CONTROL;

    use crate::charset::{CharsetTable, CharsetWarning, UMLAUTS};

    #[track_caller]
    fn encode(table: &CharsetTable, text: &str) -> (Vec<u8>, Vec<CharsetWarning>) {
        let mut warnings = Vec::new();
        let output = table.encode(text, None, |warning| warnings.push(warning));
        (output, warnings)
    }

    #[test]
    fn umlauts_use_code_page_437() {
        for (c, byte) in UMLAUTS {
            assert_eq!(CP437_CONTROL.decode(byte), c);
            assert_eq!(CharsetTable::datanorm().get(c), Some(&[byte][..]));
        }
    }

    #[test]
    fn ascii() {
        let (output, warnings) = encode(CharsetTable::datanorm(), "Hello, World! [42]");
        assert_eq!(output, b"Hello, World! [42]");
        assert!(warnings.is_empty());
    }

    #[test]
    fn umlauts() {
        let (output, warnings) = encode(CharsetTable::datanorm(), "üÜöÖäÄß");
        assert_eq!(output, b"\x81\x9a\x94\x99\x84\x8e\xe1");
        assert!(warnings.is_empty());
    }

    #[test]
    fn normalization() {
        // Decomposed `u` + combining diaeresis composes to `ü`.
        let (output, _) = encode(CharsetTable::datanorm(), "u\u{308}");
        assert_eq!(output, b"\x81");

        // Compatibility characters decompose.
        let (output, warnings) = encode(CharsetTable::datanorm(), "\u{fb01}x\u{2075}");
        assert_eq!(output, b"fix5");
        assert!(warnings.is_empty());
    }

    #[test]
    fn unmappable_characters_are_dropped() {
        let (output, warnings) = encode(CharsetTable::datanorm(), "XXX°YYY°;{é");
        assert_eq!(output, b"XXXYYY");
        assert_eq!(
            warnings,
            vec![CharsetWarning {
                characters: vec!['°', ';', '{', 'é'],
                dropped: 5,
                field: None,
            }]
        );
    }

    #[test]
    fn warning_names_field() {
        let mut warnings = Vec::new();
        CharsetTable::datanorm().encode("1°", Some("Kurztext 1"), |w| warnings.push(w));
        assert_eq!(
            warnings[0].to_string(),
            "Invalid characters '°' in string translating field Kurztext 1"
        );
    }

    #[test]
    fn custom_table() {
        let table = CharsetTable::from_iter([('a', b"b")]);
        let (output, warnings) = encode(&table, "aaz");
        assert_eq!(output, b"bb");
        assert_eq!(warnings[0].characters, vec!['z']);

        let table = CharsetTable::new().with('€', b"EUR");
        assert_eq!(encode(&table, "€").0, b"EUR");
    }

    #[test]
    fn cp437() {
        let table = CharsetTable::cp437();
        let (output, warnings) = encode(table, "25°C ü é");
        assert_eq!(output, b"25\xf8C \x81 \x82");
        assert!(warnings.is_empty());
        assert!(!table.contains(';'));
        for c in CharsetTable::datanorm().0.keys() {
            assert_eq!(table.get(*c), CharsetTable::datanorm().get(*c));
        }
    }
}
