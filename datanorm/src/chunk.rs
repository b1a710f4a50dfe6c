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

//! Splitting long text into fixed-width pieces.
//!
//! DATANORM long texts are carried in records with 40-character text fields.
//! [chunk_text] breaks free text into pieces that fit, preferring to break
//! between words.

use std::iter::FusedIterator;

use unicode_normalization::UnicodeNormalization;

/// Normalizes `text` to NFKC and splits it into pieces of at most `max_width`
/// characters, breaking at spaces where possible.
///
/// Each line of `text` is split separately, so the pieces of one line never
/// run into the next.  An empty line yields an empty piece.
pub fn chunk_text(text: &str, max_width: usize) -> Vec<String> {
    chunk_text_at(text, max_width, ' ')
}

/// Like [chunk_text], but breaks at `split` instead of at spaces.
pub fn chunk_text_at(text: &str, max_width: usize, split: char) -> Vec<String> {
    let text = text.nfkc().collect::<String>();
    Chunks::new(&text, max_width, split)
        .map(String::from)
        .collect()
}

/// Iterator over the pieces of text produced by [chunk_text].
///
/// Unlike [chunk_text], this does not normalize the text.
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    lines: Lines<'a>,
    rest: Option<&'a str>,
    max_width: usize,
    split: char,
}

impl<'a> Chunks<'a> {
    /// Creates an iterator over the pieces of `text`, each at most
    /// `max_width` characters.  A `max_width` of 0 is treated as 1.
    pub fn new(text: &'a str, max_width: usize, split: char) -> Self {
        Self {
            lines: Lines(text),
            rest: None,
            max_width: max_width.max(1),
            split,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.rest.take() {
            Some(rest) => rest,
            None => self.lines.next()?,
        }
        .trim();

        let Some((end, _)) = line.char_indices().nth(self.max_width) else {
            return Some(line);
        };

        // Break at the last `split` within the first `max_width` characters.
        // The `split` itself starts the rest of the line, where trimming
        // removes it if it is white space.  A `split` at the very beginning
        // would not make progress, so cut the word instead.
        let at = line[..end]
            .rfind(self.split)
            .filter(|at| *at > 0)
            .unwrap_or(end);
        self.rest = Some(&line[at..]);
        Some(&line[..at])
    }
}

impl FusedIterator for Chunks<'_> {}

/// Iterator over lines, splitting at the same line boundaries as Python's
/// `str.splitlines`.
#[derive(Clone, Debug)]
struct Lines<'a>(&'a str);

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }
        match self.0.char_indices().find(|(_, c)| is_line_break(*c)) {
            Some((index, c)) => {
                let line = &self.0[..index];
                let rest = &self.0[index + c.len_utf8()..];
                self.0 = match c {
                    '\r' => rest.strip_prefix('\n').unwrap_or(rest),
                    _ => rest,
                };
                Some(line)
            }
            None => Some(std::mem::take(&mut self.0)),
        }
    }
}

impl FusedIterator for Lines<'_> {}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

#[cfg(test)]
mod tests {
    use crate::chunk::{Lines, chunk_text, chunk_text_at};

    #[track_caller]
    fn test_chunks(input: &str, width: usize, expected: Vec<&str>) {
        let actual = chunk_text(input, width);
        if expected != actual {
            panic!(
                "chunking {input:?} to {width} characters:\nexpected: {expected:?}\nactual:   {actual:?}"
            );
        }
        for chunk in &actual {
            assert!(chunk.chars().count() <= width.max(1), "{chunk:?}");
        }
    }

    #[test]
    fn words() {
        test_chunks(
            "ABC DEF GHI JKL MNO QRS",
            5,
            vec!["ABC", "DEF", "GHI", "JKL", "MNO", "QRS"],
        );
        test_chunks("ABC DEF GHI", 7, vec!["ABC", "DEF GHI"]);
        test_chunks("ABC DEF GHI", 11, vec!["ABC DEF GHI"]);
        test_chunks("  ABC  ", 3, vec!["ABC"]);
    }

    #[test]
    fn long_words() {
        test_chunks(
            "ABCDEFGHI JKLMNOQRS",
            5,
            vec!["ABCDE", "FGHI", "JKLMN", "OQRS"],
        );
        test_chunks("ABCDEFGHIJ", 0, vec!["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]);
    }

    #[test]
    fn multibyte_characters() {
        test_chunks("äöüäöü ßß", 4, vec!["äöüä", "öü", "ßß"]);
    }

    #[test]
    fn lines() {
        test_chunks(
            "Erste Zeile\n\nZweite Zeile\r\nDritte",
            8,
            vec!["Erste", "Zeile", "", "Zweite", "Zeile", "Dritte"],
        );
        test_chunks("", 8, vec![]);
        test_chunks("abc\n", 8, vec!["abc"]);
        assert_eq!(
            Lines("a\rb\r\nc\u{2028}d\n").collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn normalization() {
        test_chunks("\u{fb01}ne", 3, vec!["fin", "e"]);
    }

    #[test]
    fn split_character() {
        assert_eq!(
            chunk_text_at("abc-def-ghi", 5, '-'),
            vec!["abc", "-def", "-ghi"]
        );
        assert_eq!(chunk_text_at("-abcdef", 3, '-'), vec!["-ab", "cde", "f"]);
    }
}
