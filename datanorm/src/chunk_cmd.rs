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

use std::{
    fs::read_to_string,
    io::{Read, Write, stdin, stdout},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Args;
use datanorm::{chunk::chunk_text_at, records::LONG_TEXT_WIDTH};

/// Split text into lines short enough for long text records.
#[derive(Args, Clone, Debug)]
pub struct Chunk {
    /// Input file name (if omitted, text is read from stdin).
    input: Option<PathBuf>,

    /// Maximum number of characters per line.
    #[arg(short, long, default_value_t = LONG_TEXT_WIDTH)]
    width: usize,

    /// Character at which lines may be broken.
    #[arg(long, default_value_t = ' ')]
    split: char,
}

impl Chunk {
    pub fn run(self) -> Result<()> {
        let text = match &self.input {
            Some(input) => {
                read_to_string(input).with_context(|| format!("{}", input.display()))?
            }
            None => {
                let mut text = String::new();
                stdin().read_to_string(&mut text)?;
                text
            }
        };
        let mut stdout = stdout().lock();
        for chunk in chunk_text_at(&text, self.width, self.split) {
            writeln!(stdout, "{chunk}")?;
        }
        Ok(())
    }
}
