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

use std::io::{Write, stdout};

use anyhow::Result;
use clap::Args;
use datanorm::records::RecordType;

/// Show the fields of DATANORM record types.
#[derive(Args, Clone, Debug)]
pub struct Describe {
    /// Record type to describe (if omitted, all of them are described).
    #[arg(value_enum)]
    record: Option<RecordType>,
}

impl Describe {
    pub fn run(self) -> Result<()> {
        let mut stdout = stdout().lock();
        match self.record {
            Some(record) => writeln!(stdout, "{}", record.definition().describe())?,
            None => {
                for record in RecordType::ALL {
                    let definition = record.definition();
                    writeln!(stdout, "{}:", definition.name())?;
                    writeln!(stdout, "{}", definition.describe())?;
                }
            }
        }
        Ok(())
    }
}
