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
    fmt::Write as _,
    fs::{File, read_to_string},
    io::{BufReader, BufWriter, Write, stdout},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use clap::{Args, ValueEnum};
use datanorm::{
    export::{Export as Writer, Product},
    settings::{Charset, ExportOptions},
};

/// Write products to a DATANORM file.
#[derive(Args, Clone, Debug)]
pub struct Export {
    /// Input file name, a JSON array of products or a CSV file with one
    /// product per row.
    input: PathBuf,

    /// Output file name (if omitted, output is written to stdout).
    output: Option<PathBuf>,

    /// Format of the input file (if omitted, the format is inferred from the
    /// file extension).
    #[arg(short = 'I', long)]
    input_format: Option<InputFormat>,

    /// TOML file with export options.
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Export options in TOML syntax, e.g. `-o 'info_text_1="Preisliste"'`.
    /// These take precedence over the configuration file.
    #[arg(short = 'o')]
    options: Vec<String>,

    /// Character set for the output.
    #[arg(long)]
    charset: Option<Charset>,

    /// Stop at the first product that can't be exported.  Otherwise, such
    /// products are reported and skipped.
    #[arg(long)]
    strict: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    fn read_products(&self, path: &Path) -> Result<Vec<Product>> {
        match self {
            InputFormat::Json => Ok(serde_json::from_reader(BufReader::new(File::open(
                path,
            )?))?),
            InputFormat::Csv => Ok(csv::Reader::from_path(path)?
                .deserialize::<Product>()
                .collect::<Result<Vec<_>, _>>()?),
        }
    }
}

impl Export {
    fn options(&self) -> Result<ExportOptions> {
        let mut config = match &self.config {
            Some(path) => read_to_string(path).with_context(|| format!("{}", path.display()))?,
            None => String::new(),
        };
        for option in &self.options {
            writeln!(&mut config, "{option}")?;
        }
        let options = ExportOptions::from_toml(&config)?;
        Ok(match self.charset {
            Some(charset) => options.with_charset(charset),
            None => options,
        })
    }

    pub fn run(self) -> Result<()> {
        let options = self.options()?;
        let input_format = self
            .input_format
            .or_else(|| InputFormat::from_path(&self.input))
            .ok_or_else(|| {
                anyhow!(
                    "{}: unknown input format (use -I to specify one)",
                    self.input.display()
                )
            })?;
        let products = input_format
            .read_products(&self.input)
            .with_context(|| format!("{}", self.input.display()))?;

        let mut writer = Writer::new(options)?;
        let mut skipped = 0;
        log::debug!(
            "Read {} products from {}.",
            products.len(),
            self.input.display()
        );
        for product in &products {
            if let Err(error) = writer.add_product(product) {
                if self.strict {
                    return Err(error.into());
                }
                log::error!("{error}");
                skipped += 1;
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {skipped} of {} products.", products.len());
        }
        log::info!(
            "Exported {} products in {} records.",
            products.len() - skipped,
            writer.lines().len()
        );

        match &self.output {
            Some(path) => {
                let mut file = BufWriter::new(File::create(path)?);
                writer.write_to(&mut file)?;
                file.flush()?;
            }
            None => writer.write_to(stdout().lock())?,
        }
        Ok(())
    }
}
