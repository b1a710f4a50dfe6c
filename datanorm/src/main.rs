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

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{chunk_cmd::Chunk, describe::Describe, export_cmd::Export};

mod chunk_cmd;
mod describe;
mod export_cmd;

/// Writes DATANORM catalog interchange files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
enum Command {
    Export(Export),
    Describe(Describe),
    Chunk(Chunk),
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Command::Export(export) => export.run(),
            Command::Describe(describe) => describe.run(),
            Command::Chunk(chunk) => chunk.run(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    Cli::parse().command.run()
}
