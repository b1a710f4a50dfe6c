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

//! Writer for DATANORM 4 catalog interchange files.
//!
//! A DATANORM file is a sequence of records, one per line, each made of
//! fields that are validated against a [row definition](row::RowDefinition)
//! and then encoded in a restricted 8-bit [character set](charset).

pub mod charset;
pub mod chunk;
pub mod export;
pub mod field;
pub mod records;
pub mod row;
pub mod settings;
