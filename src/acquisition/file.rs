// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-pyroelectric project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! CSV persistence for capture tables
//!
//! Format: comma separated, one poll per line, columns in capture order
//! (see [`CaptureRecord::COLUMNS`]). A header line is written on export and
//! tolerated on import. Empty fields and `nan` are read as NaN so that the
//! analysis projection can drop incomplete rows.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;

use super::{CaptureRecord, CaptureTable};
use crate::error::{PyroError, Result};

/// Read a capture table from a CSV file
pub fn read_capture_csv(path: impl AsRef<Path>) -> Result<CaptureTable> {
    let path = path.as_ref();
    debug!("Reading capture from {:?}", path);
    let file = File::open(path)?;
    parse_capture(BufReader::new(file))
}

/// Parse a capture table from any buffered reader
pub fn parse_capture<R: BufRead>(reader: R) -> Result<CaptureTable> {
    let mut table = CaptureTable::new();
    let mut seen_data = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        match parse_row(&fields) {
            Ok(row) => {
                seen_data = true;
                table.push(CaptureRecord::from_row(row));
            }
            // The first non-numeric line is a header
            Err(_) if !seen_data && looks_like_header(&fields) => {
                debug!("Skipping header line: {}", line);
            }
            Err(reason) => {
                return Err(PyroError::Parse {
                    line: index + 1,
                    reason,
                })
            }
        }
    }

    debug!("Parsed {} capture records", table.len());
    Ok(table)
}

fn looks_like_header(fields: &[&str]) -> bool {
    fields
        .iter()
        .any(|f| f.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) && !is_nan(f))
}

fn is_nan(field: &str) -> bool {
    field.eq_ignore_ascii_case("nan")
}

fn parse_row(fields: &[&str]) -> std::result::Result<[f64; 9], String> {
    if fields.len() < CaptureRecord::COLUMNS.len() {
        return Err(format!(
            "expected {} columns, found {}",
            CaptureRecord::COLUMNS.len(),
            fields.len()
        ));
    }

    let mut row = [f64::NAN; 9];
    for (slot, field) in row.iter_mut().zip(fields.iter()) {
        if field.is_empty() || is_nan(field) {
            continue;
        }
        *slot = field
            .parse::<f64>()
            .map_err(|e| format!("invalid number '{}': {}", field, e))?;
    }
    Ok(row)
}

/// Write a capture table to a CSV file, with a header line
pub fn write_capture_csv(path: impl AsRef<Path>, table: &CaptureTable) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", CaptureRecord::COLUMNS.join(","))?;
    for record in &table.records {
        let row = record.to_row();
        let fields: Vec<String> = row.iter().map(|v| format!("{}", v)).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()?;
    debug!("Wrote {} capture records to {:?}", table.len(), path);
    Ok(())
}
