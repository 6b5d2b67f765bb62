//! BLAST tabular (outfmt 6) hit-table parser
//!
//! DIAMOND writes its default output in this format: twelve tab-separated
//! columns per hit, `qseqid sseqid pident length mismatch gapopen qstart qend
//! sstart send evalue bitscore`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use flate2::read::GzDecoder;
use anyhow::{anyhow, Result};
use thiserror::Error;

use crate::types::Hit;

pub const HIT_TABLE_COLUMNS: usize = 12;

#[derive(Debug, Error)]
pub enum HitError {
    #[error("Invalid hit line: insufficient fields (expected 12, got {0})")]
    InsufficientFields(usize),
    #[error("Invalid integer in column {column}: {value}")]
    InvalidInteger { column: &'static str, value: String },
    #[error("Invalid number in column {column}: {value}")]
    InvalidNumber { column: &'static str, value: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_u32(column: &'static str, value: &str) -> Result<u32, HitError> {
    value.parse::<u32>().map_err(|_| HitError::InvalidInteger {
        column,
        value: value.to_string(),
    })
}

fn parse_f64(column: &'static str, value: &str) -> Result<f64, HitError> {
    value.parse::<f64>().map_err(|_| HitError::InvalidNumber {
        column,
        value: value.to_string(),
    })
}

/// Parser for tab-separated hit tables
pub struct HitTableParser;

impl HitTableParser {
    /// Parse a single hit-table line
    pub fn parse_line(line: &str) -> Result<Hit, HitError> {
        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() < HIT_TABLE_COLUMNS {
            return Err(HitError::InsufficientFields(fields.len()));
        }

        Ok(Hit {
            query: fields[0].to_string(),
            subject: fields[1].to_string(),
            identity: parse_f64("pident", fields[2])?,
            alignment_len: parse_u32("length", fields[3])?,
            mismatches: parse_u32("mismatch", fields[4])?,
            gap_opens: parse_u32("gapopen", fields[5])?,
            query_start: parse_u32("qstart", fields[6])?,
            query_end: parse_u32("qend", fields[7])?,
            subject_start: parse_u32("sstart", fields[8])?,
            subject_end: parse_u32("send", fields[9])?,
            evalue: parse_f64("evalue", fields[10])?,
            bitscore: parse_f64("bitscore", fields[11].trim_end())?,
        })
    }

    /// Parse a hit table, transparently decompressing `.gz` files
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Hit>> {
        Self::iter_file(path)?.collect()
    }

    /// Parse hits from any BufRead source
    pub fn parse_reader<R: BufRead>(reader: R) -> Result<Vec<Hit>> {
        HitIterator::new(reader).collect()
    }

    /// Create an iterator over hits from a file
    pub fn iter_file<P: AsRef<Path>>(path: P) -> Result<HitIterator<BufReader<Box<dyn std::io::Read>>>> {
        let file = File::open(&path)
            .map_err(|e| anyhow!("Failed to open hit table {}: {}", path.as_ref().display(), e))?;
        let path_str = path.as_ref().to_string_lossy();

        let reader: Box<dyn std::io::Read> = if path_str.ends_with(".gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        Ok(HitIterator::new(BufReader::new(reader)))
    }
}

/// Iterator over hit-table rows
pub struct HitIterator<R: BufRead> {
    reader: R,
    line_buffer: String,
    line_number: usize,
}

impl<R: BufRead> HitIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for HitIterator<R> {
    type Item = Result<Hit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_buffer.clear();

            match self.reader.read_line(&mut self.line_buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.line_buffer.trim_end_matches(['\n', '\r']);

                    if line.trim().is_empty() || line.starts_with('#') {
                        continue;
                    }

                    return Some(HitTableParser::parse_line(line).map_err(|e| {
                        anyhow!("Error parsing line {}: {}", self.line_number, e)
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
