//! Olympus drug-screen log parser.
//!
//! # Line grammar
//!
//! ```text
//! line    := ident name* MARKER (value index?)*
//! ident   := accession specimen      ; one token, specimen is its last character
//! MARKER  := "01"                    ; first token equal to "01"
//! value   := token                   ; even positions after the marker
//! index   := token                   ; odd positions, instrument channel number
//! ```
//!
//! Tokens are separated by runs of whitespace. Name tokens have commas turned
//! into spaces and are re-joined with single spaces, so `DOE,JOHN` becomes
//! `DOE JOHN`. Exactly one value per [`Analyte`] is required, in the fixed
//! order of [`Analyte::ALL`]. Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::{ParseError, Result};

/// Rows per committed insert batch.
pub const OLYMPUS_BATCH_SIZE: usize = 10_000;

/// Token separating the patient name from the concentration pairs.
pub const MARKER: &str = "01";

/// Extension (compared case-insensitively) accepted for Olympus uploads.
pub const OLYMPUS_EXTENSION: &str = "log";

/// Analytes reported by the instrument, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analyte {
    Amphetamine,
    Barbiturates,
    Benzodiazepine,
    Cocaine,
    Methadone,
    Opiates,
    Oxycodone,
    Phencyclidine,
    ThcCooh,
    EcstasyMdma,
}

impl Analyte {
    pub const ALL: [Analyte; 10] = [
        Analyte::Amphetamine,
        Analyte::Barbiturates,
        Analyte::Benzodiazepine,
        Analyte::Cocaine,
        Analyte::Methadone,
        Analyte::Opiates,
        Analyte::Oxycodone,
        Analyte::Phencyclidine,
        Analyte::ThcCooh,
        Analyte::EcstasyMdma,
    ];

    /// Column holding this analyte in both the ingestion and report tables
    pub fn column(self) -> &'static str {
        match self {
            Analyte::Amphetamine => "amphetamine",
            Analyte::Barbiturates => "barbiturates",
            Analyte::Benzodiazepine => "benzodiazepine",
            Analyte::Cocaine => "cocaine",
            Analyte::Methadone => "methadone",
            Analyte::Opiates => "opiates",
            Analyte::Oxycodone => "oxycodone",
            Analyte::Phencyclidine => "phencyclidine_pcp",
            Analyte::ThcCooh => "thc_cooh",
            Analyte::EcstasyMdma => "ecstacy_mdma",
        }
    }

    /// Human-readable name used in reports
    pub fn label(self) -> &'static str {
        match self {
            Analyte::Amphetamine => "Amphetamine",
            Analyte::Barbiturates => "Barbiturates",
            Analyte::Benzodiazepine => "Benzodiazepine",
            Analyte::Cocaine => "Cocaine",
            Analyte::Methadone => "Methadone",
            Analyte::Opiates => "Opiates",
            Analyte::Oxycodone => "Oxycodone",
            Analyte::Phencyclidine => "Phencyclidine (PCP)",
            Analyte::ThcCooh => "THC-COOH",
            Analyte::EcstasyMdma => "Ecstasy (MDMA)",
        }
    }
}

/// One instrument run, ready for the `olympus` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OlympusRow {
    pub accession_number: String,
    pub specimen_type: String,
    pub patient_name: String,
    /// Raw concentration tokens, indexed like [`Analyte::ALL`]
    pub concentrations: [String; 10],
}

impl OlympusRow {
    pub fn concentration(&self, analyte: Analyte) -> &str {
        &self.concentrations[analyte as usize]
    }
}

/// Why a single log line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OlympusLineError {
    #[error("leading token {0:?} is too short to hold an accession number and a specimen type")]
    ShortIdentifier(String),

    #[error("no \"01\" marker after the patient name")]
    MissingMarker,

    #[error("expected {expected} concentration values, found {found}")]
    AnalyteCount { expected: usize, found: usize },
}

/// Parse one non-blank log line.
pub fn parse_line(line: &str) -> std::result::Result<OlympusRow, OlympusLineError> {
    let mut tokens = line.split_whitespace();

    let ident = tokens.next().unwrap_or_default();
    let mut ident_chars = ident.char_indices();
    let (split_at, _) = ident_chars
        .next_back()
        .ok_or_else(|| OlympusLineError::ShortIdentifier(ident.to_string()))?;
    if split_at == 0 {
        return Err(OlympusLineError::ShortIdentifier(ident.to_string()));
    }
    let (accession_number, specimen_type) = ident.split_at(split_at);

    let mut name_parts = Vec::new();
    let mut found_marker = false;
    for token in tokens.by_ref() {
        if token == MARKER {
            found_marker = true;
            break;
        }
        name_parts.push(token);
    }
    if !found_marker {
        return Err(OlympusLineError::MissingMarker);
    }

    let patient_name = name_parts
        .join(" ")
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let values: Vec<String> = tokens.step_by(2).map(str::to_string).collect();
    let found = values.len();
    let concentrations =
        <[String; 10]>::try_from(values).map_err(|_| OlympusLineError::AnalyteCount {
            expected: Analyte::ALL.len(),
            found,
        })?;

    Ok(OlympusRow {
        accession_number: accession_number.to_string(),
        specimen_type: specimen_type.to_string(),
        patient_name,
        concentrations,
    })
}

/// Lazy row stream over an Olympus log.
///
/// Yields one `Result` per non-blank line; a malformed line yields
/// [`ParseError::Olympus`] carrying its 1-based line number.
pub struct OlympusReader<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl OlympusReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        debug!("Opened Olympus log {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> OlympusReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for OlympusReader<R> {
    type Item = Result<OlympusRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(parse_line(&line).map_err(|kind| ParseError::Olympus {
                line: self.line_number,
                kind,
            }));
        }
    }
}

/// Whether `extension` is accepted for an Olympus upload.
pub fn is_supported_extension(extension: Option<&str>) -> bool {
    extension.is_some_and(|ext| ext.eq_ignore_ascii_case(OLYMPUS_EXTENSION))
}
