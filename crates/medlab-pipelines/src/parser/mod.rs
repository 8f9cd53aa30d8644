//! Instrument file parsers
//!
//! Each parser turns one instrument's output format into typed rows. The
//! line-oriented formats (Olympus, Sciex) stream rows lazily so the loader can
//! bound memory with [`batch::BatchExt`]; a FilmArray message is a single XML
//! document and is read whole into a [`film_array::FilmArrayRun`] tree.

use thiserror::Error;

pub mod batch;
pub mod film_array;
pub mod olympus;
pub mod sciex;

pub use batch::{BatchExt, Batches};
pub use olympus::OlympusLineError;

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Olympus line {line}: {kind}")]
    Olympus { line: usize, kind: OlympusLineError },

    #[error("Not supported file type: {0:?}")]
    UnsupportedFileType(String),

    #[error(
        "Malformed header: found {fields} field(s), expected at least {} \
         (TXT tab separated, CSV comma separated)",
        sciex::SCIEX_FIELD_COUNT
    )]
    MalformedHeader { fields: usize },

    #[error("Sciex line {line}: found {count} fields, expected at most {}", sciex::SCIEX_FIELD_COUNT)]
    TooManyFields { line: usize, count: usize },

    #[error("XML error: {0}")]
    Xml(String),
}

impl From<quick_xml::DeError> for ParseError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Xml(err.to_string())
    }
}
