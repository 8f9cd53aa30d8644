// Sciex quantitation export parser (tab-separated .txt or comma-separated .csv)

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::debug;

use super::{ParseError, Result};

/// Rows per committed insert batch.
pub const SCIEX_BATCH_SIZE: usize = 80_000;

/// Columns loaded per row; also the minimum header width.
pub const SCIEX_FIELD_COUNT: usize = 4;

/// Placeholder for fields missing from a short row.
pub const BLANK: &str = "Blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    /// Pick the delimiter from a file extension. Only `txt` and `csv` (exact
    /// case) are accepted.
    pub fn from_extension(extension: Option<&str>) -> Result<Self> {
        match extension {
            Some("txt") => Ok(Self::Tab),
            Some("csv") => Ok(Self::Comma),
            other => Err(ParseError::UnsupportedFileType(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Tab => '\t',
            Self::Comma => ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SciexRow {
    pub sample_name: String,
    pub component_name: String,
    pub actual_concentration: String,
    pub calculated_concentration: String,
}

impl SciexRow {
    /// Split one data line, right-padding with [`BLANK`] up to four fields.
    pub fn from_line(line: &str, delimiter: Delimiter, line_number: usize) -> Result<Self> {
        let mut fields: Vec<String> = line
            .trim_end()
            .split(delimiter.as_char())
            .map(str::to_string)
            .collect();

        if fields.len() > SCIEX_FIELD_COUNT {
            return Err(ParseError::TooManyFields {
                line: line_number,
                count: fields.len(),
            });
        }
        fields.resize(SCIEX_FIELD_COUNT, BLANK.to_string());

        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        Ok(Self {
            sample_name: next(),
            component_name: next(),
            actual_concentration: next(),
            calculated_concentration: next(),
        })
    }
}

/// Lazy row stream over a Sciex export.
///
/// The header is read and validated by the constructor, so a malformed file
/// fails before any row is produced.
pub struct SciexReader<R> {
    lines: Lines<R>,
    delimiter: Delimiter,
    line_number: usize,
}

impl SciexReader<BufReader<File>> {
    /// Open `path`, taking the delimiter from its extension. The extension is
    /// checked before the file is touched.
    pub fn open(path: &Path) -> Result<Self> {
        let delimiter = Delimiter::from_extension(path.extension().and_then(|e| e.to_str()))?;
        let file = File::open(path)?;
        debug!("Opened Sciex export {} ({:?})", path.display(), delimiter);
        Self::new(BufReader::new(file), delimiter)
    }
}

impl<R: BufRead> SciexReader<R> {
    pub fn new(reader: R, delimiter: Delimiter) -> Result<Self> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        let fields = header.split(delimiter.as_char()).count();
        if fields < SCIEX_FIELD_COUNT {
            return Err(ParseError::MalformedHeader { fields });
        }

        Ok(Self {
            lines,
            delimiter,
            line_number: 1,
        })
    }
}

impl<R: BufRead> Iterator for SciexReader<R> {
    type Item = Result<SciexRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        self.line_number += 1;

        Some(SciexRow::from_line(&line, self.delimiter, self.line_number))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(input: &str, delimiter: Delimiter) -> Result<SciexReader<Cursor<String>>> {
        SciexReader::new(Cursor::new(input.to_string()), delimiter)
    }

    #[test]
    fn test_delimiter_from_extension() {
        assert_eq!(Delimiter::from_extension(Some("txt")).unwrap(), Delimiter::Tab);
        assert_eq!(Delimiter::from_extension(Some("csv")).unwrap(), Delimiter::Comma);
        assert!(matches!(
            Delimiter::from_extension(Some("CSV")),
            Err(ParseError::UnsupportedFileType(ext)) if ext == "CSV"
        ));
        assert!(matches!(
            Delimiter::from_extension(None),
            Err(ParseError::UnsupportedFileType(_))
        ));
    }

    #[test]
    fn test_csv_rows() {
        let input = "Sample,Component,Actual,Calculated\nS-1,Morphine,100,98.4\nS-2,Codeine,50,51.0\n";
        let rows: Vec<_> = reader(input, Delimiter::Comma)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sample_name, "S-1");
        assert_eq!(rows[1].calculated_concentration, "51.0");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let input = "Sample\tComponent\tActual\tCalculated\nS-1\tMorphine\t\t\nS-2\n";
        let rows: Vec<_> = reader(input, Delimiter::Tab)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            rows[0],
            SciexRow {
                sample_name: "S-1".to_string(),
                component_name: "Morphine".to_string(),
                actual_concentration: BLANK.to_string(),
                calculated_concentration: BLANK.to_string(),
            }
        );
        assert_eq!(rows[1].component_name, BLANK);
    }

    #[test]
    fn test_interior_empty_field_is_kept() {
        let row = SciexRow::from_line("S-1,,10,11", Delimiter::Comma, 2).unwrap();
        assert_eq!(row.component_name, "");
        assert_eq!(row.calculated_concentration, "11");
    }

    #[test]
    fn test_three_column_header_rejected() {
        let input = "Sample,Component,Actual\nS-1,Morphine,100,98.4\n";
        assert!(matches!(
            reader(input, Delimiter::Comma),
            Err(ParseError::MalformedHeader { fields: 3 })
        ));
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(matches!(
            reader("", Delimiter::Tab),
            Err(ParseError::MalformedHeader { fields: 1 })
        ));
    }

    #[test]
    fn test_wide_row_rejected() {
        let input = "a,b,c,d\nS-1,Morphine,100,98.4,extra\n";
        let results: Vec<_> = reader(input, Delimiter::Comma).unwrap().collect();
        assert!(matches!(
            results[0],
            Err(ParseError::TooManyFields { line: 2, count: 5 })
        ));
    }

    #[test]
    fn test_open_rejects_extension_before_reading() {
        let missing = Path::new("/nonexistent/results.xlsx");
        assert!(matches!(
            SciexReader::open(missing),
            Err(ParseError::UnsupportedFileType(ext)) if ext == "xlsx"
        ));
    }
}
