//! Methods for reading and writing the delimiter separated reference and input tables.

use std::{
    borrow::Cow,
    fs::File,
    io::{BufRead, BufReader, Write},
    ops::Range,
    path::Path,
    str::FromStr,
    sync::Arc,
};

use context_error::*;
use flate2::bufread::GzDecoder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnnotationError, AnnotationErrorKind},
    helper_functions::check_extension,
};

/// A single line in a CSV file
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct CsvLine {
    line_index: usize,
    line: String,
    fields: Vec<(Arc<String>, Range<usize>)>,
    original_headers: Arc<Vec<String>>,
}

impl CsvLine {
    /// Get the line index (0 based)
    pub const fn line_index(&self) -> usize {
        self.line_index
    }

    /// Get the full line
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Get the column headers
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.0.as_str())
    }

    /// Get the column values together with their header
    pub fn values(&self) -> impl Iterator<Item = (Arc<String>, &str)> {
        self.fields
            .iter()
            .map(|f| (f.0.clone(), &self.line[f.1.clone()]))
    }

    /// Get the column values together with their header as written in the file
    pub fn original_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.original_headers
            .iter()
            .zip(&self.fields)
            .map(|(header, f)| (header.as_str(), &self.line[f.1.clone()]))
    }

    /// Get the number of columns
    pub fn number_of_columns(&self) -> usize {
        self.fields.len()
    }

    /// Get the context applicable to the specified column
    pub fn column_context(&self, column: usize) -> Context<'_> {
        Context::line_with_comment(
            Some(self.line_index as u32),
            &self.line,
            self.fields[column].1.start,
            self.fields[column].1.len(),
            Some(Cow::Borrowed(self.fields[column].0.as_str())),
        )
    }

    /// Get the context for the whole line
    pub fn full_context(&self) -> Context<'_> {
        Context::full_line(self.line_index as u32, &self.line)
    }

    /// Get the index of the specified column, by column name (case insensitive)
    /// # Errors
    /// If the given name is not a column header return an error
    pub fn column_index(&self, name: &str) -> Result<usize, AnnotationError> {
        let name = name.to_lowercase();
        self.fields
            .iter()
            .position(|f| *f.0 == name)
            .ok_or_else(|| {
                BoxedError::new(
                    AnnotationErrorKind::Parse,
                    "Could not find given column",
                    format!("This file does not contain the needed column '{name}'"),
                    self.full_context().to_owned(),
                )
            })
    }

    /// Get the specified column, by column name (case insensitive)
    /// # Errors
    /// If the given name is not a column header return an error
    pub fn index_column(&self, name: &str) -> Result<&str, AnnotationError> {
        self.column_index(name).map(|index| &self[index])
    }

    /// Parse a column into the given format
    /// # Errors
    /// If the column does not exist or the text could not be parsed.
    pub fn parse_column<F: FromStr>(&self, name: &str) -> Result<F, AnnotationError> {
        let index = self.column_index(name)?;
        self[index].parse().map_err(|_| {
            BoxedError::new(
                AnnotationErrorKind::Parse,
                "Invalid column value",
                format!("The value in column '{name}' could not be parsed"),
                self.column_context(index).to_owned(),
            )
        })
    }
}

impl std::ops::Index<usize> for CsvLine {
    type Output = str;
    fn index(&self, index: usize) -> &str {
        &self.line[self.fields[index].1.clone()]
    }
}

/// Parse a CSV file into an iterator with the parsed lines. Files ending in `.gz` are decompressed.
/// # Errors
/// If the file cannot be opened it returns `Err` with the error.
/// If any single line cannot be read it returns an error for that line.
pub fn parse_csv(
    path: impl AsRef<Path>,
    separator: u8,
    provided_header: Option<Vec<String>>,
) -> Result<Box<dyn Iterator<Item = Result<CsvLine, AnnotationError>>>, AnnotationError> {
    let file = File::open(path.as_ref()).map_err(|e| {
        BoxedError::new(
            AnnotationErrorKind::Io,
            "Could not open file",
            e.to_string(),
            Context::default()
                .source(path.as_ref().to_string_lossy())
                .to_owned(),
        )
    })?;
    if check_extension(&path, "gz") {
        Ok(Box::new(parse_csv_raw(
            GzDecoder::new(BufReader::new(file)),
            separator,
            provided_header,
        )?))
    } else {
        Ok(Box::new(parse_csv_raw(file, separator, provided_header)?))
    }
}

/// Parse a CSV file from a raw reader
/// # Errors
/// If no header is provided and the first line could not be read as a header line.
pub fn parse_csv_raw<T: std::io::Read>(
    reader: T,
    separator: u8,
    provided_header: Option<Vec<String>>,
) -> Result<CsvLineIter<T>, AnnotationError> {
    let reader = BufReader::new(reader);
    let mut lines = reader.lines().enumerate().peekable();
    let original_headers: Vec<String> = if let Some(header) = provided_header {
        header
    } else {
        let (_, column_headers) = lines.next().ok_or_else(|| {
            BoxedError::new(
                AnnotationErrorKind::Parse,
                "Could not parse file",
                "The file is empty",
                Context::none(),
            )
        })?;
        let header_line = column_headers.map_err(|err| {
            BoxedError::new(
                AnnotationErrorKind::Io,
                "Could not read header line",
                err.to_string(),
                Context::none(),
            )
        })?;
        csv_separate(&header_line, separator)?
            .into_iter()
            .map(|r| header_line[r].to_string())
            .collect()
    };

    Ok(CsvLineIter {
        lines,
        header: original_headers
            .iter()
            .map(|h| Arc::new(h.to_lowercase()))
            .collect(),
        original_header: Arc::new(original_headers),
        separator,
    })
}

/// An iterator returning CSV lines, empty lines are skipped
#[derive(Debug)]
pub struct CsvLineIter<T: std::io::Read> {
    lines: std::iter::Peekable<std::iter::Enumerate<std::io::Lines<BufReader<T>>>>,
    header: Vec<Arc<String>>,
    original_header: Arc<Vec<String>>,
    separator: u8,
}

impl<T: std::io::Read> CsvLineIter<T> {
    /// The (lowercased) column headers of this file
    pub fn header(&self) -> &[Arc<String>] {
        &self.header
    }

    /// The column headers of this file as written in the file
    pub fn original_header(&self) -> &[String] {
        &self.original_header
    }

    fn parse_line(
        &self,
        line_index: usize,
        line: std::io::Result<String>,
    ) -> Result<CsvLine, AnnotationError> {
        let line = line.map_err(|err| {
            BoxedError::new(
                AnnotationErrorKind::Io,
                "Could not read line",
                err.to_string(),
                Context::default().line_index(line_index as u32),
            )
        })?;
        let row = csv_separate(&line, self.separator)?;
        if self.header.len() == row.len() {
            Ok(CsvLine {
                line_index,
                line,
                fields: self.header.iter().cloned().zip(row).collect(),
                original_headers: self.original_header.clone(),
            })
        } else {
            Err(BoxedError::new(
                AnnotationErrorKind::Parse,
                "Incorrect number of columns",
                format!(
                    "It does not have the correct number of columns. {} columns were expected but {} were found.",
                    self.header.len(),
                    row.len()
                ),
                Context::full_line(line_index as u32, line),
            ))
        }
    }
}

impl<T: std::io::Read> Iterator for CsvLineIter<T> {
    type Item = Result<CsvLine, AnnotationError>;
    fn next(&mut self) -> Option<Self::Item> {
        let (line_index, line) = self
            .lines
            .find(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()))?;
        Some(self.parse_line(line_index, line))
    }
}

/// Split a line into the ranges of its fields, quoted fields are supported
/// # Errors
/// If the line is empty.
pub(crate) fn csv_separate(line: &str, separator: u8) -> Result<Vec<Range<usize>>, AnnotationError> {
    if line.is_empty() {
        return Err(BoxedError::new(
            AnnotationErrorKind::Parse,
            "Empty line",
            "The line is empty",
            Context::none(),
        ));
    }
    let mut enclosed = None;
    let mut was_enclosed = false;
    let mut row = Vec::new();
    let mut start = None;
    let mut last_non_whitespace = None;
    for (index, ch) in line.bytes().enumerate() {
        match (ch, enclosed, start) {
            (b'\"' | b'\'', None, None) => {
                enclosed = Some(ch);
                start = Some(index + 1);
            }
            (c, Some(e), Some(s)) if c == e => {
                enclosed = None;
                row.push(s..index);
                start = None;
                last_non_whitespace = None;
                was_enclosed = true;
            }
            (sep, None, Some(s)) if sep == separator => {
                row.push(s..last_non_whitespace.unwrap_or(index));
                start = None;
                last_non_whitespace = None;
                was_enclosed = false;
            }
            (sep, None, None) if sep == separator => {
                if !was_enclosed {
                    row.push(index..index);
                }
                was_enclosed = false;
            }
            (c, None, _) if c.is_ascii_whitespace() => (),
            (_, _, None) => {
                start = Some(index);
                last_non_whitespace = Some(index + 1);
            }
            _ => last_non_whitespace = Some(index + 1),
        }
    }
    if let Some(s) = start {
        row.push(s..last_non_whitespace.unwrap_or(line.len()));
    } else if !was_enclosed {
        row.push(line.len()..line.len());
    }
    Ok(row)
}

/// Write a CSV file. It fills empty columns with empty space, ensures the correct amount of columns
/// on each line, and wraps any separator containing values and headers in double quotes (").
/// The column order is the order of first appearance.
/// # Errors
/// If the `Write` implementation errors.
pub fn write_csv(
    mut f: impl Write,
    data: impl IntoIterator<Item = impl IntoIterator<Item = (String, String)>>,
    separator: char,
) -> Result<(), std::io::Error> {
    let mut order: Vec<String> = Vec::new();
    let sorted: Vec<Vec<String>> = data
        .into_iter()
        .map(|row| {
            let mut new_row = vec![String::new(); order.len()];
            for (mut column, mut value) in row {
                if value.contains(separator) {
                    value = format!("\"{}\"", value.replace('\"', "\'"));
                }
                if let Some(index) = order.iter().position(|i| *i == column) {
                    new_row[index] = value;
                } else {
                    if column.contains(separator) {
                        column = format!("\"{}\"", column.replace('\"', "\'"));
                    }
                    order.push(column);
                    new_row.push(value);
                }
            }
            new_row
        })
        .collect_vec();
    let separator = separator.to_string();
    writeln!(f, "{}", order.iter().join(&separator))?;
    for row in sorted {
        let len = order.len() - row.len();
        writeln!(
            f,
            "{}",
            row.into_iter()
                .chain(std::iter::repeat_n(String::new(), len))
                .join(&separator)
        )?;
    }
    Ok(())
}

/// Read all lines of a tab separated reference table from the given reader, for reference
/// tables embedded in memory or tests. The first line is the header.
/// # Errors
/// If the header or any line could not be read.
pub fn read_tsv(reader: impl BufRead) -> Result<Vec<CsvLine>, AnnotationError> {
    parse_csv_raw(reader, b'\t', None)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separate_fields() {
        let line = "Q86U42\t\"A;B\"\t\t3";
        let row = csv_separate(line, b'\t').unwrap();
        let fields: Vec<&str> = row.into_iter().map(|r| &line[r]).collect();
        assert_eq!(fields, vec!["Q86U42", "A;B", "", "3"]);
    }

    #[test]
    fn read_table() {
        let lines = read_tsv("Kinase\tScore\nAAK1\t0.5\n\nACVR2A\t-1\n".as_bytes()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].index_column("kinase").unwrap(), "AAK1");
        assert_eq!(lines[1].parse_column::<f64>("Score").unwrap(), -1.0);
        assert!(lines[1].index_column("Position").is_err());
    }

    #[test]
    fn header_case_is_kept() {
        let lines = read_tsv("Proteins\tModified sequence\nP1\tGRST(ph)SPR\n".as_bytes()).unwrap();
        assert_eq!(lines[0].headers().collect_vec(), vec!["proteins", "modified sequence"]);
        assert_eq!(
            lines[0].original_values().collect_vec(),
            vec![("Proteins", "P1"), ("Modified sequence", "GRST(ph)SPR")]
        );
        let iter = parse_csv_raw(
            "P1\tGRSPR\n".as_bytes(),
            b'\t',
            Some(vec!["Proteins".to_string(), "Sequence".to_string()]),
        )
        .unwrap();
        assert_eq!(iter.original_header(), ["Proteins", "Sequence"]);
        assert_eq!(iter.header()[0].as_str(), "proteins");
    }

    #[test]
    fn wrong_column_count() {
        let result = read_tsv("Kinase\tScore\nAAK1\n".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn write_table() {
        let mut out = Vec::new();
        write_csv(
            &mut out,
            vec![
                vec![("a".to_string(), "1".to_string())],
                vec![
                    ("a".to_string(), "2".to_string()),
                    ("b".to_string(), "x\ty".to_string()),
                ],
            ],
            '\t',
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\tb\n1\t\n2\t\"x\ty\"\n");
    }
}
