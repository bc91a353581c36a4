use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use crate::error::LoadError;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One CSV record keyed by header name, in header order.
///
/// A record shorter than the header simply lacks the trailing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(field, _)| field.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row {
            fields: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

/// Reads the whole file and decodes it as UTF-8.
pub fn load_text(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let size = bytes.len();
    let mut text = String::from_utf8(bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if text.starts_with(BYTE_ORDER_MARK) {
        text.drain(..BYTE_ORDER_MARK.len_utf8());
    }
    debug!(path = %path.display(), size, "read csv");
    Ok(text)
}

/// Parses CSV text using the first line as field names.
pub fn parse_rows(text: &str) -> Result<Vec<Row>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();

    let mut rows: Vec<Row> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(headers.iter().zip(record.iter()).collect());
    }
    Ok(rows)
}

pub fn read_rows(path: &Path) -> Result<Vec<Row>, LoadError> {
    let text = load_text(path)?;
    let rows = parse_rows(&text)?;
    info!(path = %path.display(), rows = rows.len(), "parsed csv");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rows_are_keyed_by_header() {
        let rows = parse_rows("City,County,2010\nNovato,Marin,10\nOakland,Alameda,20\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("City"), Some("Novato"));
        assert_eq!(rows[1].get("County"), Some("Alameda"));
        assert_eq!(rows[1].get("2010"), Some("20"));
        assert_eq!(
            rows[0].field_names().collect::<Vec<_>>(),
            vec!["City", "County", "2010"]
        );
    }

    #[test]
    fn quoted_fields_keep_their_commas() {
        let rows = parse_rows("City,County,2010\n\"Sonoma, City of\",Sonoma,\"1,5\"\n").unwrap();
        assert_eq!(rows[0].get("City"), Some("Sonoma, City of"));
        assert_eq!(rows[0].get("2010"), Some("1,5"));
    }

    #[test]
    fn short_records_lack_trailing_fields() {
        let rows = parse_rows("City,County,2010,2011\nNovato,Marin,10\n").unwrap();
        assert_eq!(rows[0].get("2010"), Some("10"));
        assert_eq!(rows[0].get("2011"), None);
    }

    #[test]
    fn header_names_are_trimmed_but_values_are_not() {
        let rows = parse_rows(" City , County \n Novato , Marin \n").unwrap();
        assert_eq!(rows[0].get("City"), Some(" Novato "));
        assert_eq!(rows[0].get("County"), Some(" Marin "));
    }

    #[test]
    fn empty_text_has_no_rows() {
        assert!(parse_rows("").unwrap().is_empty());
        assert!(parse_rows("City,County,2010\n").unwrap().is_empty());
    }

    #[test]
    fn load_strips_byte_order_mark() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all("\u{feff}City,County\nNovato,Marin\n".as_bytes())
            .unwrap();
        let rows = read_rows(file.path()).unwrap();
        assert_eq!(rows[0].get("City"), Some("Novato"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_text(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[b'C', b'i', 0xff, 0xfe, b'\n']).unwrap();
        let err = load_text(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }
}
