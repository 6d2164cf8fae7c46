//! CSV source parser with encoding and delimiter auto-detection.
//!
//! Turns the translation table into [`TabularRecord`]s. The first header
//! column names the key column, every other column is a language code.
//! Keys and cell values are kept verbatim; only header names are trimmed.
//! Every row must have as many cells as the header.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{LanguageCode, TabularRecord};

/// Delimiters tried during detection, in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Parsed CSV source with detection metadata
#[derive(Debug, Clone)]
pub struct TabularSource {
    /// Name of the first header column
    pub key_column: String,
    /// Language columns in header order, normalized and deduplicated
    pub languages: Vec<LanguageCode>,
    /// Data rows, in file order
    pub records: Vec<TabularRecord>,
    /// Raw header row
    pub headers: Vec<String>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// A leading byte order mark is dropped. Latin-1 labels decode as
/// Windows-1252, its superset. Unknown encodings fall back to UTF-8, which
/// must then be valid.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::Encoding(format!("{} (detected {})", e, encoding)))?,
    };

    Ok(match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    })
}

/// Detect the delimiter by counting occurrences in the header line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0;

    for &sep in &CANDIDATE_DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use csv2i18n::parse_source_str;
///
/// let source = parse_source_str("key,en,fr\ngreeting,hello,bonjour", ',').unwrap();
/// assert_eq!(source.records[0].key, "greeting");
/// ```
pub fn parse_source_str(content: &str, delimiter: char) -> CsvResult<TabularSource> {
    parse_with_metadata(content, delimiter, "utf-8".to_string())
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_source_file<P: AsRef<Path>>(path: P) -> CsvResult<TabularSource> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
///
/// Bytes that are valid UTF-8 are always read as UTF-8; chardet is only
/// consulted otherwise.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<TabularSource> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CsvError::EmptyFile);
    }

    let encoding = match std::str::from_utf8(bytes) {
        Ok(_) => "utf-8".to_string(),
        Err(_) => detect_encoding(bytes),
    };
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_with_metadata(&content, delimiter, encoding)
}

fn parse_with_metadata(content: &str, delimiter: char, encoding: String) -> CsvResult<TabularSource> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter)
        .map_err(|_| CsvError::Parse(format!("delimiter '{}' is not a single byte", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let key_column = match headers.first() {
        Some(k) if !k.is_empty() => k.clone(),
        _ => return Err(CsvError::NoHeaders),
    };

    // (column index, language); the first of duplicated columns wins
    let mut columns: Vec<(usize, LanguageCode)> = Vec::new();
    for (idx, header) in headers.iter().enumerate().skip(1) {
        if header.is_empty() {
            continue;
        }
        let lang = LanguageCode::new(header);
        if !columns.iter().any(|(_, l)| *l == lang) {
            columns.push((idx, lang));
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let key = row.get(0).unwrap_or("");
        if key.trim().is_empty() {
            continue;
        }

        let mut record = TabularRecord::new(key);
        for (idx, lang) in &columns {
            let value = row.get(*idx).unwrap_or("");
            record.values.insert(lang.clone(), value.to_string());
        }
        records.push(record);
    }

    Ok(TabularSource {
        key_column,
        languages: columns.into_iter().map(|(_, lang)| lang).collect(),
        records,
        headers,
        encoding,
        delimiter,
    })
}
