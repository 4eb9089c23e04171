//! Delimited-file loading.
//!
//! Sources are decoded from their declared encoding into UTF-8 first and
//! then parsed by polars, so Latin-1 exports load without mangling accented
//! country names.

use crate::config::LoadOptions;
use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, error, info};

/// Cell contents read as missing in every column, besides the empty cell.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a delimited file into a table.
///
/// # Errors
///
/// * [`AnalysisError::NotFound`] if `path` does not exist.
/// * [`AnalysisError::Load`] if the file cannot be read, is not valid in the
///   declared encoding, or cannot be parsed.
pub fn load_csv(path: impl AsRef<Path>, options: &LoadOptions) -> Result<DataFrame> {
    let path = path.as_ref();
    let source_name = path.display().to_string();

    if !path.exists() {
        error!("Error: File not found at {}", source_name);
        return Err(AnalysisError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| {
        error!("An error occurred while loading the data: {}", e);
        AnalysisError::load(&source_name, e)
    })?;

    parse_bytes(&bytes, options, &source_name)
}

/// Load a delimited byte stream into a table.
///
/// `source_name` is only used in log lines and error messages.
pub fn load_reader<R: Read>(
    mut reader: R,
    options: &LoadOptions,
    source_name: &str,
) -> Result<DataFrame> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| AnalysisError::load(source_name, e))?;
    parse_bytes(&bytes, options, source_name)
}

fn parse_bytes(bytes: &[u8], options: &LoadOptions, source_name: &str) -> Result<DataFrame> {
    let delimiter = options
        .delimiter_byte()
        .map_err(|e| AnalysisError::load(source_name, e))?;
    let encoding = options
        .resolve_encoding()
        .map_err(|e| AnalysisError::load(source_name, e))?;

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        error!(
            "An error occurred while loading the data: input is not valid {}",
            encoding.name()
        );
        return Err(AnalysisError::load(
            source_name,
            format!("input is not valid {}", encoding.name()),
        ));
    }
    debug!("Decoded {} bytes as {}", bytes.len(), encoding.name());

    let cursor = Cursor::new(text.into_owned().into_bytes());
    let null_values: Vec<PlSmallStr> = NA_TOKENS.iter().map(|t| PlSmallStr::from(*t)).collect();

    let df = CsvReadOptions::default()
        .with_has_header(options.header_row.is_some())
        .with_skip_rows(options.header_row.unwrap_or(0))
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(NullValues::AllColumns(null_values))),
        )
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| {
            error!("An error occurred while loading the data: {}", e);
            AnalysisError::load(source_name, e)
        })?;

    info!(
        "Data loaded successfully with {} rows and {} columns.",
        df.height(),
        df.width()
    );

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use crate::utils::column_categories;

    #[test]
    fn test_load_semicolon_latin1() {
        let bytes: &[u8] = b"Country;Region;Start Year\nC\xf4te d'Ivoire;Africa;2001\nPeru;Americas;2002\n";
        let df = load_reader(bytes, &LoadOptions::default(), "inline").unwrap();

        assert_eq!(df.shape(), (2, 3));
        let countries = column_categories(&df, "Country").unwrap();
        assert_eq!(countries[0], Category::text("Côte d'Ivoire"));
        let years = column_categories(&df, "Start Year").unwrap();
        assert_eq!(years, vec![Category::Int(2001), Category::Int(2002)]);
    }

    #[test]
    fn test_load_comma_utf8_with_empty_cells() {
        let bytes = "Disaster Type,Region\nFlood,\nStorm,Asia\n".as_bytes();
        let df = load_reader(bytes, &LoadOptions::comma_utf8(), "inline").unwrap();

        assert_eq!(df.shape(), (2, 2));
        let regions = column_categories(&df, "Region").unwrap();
        assert_eq!(regions[0], Category::Missing);
    }

    #[test]
    fn test_na_tokens_load_as_missing() {
        let bytes = "Note;Magnitude\nNA;N/A\nN/A;6.5\nok;nan\nNA;\n".as_bytes();
        let df = load_reader(bytes, &LoadOptions::default(), "inline").unwrap();

        let report = crate::cleaner::missing_report(&df);
        assert_eq!(report[0].missing_count, 3);
        assert_eq!(report[1].missing_count, 3);
        assert_eq!(
            column_categories(&df, "Note").unwrap(),
            vec![
                Category::Missing,
                Category::Missing,
                Category::text("ok"),
                Category::Missing
            ]
        );
    }

    #[test]
    fn test_latin1_label_spellings_load() {
        let bytes: &[u8] = b"Country\nS\xe3o Tom\xe9\n";
        for label in ["latin-1", "latin_1", "ISO8859-1"] {
            let options = LoadOptions::default().with_encoding(label);
            let df = load_reader(bytes, &options, "inline").unwrap();
            assert_eq!(
                column_categories(&df, "Country").unwrap(),
                vec![Category::text("São Tomé")]
            );
        }
    }

    #[test]
    fn test_header_row_skips_preamble() {
        let bytes = "exported 2024-08-23\nType;Year\nFlood;2000\n".as_bytes();
        let options = LoadOptions::default().with_header_row(Some(1));
        let df = load_reader(bytes, &options, "inline").unwrap();

        assert_eq!(df.shape(), (1, 2));
        assert!(df.column("Type").is_ok());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = load_csv("definitely/not/here.csv", &LoadOptions::default());
        assert!(matches!(result, Err(AnalysisError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_utf8_is_load_error() {
        let bytes: &[u8] = b"Type,Year\nFl\xffod,2000\n";
        let options = LoadOptions::comma_utf8();
        let result = load_reader(bytes, &options, "broken.csv");
        match result {
            Err(AnalysisError::Load { source_name, .. }) => assert_eq!(source_name, "broken.csv"),
            other => panic!("expected load error, got {:?}", other.map(|df| df.shape())),
        }
    }

    #[test]
    fn test_ragged_rows_are_load_error() {
        let bytes = "Type,Year\nFlood,2000,extra,fields\n".as_bytes();
        let result = load_reader(bytes, &LoadOptions::comma_utf8(), "ragged.csv");
        assert!(matches!(result, Err(AnalysisError::Load { .. })));
    }
}
