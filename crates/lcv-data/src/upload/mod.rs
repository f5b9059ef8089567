//! Star-list extraction from observation upload files
//!
//! Line-oriented report files: `#`-prefixed lines are directives or
//! comments, everything else is a delimited data row whose first field is a
//! star identifier. A `#TYPE=` directive naming a recognized report format
//! is required; without one the whole file is rejected. `#DELIM=` optionally
//! overrides the default comma delimiter.

use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use tracing::debug;

use crate::DataError;

/// Report formats accepted in the `#TYPE=` directive.
const RECOGNIZED_TYPES: [&str; 2] = ["EXTENDED", "VISUAL"];

const DEFAULT_DELIMITER: char = ',';

/// Extract the deduplicated, order-preserving star-id list from upload text.
pub fn star_ids_from_upload_text(text: &str) -> Result<Vec<String>, DataError> {
    let mut file_type: Option<String> = None;
    let mut delimiter: Option<char> = None;

    // Directives may appear anywhere; the first occurrence of each wins.
    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('#') {
            continue;
        }
        let upper = trimmed.to_ascii_uppercase();
        if file_type.is_none() && upper.starts_with("#TYPE=") {
            file_type = Some(upper["#TYPE=".len()..].trim().to_string());
        } else if delimiter.is_none() && upper.starts_with("#DELIM=") {
            delimiter = Some(parse_delimiter(&trimmed["#DELIM=".len()..]));
        }
    }

    match &file_type {
        None => {
            return Err(DataError::UploadRejected(
                "missing #TYPE= directive".to_string(),
            ))
        }
        Some(value) if !RECOGNIZED_TYPES.contains(&value.as_str()) => {
            return Err(DataError::UploadRejected(format!(
                "unrecognized report type '{value}'"
            )))
        }
        Some(_) => {}
    }

    let delimiter = delimiter.unwrap_or(DEFAULT_DELIMITER);
    let mut ids: IndexSet<String> = IndexSet::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(first) = trimmed.split(delimiter).next() {
            let id = first.trim();
            if !id.is_empty() {
                ids.insert(id.to_string());
            }
        }
    }
    debug!(count = ids.len(), "star ids extracted from upload text");
    Ok(ids.into_iter().collect())
}

/// Read an upload file from disk and extract its star-id list.
pub fn star_ids_from_upload_file(path: &Path) -> Result<Vec<String>, DataError> {
    let text = fs::read_to_string(path)?;
    star_ids_from_upload_text(&text)
}

fn parse_delimiter(value: &str) -> char {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("comma") {
        DEFAULT_DELIMITER
    } else {
        value.chars().next().unwrap_or(DEFAULT_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
#TYPE=Extended
#OBSCODE=DERA
#SOFTWARE=test harness
ST Tri,2458849.5,9.1,V
RR Lyr,2458849.6,7.2,V
ST Tri,2458850.5,9.2,V
# trailing comment
XZ Cyg,2458850.6,9.9,V
";

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let ids = star_ids_from_upload_text(REPORT).unwrap();
        assert_eq!(ids, vec!["ST Tri", "RR Lyr", "XZ Cyg"]);
    }

    #[test]
    fn test_missing_type_directive_rejects_file() {
        let text = "ST Tri,2458849.5,9.1,V\n";
        assert!(matches!(
            star_ids_from_upload_text(text),
            Err(DataError::UploadRejected(_))
        ));
    }

    #[test]
    fn test_unrecognized_type_rejects_file() {
        let text = "#TYPE=Imaginary\nST Tri,2458849.5\n";
        assert!(matches!(
            star_ids_from_upload_text(text),
            Err(DataError::UploadRejected(_))
        ));
    }

    #[test]
    fn test_type_directive_is_case_insensitive() {
        let text = "#type=visual\nST Tri,2458849.5\n";
        assert_eq!(star_ids_from_upload_text(text).unwrap(), vec!["ST Tri"]);
    }

    #[test]
    fn test_delim_directive_overrides_default() {
        let text = "#TYPE=Extended\n#DELIM=;\nST Tri;2458849.5\nRR Lyr;2458849.6\n";
        let ids = star_ids_from_upload_text(text).unwrap();
        assert_eq!(ids, vec!["ST Tri", "RR Lyr"]);
    }

    #[test]
    fn test_comma_alias() {
        let text = "#TYPE=Extended\n#DELIM=comma\nST Tri,2458849.5\n";
        assert_eq!(star_ids_from_upload_text(text).unwrap(), vec!["ST Tri"]);
    }

    #[test]
    fn test_no_data_rows_yields_empty_list() {
        let text = "#TYPE=Visual\n#DELIM=comma\n";
        assert!(star_ids_from_upload_text(text).unwrap().is_empty());
    }
}
