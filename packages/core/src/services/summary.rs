//! Summary Tag Construction
//!
//! Builds the short tag strings shown next to a matched entity. Each
//! configured field path contributes exactly one tag, whether or not
//! the document carries that field.

use crate::models::Document;

/// Tag text for a configured path the document does not contain.
pub const MISSING_FIELD_TEXT: &str = "N/A";

/// Build summary tags for a document.
///
/// `field_paths` is a comma-delimited list of dotted paths; segments
/// are trimmed and empty entries dropped. Values render with the same
/// canonical text used by the details tree, so a date field shows its
/// RFC 3339 form and a container its compact JSON. A missing path
/// yields [`MISSING_FIELD_TEXT`].
pub fn summarize(document: &Document, field_paths: &str, include_field_name: bool) -> Vec<String> {
    field_paths
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(|path| {
            let value = document
                .get_path(path)
                .map(|v| v.display_text())
                .unwrap_or_else(|| MISSING_FIELD_TEXT.to_string());
            if include_field_name {
                format!("{}: {}", path, value)
            } else {
                value
            }
        })
        .collect()
}

// Include tests
#[cfg(test)]
#[path = "summary_test.rs"]
mod summary_test;
