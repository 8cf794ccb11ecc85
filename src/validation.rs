// Validation utilities module
// Custom validators for registration fields that the derive macros cannot express

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Largest supporting document accepted (5 MiB)
pub const MAX_DOCUMENT_BYTES: i64 = 5 * 1024 * 1024;

/// Only PDF letters are accepted
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// `AOA` followed by 3 to 6 digits
const MEMBERSHIP_NUMBER_PATTERN: &str = r"^AOA[0-9]{3,6}$";

fn membership_number_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(MEMBERSHIP_NUMBER_PATTERN).ok())
        .as_ref()
}

/// Validates the association membership number format
pub fn validate_membership_number(value: &str) -> Result<(), ValidationError> {
    match membership_number_regex() {
        Some(pattern) if pattern.is_match(value.trim()) => Ok(()),
        _ => Err(ValidationError::new("invalid_membership_number")),
    }
}

/// Validates that an uploaded document is a PDF, by content type and extension
pub fn validate_pdf(file_name: &str, content_type: &str) -> Result<(), ValidationError> {
    let is_pdf_type = content_type.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE);
    let is_pdf_name = file_name
        .rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf_type && is_pdf_name {
        Ok(())
    } else {
        Err(ValidationError::new("document_must_be_pdf"))
    }
}

/// Validates that a document is non-empty and at most 5 MiB
pub fn validate_document_size(size_bytes: i64) -> Result<(), ValidationError> {
    if size_bytes <= 0 {
        Err(ValidationError::new("document_empty"))
    } else if size_bytes > MAX_DOCUMENT_BYTES {
        Err(ValidationError::new("document_too_large"))
    } else {
        Ok(())
    }
}
