//! Field validators shared by every record type.

use crate::ModelError;

/// Bucket names follow the S3 length limits.
const BUCKET_NAME_MIN: usize = 3;
const BUCKET_NAME_MAX: usize = 63;

/// Check that `value` has between `min` and `max` characters (inclusive).
pub fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ModelError> {
    let len = value.chars().count();
    if len < min {
        return Err(ModelError::invalid(
            field,
            format!("must be at least {min} characters (got {len})"),
        ));
    }
    if len > max {
        return Err(ModelError::invalid(
            field,
            format!("must be at most {max} characters (got {len})"),
        ));
    }
    Ok(())
}

/// Check a staging/production bucket name.
pub fn validate_bucket_name(field: &'static str, value: &str) -> Result<(), ModelError> {
    validate_length(field, value, BUCKET_NAME_MIN, BUCKET_NAME_MAX)?;
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if !valid_chars {
        return Err(ModelError::invalid(
            field,
            "may only contain lowercase letters, digits, '-' and '.'",
        ));
    }
    Ok(())
}

/// Check a filename written into the site tree: 1 to 150 characters, no
/// directory separators, and not `.` or `..`.
pub fn validate_filename(field: &'static str, value: &str) -> Result<(), ModelError> {
    validate_length(field, value, 1, 150)?;
    if value.contains(['/', '\\']) {
        return Err(ModelError::invalid(
            field,
            format!("must not contain a directory: {value}"),
        ));
    }
    if value == "." || value == ".." {
        return Err(ModelError::invalid(field, format!("is not a file name: {value}")));
    }
    Ok(())
}
