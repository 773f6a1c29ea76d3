//! Text field validation shared by every domain crate.

use crate::error::{DomainError, DomainResult};

/// Trim `value` and check its length (in chars) lies in `min..=max`.
///
/// Returns the trimmed string on success.
pub fn bounded(field: &'static str, value: &str, min: usize, max: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(if min == 1 {
            DomainError::validation(field, "must not be empty")
        } else {
            DomainError::validation(field, format!("must be at least {min} characters"))
        });
    }
    if len > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`bounded`], but `None` and blank strings map to `None`.
pub fn optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> DomainResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => bounded(field, v, 1, max).map(Some),
    }
}

/// Accept only absolute http(s) URLs.
pub fn http_url(field: &'static str, value: &str) -> DomainResult<String> {
    let url = bounded(field, value, 1, 2048)?;
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| DomainError::validation(field, "must start with http:// or https://"))?;
    if rest.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err(DomainError::validation(field, "is not a valid URL"));
    }
    Ok(url)
}
