//! Schema checks shared by every record kind.

use crate::error::ValidationError;

/// Declarative shape and constraint check of a record.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Records an issue unless `value`, trimmed, has between `min` and `max` characters.
pub fn check_length(errors: &mut ValidationError, field: &str, value: &str, min: usize, max: usize) {
    let len = value.trim().chars().count();
    if len == 0 && min > 0 {
        errors.push(field, "is required");
    } else if len < min {
        errors.push(field, format!("must be at least {min} characters"));
    } else if len > max {
        errors.push(field, format!("must be at most {max} characters"));
    }
}

/// Like [`check_length`] for optional fields; `None` always passes.
pub fn check_optional_length(
    errors: &mut ValidationError,
    field: &str,
    value: Option<&str>,
    max: usize,
) {
    if let Some(value) = value {
        check_length(errors, field, value, 0, max);
    }
}

/// Records an issue unless `url` is an absolute http(s) URL with a host.
pub fn check_url(errors: &mut ValidationError, field: &str, url: &str) {
    if let Err(message) = validate_url(url) {
        errors.push(field, message);
    }
}

fn validate_url(url: &str) -> Result<(), String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(format!("URL must have a valid scheme and host: {url}"));
    };

    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(format!("URL scheme must be http or https: {scheme}"));
    }

    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('@')
        .next()
        .unwrap_or_default();
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(format!("URL must have a valid scheme and host: {url}"));
    }

    Ok(())
}
