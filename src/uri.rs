//! Final request URI construction.
//!
//! `base + endpoint path (trailing '/') + endpoint query + lc=<locale>`.
//! The caller's query segments are kept verbatim, in order; only an existing
//! `lc` segment is replaced.

use reqwest::Url;

use crate::error::PlatformError;

/// Resolve `endpoint` against `base` and qualify it with `locale`.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidUri`] if the joined URI does not parse.
pub fn resolve_uri(base: &str, endpoint: &str, locale: &str) -> Result<Url, PlatformError> {
    let (path, query) = match endpoint.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (endpoint, None),
    };

    let mut joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    if !joined.ends_with('/') {
        joined.push('/');
    }

    let mut url = Url::parse(&joined).map_err(|e| PlatformError::InvalidUri(format!("{joined}: {e}")))?;

    let locale_segment = format!("lc={locale}");
    let mut segments: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_locale_segment(segment))
        .collect();
    segments.push(&locale_segment);
    url.set_query(Some(&segments.join("&")));

    Ok(url)
}

fn is_locale_segment(segment: &str) -> bool {
    segment == "lc" || segment.starts_with("lc=")
}

#[cfg(test)]
#[path = "uri_test.rs"]
mod tests;
