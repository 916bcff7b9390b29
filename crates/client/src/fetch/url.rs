//! Request URL canonicalization.
//!
//! Cache keys are built from the canonical form, so two spellings of the same
//! resource (`/a#top` vs `/a`, `HTTPS://Store.Example:443/a` vs
//! `https://store.example/a`) must come out identical.

use url::Url;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("relative URL without an origin: {0}")]
    NoOrigin(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Turn `input` into the absolute URL a browser would request.
///
/// Absolute http(s) URLs are parsed as-is. Anything else without a scheme is
/// resolved against `origin` (the storefront). Host case and default ports
/// are normalized by the parser; the fragment is dropped and the query is
/// kept byte-for-byte.
pub fn canonicalize(input: &str, origin: Option<&Url>) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut url = match Url::parse(input) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => origin
            .ok_or_else(|| UrlError::NoOrigin(input.to_string()))?
            .join(input)
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?,
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}
