use std::path::PathBuf;

use url::Url;

use crate::types::RedirectSource;

const INVALID_SCHEME: &str = "redirect source URL scheme must be https:// or http://";

fn looks_like_url(source: &str) -> bool {
    source.contains("://")
}

/// Accepts an `http(s)` URL or the path of an existing regular file.
pub fn check_redirect_source(source: &str) -> Result<String, String> {
    if looks_like_url(source) {
        let parsed = Url::parse(source).map_err(|e| e.to_string())?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(INVALID_SCHEME.to_string());
        }
        return Ok(source.to_string());
    }

    let path = PathBuf::from(source);
    if path.is_file() {
        Ok(source.to_string())
    } else {
        Err(format!("redirects file not found: {}", path.display()))
    }
}

/// Classify an already validated source string.
pub fn parse_redirect_source(source: &str) -> RedirectSource {
    if looks_like_url(source) {
        RedirectSource::Url(source.to_string())
    } else {
        RedirectSource::File(PathBuf::from(source))
    }
}
