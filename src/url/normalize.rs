use crate::UrlError;
use url::{Host, Url};

/// Normalizes a user-supplied seed URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Prefix `https://` when no http(s) scheme is given
/// 3. Parse the URL; reject if malformed or not http(s)
/// 4. Require a host
/// 5. Prefix `www.` to a domain host that lacks it (IP addresses and
///    `localhost` are left alone)
///
/// Port, path and query are preserved.
///
/// # Examples
///
/// ```
/// use crawlscope::url::normalize_seed_url;
///
/// let url = normalize_seed_url("example.com/news?page=2").unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/news?page=2");
/// ```
pub fn normalize_seed_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else if lower.contains("://") {
        let scheme = trimmed.split("://").next().unwrap_or_default();
        return Err(UrlError::InvalidScheme(scheme.to_string()));
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => return Ok(url),
        None => return Err(UrlError::MissingHost),
    };

    if !host.starts_with("www.") && host != "localhost" {
        url.set_host(Some(&format!("www.{}", host)))
            .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;
    }

    Ok(url)
}
