//! Target URL validation and normalization utilities.

use log::warn;

use crate::config::{LOGGED_IDENTITY_PREFIX, MAX_URL_LENGTH};

/// Validates and normalizes a target URL.
///
/// Adds an `https://` prefix if the target has no scheme, then checks that the
/// result parses and uses the http or https scheme. Targets longer than
/// `MAX_URL_LENGTH` are rejected before and after normalization.
///
/// Logs a warning and returns `None` when the target is rejected.
pub fn validate_and_normalize_url(url: &str) -> Option<String> {
    if url.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping target exceeding maximum length ({} > {}): {}",
            url.len(),
            MAX_URL_LENGTH,
            truncate_for_log(url)
        );
        return None;
    }

    let normalized = if !url.starts_with("http://") && !url.starts_with("https://") {
        format!("https://{url}")
    } else {
        url.to_string()
    };

    if normalized.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping normalized target exceeding maximum length ({} > {}): {}",
            normalized.len(),
            MAX_URL_LENGTH,
            truncate_for_log(&normalized)
        );
        return None;
    }

    match url::Url::parse(&normalized) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Some(normalized),
            "http" | "https" => {
                warn!("Skipping target without a host: {url}");
                None
            }
            _ => {
                warn!("Skipping unsupported scheme for target: {url}");
                None
            }
        },
        Err(_) => {
            warn!("Skipping invalid target: {url}");
            None
        }
    }
}

/// Shortens an identity for log output, keeping `LOGGED_IDENTITY_PREFIX`
/// characters. `data:` URLs in particular can be megabytes long.
pub fn truncate_for_log(identity: &str) -> String {
    match identity.char_indices().nth(LOGGED_IDENTITY_PREFIX) {
        Some((cut, _)) => format!("{}...", &identity[..cut]),
        None => identity.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_and_normalize_url_adds_https() {
        let result = validate_and_normalize_url("example.com");
        assert_eq!(result, Some("https://example.com".to_string()));
    }

    #[test]
    fn test_validate_and_normalize_url_preserves_scheme() {
        assert_eq!(
            validate_and_normalize_url("https://example.org/"),
            Some("https://example.org/".to_string())
        );
        assert_eq!(
            validate_and_normalize_url("http://example.org/"),
            Some("http://example.org/".to_string())
        );
    }

    #[test]
    fn test_validate_and_normalize_url_rejects_invalid_url() {
        assert_eq!(validate_and_normalize_url("not a valid url!!!"), None);
        assert_eq!(validate_and_normalize_url(""), None);
    }

    #[test]
    fn test_validate_and_normalize_url_with_path_and_port() {
        assert_eq!(
            validate_and_normalize_url("example.com:8080/path?query=value"),
            Some("https://example.com:8080/path?query=value".to_string())
        );
    }

    #[test]
    fn test_validate_and_normalize_url_rejects_too_long_url() {
        let long_url = format!("https://example.com/{}", "a".repeat(2100));
        assert_eq!(validate_and_normalize_url(&long_url), None);
    }

    #[test]
    fn test_validate_and_normalize_url_accepts_url_at_limit() {
        // "https://example.com/" is 20 chars
        let url_at_limit = format!("https://example.com/{}", "a".repeat(2028));
        assert_eq!(url_at_limit.len(), 2048);
        assert!(validate_and_normalize_url(&url_at_limit).is_some());
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("https://a.com/"), "https://a.com/");

        let long = format!("data:image/png;base64,{}", "A".repeat(500));
        let shortened = truncate_for_log(&long);
        assert!(shortened.ends_with("..."));
        assert_eq!(shortened.chars().count(), LOGGED_IDENTITY_PREFIX + 3);
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let long = "é".repeat(200);
        // Must not split a character
        let shortened = truncate_for_log(&long);
        assert!(shortened.starts_with('é'));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_url_normalization_idempotent(url in "[a-z]{3,20}\\.[a-z]{2,5}") {
            if let Some(n1) = validate_and_normalize_url(&url) {
                let n2 = validate_and_normalize_url(&n1);
                prop_assert_eq!(Some(n1.clone()), n2);
            }
        }

        #[test]
        fn test_url_scheme_handling(domain in "[a-z]{3,20}\\.[a-z]{2,5}") {
            let no_scheme = validate_and_normalize_url(&domain);
            prop_assert!(no_scheme.is_some());
            prop_assert!(no_scheme.unwrap().starts_with("https://"));

            let with_http = validate_and_normalize_url(&format!("http://{}", domain));
            prop_assert!(with_http.is_some());
            prop_assert!(with_http.unwrap().starts_with("http://"));
        }
    }
}
