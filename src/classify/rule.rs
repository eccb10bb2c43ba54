//! Inclusion rule for the URL table and host derivation.

use url::Url;

use crate::config::DEFAULT_INCLUDED_SCHEME;

/// Decides whether an identity is recorded in the URL table.
///
/// The host table is never filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionRule {
    /// Record every identity.
    Any,
    /// Record identities whose scheme (the text before `://`) is one of these,
    /// compared case-insensitively. Stored lowercase.
    Schemes(Vec<String>),
}

impl Default for InclusionRule {
    fn default() -> Self {
        Self::secure_only()
    }
}

impl InclusionRule {
    /// Only `https://` identities.
    pub fn secure_only() -> Self {
        Self::schemes([DEFAULT_INCLUDED_SCHEME])
    }

    pub fn schemes<'a>(schemes: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Schemes(
            schemes
                .into_iter()
                .map(|s| s.trim().trim_end_matches("://").to_ascii_lowercase())
                .collect(),
        )
    }

    /// Whether `identity` belongs in the URL table.
    ///
    /// Works on the raw string, so identities that do not parse as URLs can
    /// still match.
    pub fn includes(&self, identity: &str) -> bool {
        match self {
            InclusionRule::Any => true,
            InclusionRule::Schemes(schemes) => match identity.split_once("://") {
                Some((scheme, _)) => schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme)),
                None => false,
            },
        }
    }
}

/// Derives the host of an identity.
///
/// Fails only when the identity does not parse as an absolute URL. URLs
/// without a host (`data:`, `blob:`, `about:`) share the empty host.
pub fn host_of(identity: &str) -> Result<String, String> {
    let parsed = Url::parse(identity).map_err(|e| e.to_string())?;
    Ok(parsed.host_str().unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_only_is_default() {
        let rule = InclusionRule::default();
        assert!(rule.includes("https://a.com/x"));
        assert!(rule.includes("HTTPS://a.com/x"));
        assert!(!rule.includes("http://b.com"));
        assert!(!rule.includes("wss://c.com/socket"));
        assert!(!rule.includes("not-a-url"));
    }

    #[test]
    fn test_scheme_list() {
        let rule = InclusionRule::schemes(["https", "WSS://"]);
        assert_eq!(
            rule,
            InclusionRule::Schemes(vec!["https".to_string(), "wss".to_string()])
        );
        assert!(rule.includes("wss://c.com/socket"));
        assert!(!rule.includes("http://b.com"));
    }

    #[test]
    fn test_any_includes_everything() {
        assert!(InclusionRule::Any.includes("http://b.com"));
        assert!(InclusionRule::Any.includes("not-a-url"));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://a.com/x"), Ok("a.com".to_string()));
        assert_eq!(host_of("http://B.com:8080/"), Ok("b.com".to_string()));
        assert_eq!(
            host_of("https://user:pw@cdn.example.org/a.js?v=1"),
            Ok("cdn.example.org".to_string())
        );
        assert_eq!(host_of("http://[::1]:3000/"), Ok("[::1]".to_string()));
    }

    #[test]
    fn test_host_of_rejects_malformed() {
        assert!(host_of("not-a-url").is_err());
        assert!(host_of("").is_err());
        assert!(host_of("/relative/path").is_err());
    }

    #[test]
    fn test_host_of_hostless_urls_share_empty_host() {
        assert_eq!(host_of("data:text/plain,hello"), Ok(String::new()));
        assert_eq!(host_of("data:image/png;base64,AAAA"), Ok(String::new()));
        assert_eq!(host_of("blob:https://a.com/1234"), Ok(String::new()));
        assert_eq!(host_of("about:blank"), Ok(String::new()));
    }
}
