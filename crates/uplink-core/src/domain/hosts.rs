//! Upload host list
//!
//! A [`HostList`] is the ordered, immutable set of base URLs every upload is
//! delivered to. It is built once from configuration at startup and iterated
//! in order for each dispatch.

use std::fmt::{self, Display, Formatter};

use url::Url;

use super::errors::DomainError;

/// Fixed request path appended to every host base URL
pub const UPLOAD_PATH: &str = "/api/upload";

/// A validated absolute http(s) base URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostUrl(String);

impl HostUrl {
    /// Parse and validate a host base URL
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidHost`] if the value is not an absolute
    /// URL, uses a scheme other than `http`/`https`, or has no host part.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let invalid = |reason: String| DomainError::InvalidHost {
            host: value.to_string(),
            reason,
        };

        let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the base URL as configured
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins `path` onto the base URL with exactly one separating `/`
    pub fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.0.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// The upload endpoint for this host
    pub fn upload_url(&self) -> String {
        self.join(UPLOAD_PATH)
    }
}

impl Display for HostUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty list of upload hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostList(Vec<HostUrl>);

impl HostList {
    /// Creates a host list from already-validated hosts
    ///
    /// # Errors
    /// Returns [`DomainError::NoHosts`] if `hosts` is empty.
    pub fn new(hosts: Vec<HostUrl>) -> Result<Self, DomainError> {
        if hosts.is_empty() {
            return Err(DomainError::NoHosts);
        }
        Ok(Self(hosts))
    }

    /// Parses every configured host string, preserving order
    pub fn parse<S: AsRef<str>>(hosts: &[S]) -> Result<Self, DomainError> {
        let parsed = hosts
            .iter()
            .map(|h| HostUrl::parse(h.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    /// Iterates hosts in delivery order
    pub fn iter(&self) -> std::slice::Iter<'_, HostUrl> {
        self.0.iter()
    }

    /// Number of hosts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed list; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a HostList {
    type Item = &'a HostUrl;
    type IntoIter = std::slice::Iter<'a, HostUrl>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_http_and_https() {
        assert!(HostUrl::parse("https://wowthing.org").is_ok());
        assert!(HostUrl::parse("http://127.0.0.1:8080").is_ok());
    }

    #[test]
    fn test_parse_rejects_relative_and_other_schemes() {
        assert!(matches!(
            HostUrl::parse("wowthing.org"),
            Err(DomainError::InvalidHost { .. })
        ));
        assert!(matches!(
            HostUrl::parse("ftp://wowthing.org"),
            Err(DomainError::InvalidHost { .. })
        ));
    }

    #[test]
    fn test_join_normalizes_slashes() {
        let host = HostUrl::parse("https://wowthing.org/").unwrap();
        assert_eq!(host.join("/api/upload"), "https://wowthing.org/api/upload");
        assert_eq!(host.join("api/upload"), "https://wowthing.org/api/upload");

        let bare = HostUrl::parse("https://wowthing.org").unwrap();
        assert_eq!(bare.upload_url(), "https://wowthing.org/api/upload");
    }

    #[test]
    fn test_join_keeps_base_path_prefix() {
        let host = HostUrl::parse("http://localhost:55501/staging").unwrap();
        assert_eq!(
            host.upload_url(),
            "http://localhost:55501/staging/api/upload"
        );
    }

    #[test]
    fn test_host_list_preserves_order() {
        let list = HostList::parse(&["https://b.test", "https://a.test"]).unwrap();
        let hosts: Vec<_> = list.iter().map(HostUrl::as_str).collect();
        assert_eq!(hosts, vec!["https://b.test", "https://a.test"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_host_list_rejects_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(HostList::parse(&empty), Err(DomainError::NoHosts));
    }

    #[test]
    fn test_host_list_fails_on_first_invalid_host() {
        let err = HostList::parse(&["https://ok.test", "bogus"]).unwrap_err();
        match err {
            DomainError::InvalidHost { host, .. } => assert_eq!(host, "bogus"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
