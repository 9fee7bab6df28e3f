//! Endpoint descriptor parsing.
//!
//! Splits `{prefix}/{pillar}/{path...}` into its pillar and path segments.
//! The pillar is returned as raw text; resolving it against the known
//! pillars is a lookup concern, not a parsing one.

/// Raw segments of a well-formed endpoint descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParts<'a> {
    pub pillar: &'a str,
    pub path: &'a str,
}

/// Parse an endpoint descriptor against the configured prefix.
///
/// Returns `None` when the prefix does not match on a segment boundary or
/// when fewer than two non-empty segments follow it. The path is returned
/// verbatim and may itself contain `/`.
pub fn parse_endpoint<'a>(endpoint: &'a str, prefix: &str) -> Option<EndpointParts<'a>> {
    let prefix = prefix.trim_end_matches('/');
    let rest = endpoint.strip_prefix(prefix)?;
    let rest = rest.strip_prefix('/')?;

    let (pillar, path) = rest.split_once('/')?;
    if pillar.is_empty() || path.is_empty() {
        return None;
    }

    Some(EndpointParts { pillar, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_endpoint() {
        let parts = parse_endpoint("/api/content/upload-file", "/api").unwrap();
        assert_eq!(parts.pillar, "content");
        assert_eq!(parts.path, "upload-file");
    }

    #[test]
    fn test_nested_path_is_kept_whole() {
        let parts = parse_endpoint("/api/content/delete-file/441ab256", "/api").unwrap();
        assert_eq!(parts.pillar, "content");
        assert_eq!(parts.path, "delete-file/441ab256");
    }

    #[test]
    fn test_versioned_prefix() {
        let parts = parse_endpoint("/api/v1/insights/analyze", "/api/v1").unwrap();
        assert_eq!(parts.pillar, "insights");
        assert_eq!(parts.path, "analyze");
    }

    #[test]
    fn test_malformed_endpoints() {
        assert_eq!(parse_endpoint("/api", "/api"), None);
        assert_eq!(parse_endpoint("/api/", "/api"), None);
        assert_eq!(parse_endpoint("/api/content", "/api"), None);
        assert_eq!(parse_endpoint("/api/content/", "/api"), None);
        assert_eq!(parse_endpoint("/api//upload", "/api"), None);
        assert_eq!(parse_endpoint("/other/content/upload", "/api"), None);
        // Prefix must end on a segment boundary.
        assert_eq!(parse_endpoint("/apix/content/upload", "/api"), None);
    }

    #[test]
    fn test_parsing_returns_segments_exactly() {
        for (p, q) in [("a", "b"), ("content", "x/y/z"), ("session", "create-user-session")] {
            let endpoint = format!("/api/{}/{}", p, q);
            let parts = parse_endpoint(&endpoint, "/api").unwrap();
            assert_eq!(parts.pillar, p);
            assert_eq!(parts.path, q);
        }
    }
}
