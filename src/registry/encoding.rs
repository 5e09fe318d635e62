//! Catalog URL construction
//!
//! Harbor expects slashes inside a repository name to be percent-encoded, and
//! depending on the version and any proxy in front of it, encoded once or
//! twice. For multi-segment names the artifact listing therefore has several
//! candidate URLs which are tried in order.

use crate::error::{MirrorError, Result};
use url::Url;
use url::form_urlencoded::byte_serialize;

const API_PREFIX: [&str; 2] = ["api", "v2.0"];

/// Normalize a configured base address into a URL
///
/// An address without a scheme gets `http://` for insecure registries and
/// `https://` otherwise. Trailing slashes are dropped.
pub fn normalize_base(address: &str, insecure: bool) -> Result<Url> {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(MirrorError::Validation("catalog base URL is empty".to_string()));
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else if insecure {
        format!("http://{}", trimmed)
    } else {
        format!("https://{}", trimmed)
    };
    Ok(Url::parse(&with_scheme)?)
}

/// Percent-encoded form of a name, `/` included
pub fn escape_segment(segment: &str) -> String {
    byte_serialize(segment.as_bytes()).collect()
}

/// `base` with `segments` appended, each one encoded as a single path segment
fn endpoint<I>(base: &Url, segments: I) -> Result<Url>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| MirrorError::Validation(format!("{} cannot be used as a catalog base URL", base)))?
        .pop_if_empty()
        .extend(API_PREFIX)
        .extend(segments);
    Ok(url)
}

pub fn repositories_endpoint(base: &Url, project: &str) -> Result<Url> {
    endpoint(base, ["projects", project, "repositories"])
}

/// Candidate artifact listing endpoints, most likely first
///
/// A single-segment name has exactly one candidate. A multi-segment name gets
/// the project-scoped endpoint encoded once and twice, then the global
/// `repositories/{project/repo}` endpoint encoded once and twice.
pub fn artifact_endpoints(base: &Url, project: &str, repository: &str) -> Result<Vec<Url>> {
    let project_scoped =
        |name: &str| endpoint(base, ["projects", project, "repositories", name, "artifacts"]);

    if !repository.contains('/') {
        return Ok(vec![project_scoped(repository)?]);
    }

    let qualified = format!("{}/{}", project, repository);
    let global = |name: &str| endpoint(base, ["repositories", name, "artifacts"]);

    Ok(vec![
        project_scoped(repository)?,
        project_scoped(&escape_segment(repository))?,
        global(&qualified)?,
        global(&escape_segment(&qualified))?,
    ])
}

/// Endpoint with paging parameters
pub fn page_url(endpoint: &Url, page: usize, page_size: usize, with_tag: bool) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());
        if with_tag {
            query.append_pair("with_tag", "true");
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        normalize_base("h:8080", true).unwrap()
    }

    fn strings(urls: Vec<Url>) -> Vec<String> {
        urls.into_iter().map(String::from).collect()
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("h:8080/", true).unwrap().as_str(), "http://h:8080/");
        assert_eq!(normalize_base("harbor.local", false).unwrap().as_str(), "https://harbor.local/");
        assert_eq!(normalize_base("http://h", false).unwrap().scheme(), "http");
        assert!(normalize_base("  ", false).is_err());
    }

    #[test]
    fn test_single_segment_has_one_candidate() {
        let urls = strings(artifact_endpoints(&base(), "demo", "app").unwrap());
        assert_eq!(urls, vec!["http://h:8080/api/v2.0/projects/demo/repositories/app/artifacts"]);
    }

    #[test]
    fn test_multi_segment_candidates_in_order() {
        let urls = strings(artifact_endpoints(&base(), "demo", "team/app").unwrap());
        assert_eq!(
            urls,
            vec![
                "http://h:8080/api/v2.0/projects/demo/repositories/team%2Fapp/artifacts",
                "http://h:8080/api/v2.0/projects/demo/repositories/team%252Fapp/artifacts",
                "http://h:8080/api/v2.0/repositories/demo%2Fteam%2Fapp/artifacts",
                "http://h:8080/api/v2.0/repositories/demo%252Fteam%252Fapp/artifacts",
            ]
        );
    }

    #[test]
    fn test_base_with_path_prefix() {
        let base = normalize_base("https://gw.example/harbor/", false).unwrap();
        let url = repositories_endpoint(&base, "demo").unwrap();
        assert_eq!(url.as_str(), "https://gw.example/harbor/api/v2.0/projects/demo/repositories");
    }

    #[test]
    fn test_page_url() {
        let endpoint = repositories_endpoint(&base(), "demo").unwrap();
        assert_eq!(
            page_url(&endpoint, 2, 100, false).as_str(),
            "http://h:8080/api/v2.0/projects/demo/repositories?page=2&page_size=100"
        );
        assert!(page_url(&endpoint, 1, 10, true).as_str().ends_with("&with_tag=true"));
    }
}
