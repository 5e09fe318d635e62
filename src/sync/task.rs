//! Image references and the copy task handed to the worker pool

use crate::config::trim_scheme;
use std::fmt;

/// Transport prefix the copy tool expects for registry references
pub const DOCKER_TRANSPORT: &str = "docker://";

/// `host/project/repository:tag`, host without scheme
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub host: String,
    pub project: String,
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(host: &str, project: &str, repository: &str, tag: &str) -> Self {
        Self {
            host: trim_scheme(host).trim_end_matches('/').to_string(),
            project: project.to_string(),
            repository: repository.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Reference with the `docker://` transport, as passed to the copy tool
    pub fn transport_ref(&self) -> String {
        format!("{}{}", DOCKER_TRANSPORT, self)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}:{}", self.host, self.project, self.repository, self.tag)
    }
}

/// One transfer: immutable once planned
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CopyTask {
    pub source: ImageRef,
    pub destination: ImageRef,
}

impl CopyTask {
    pub fn new(source: ImageRef, destination: ImageRef) -> Self {
        Self {
            source,
            destination,
        }
    }
}

impl fmt::Display for CopyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_transport_ref() {
        let image = ImageRef::new("http://localhost:5001/", "demo", "app", "v1.0");
        assert_eq!(image.to_string(), "localhost:5001/demo/app:v1.0");
        assert_eq!(image.transport_ref(), "docker://localhost:5001/demo/app:v1.0");
    }
}
