//! Catalog API shapes and the discovery interface used by the planner

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A repository as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Either `project/repo` or a bare `repo`
    pub name: String,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Repository name with the `project/` qualifier removed
    pub fn short_name(&self, project: &str) -> &str {
        self.name
            .strip_prefix(project)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// A content-addressed manifest and the tags pointing at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub digest: String,
    /// `null` for untagged artifacts
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

impl Artifact {
    pub fn new(digest: &str, tags: &[&str]) -> Self {
        Self {
            digest: digest.to_string(),
            tags: Some(
                tags.iter()
                    .map(|name| Tag {
                        name: name.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().flatten().map(|tag| tag.name.as_str())
    }
}

/// Source of repositories and artifacts for planning
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// All repositories of `project`, in catalog order
    async fn list_repositories(&self, project: &str) -> Result<Vec<Repository>>;

    /// All artifacts of `project/repository`, in catalog order
    async fn list_artifacts(&self, project: &str, repository: &str) -> Result<Vec<Artifact>>;
}
