//! Rules file: which repositories and tags to mirror per project

use crate::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub projects: Vec<ProjectRule>,
}

/// Filter for one project
///
/// An empty `includes` list includes every repository; `excludes` is applied
/// afterwards. An empty `tags` list selects every tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRule {
    pub name: String,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub tags: Vec<String>,
}

impl ProjectRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_includes(mut self, includes: &[&str]) -> Self {
        self.includes = includes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_excludes(mut self, excludes: &[&str]) -> Self {
        self.excludes = excludes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl RulesFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MirrorError::Config(format!("read rules {}: {}", path.display(), e)))?;
        let rules = Self::from_yaml(&text)
            .map_err(|e| MirrorError::Config(format!("load rules {}: {}", path.display(), e)))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(pos) = self.projects.iter().position(|p| p.name.trim().is_empty()) {
            return Err(MirrorError::Config(format!(
                "rules entry #{} has no project name",
                pos + 1
            )));
        }
        Ok(())
    }

    /// Rules to plan: all of them, or only those named `project`
    pub fn select(&self, project: Option<&str>) -> Vec<ProjectRule> {
        self.projects
            .iter()
            .filter(|rule| project.is_none_or(|name| rule.name == name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
projects:
  - name: demo
    includes: ["app-*"]
    excludes: ["app-test"]
    tags: ["v1.*"]
  - name: infra
  - name: demo
    includes: ["tools"]
"#;

    #[test]
    fn test_parse_rules() {
        let rules = RulesFile::from_yaml(RULES).unwrap();
        assert_eq!(rules.projects.len(), 3);
        assert_eq!(
            rules.projects[0],
            ProjectRule::new("demo")
                .with_includes(&["app-*"])
                .with_excludes(&["app-test"])
                .with_tags(&["v1.*"])
        );
        assert!(rules.projects[1].includes.is_empty());
        assert!(rules.projects[1].tags.is_empty());
    }

    #[test]
    fn test_select_by_project() {
        let rules = RulesFile::from_yaml(RULES).unwrap();
        assert_eq!(rules.select(None).len(), 3);
        assert_eq!(rules.select(Some("demo")).len(), 2);
        assert!(rules.select(Some("missing")).is_empty());
    }

    #[test]
    fn test_nameless_rule_rejected() {
        let rules = RulesFile::from_yaml("projects:\n  - includes: [\"a\"]\n").unwrap();
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_empty_file_has_no_projects() {
        assert!(RulesFile::from_yaml("  \n").unwrap().projects.is_empty());
    }
}
