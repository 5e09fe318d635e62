//! Sync planner
//!
//! Turns project rules into an ordered list of [`CopyTask`]s by walking the
//! source catalog: repositories are filtered with the rule's include/exclude
//! globs, then every tag of every artifact is filtered with the tag globs.
//! Tasks come out in catalog order and a (project, repository, tag) triple is
//! never planned twice.
//!
//! Failures are contained: a project whose repositories cannot be listed is
//! recorded and skipped, and so is a repository whose artifacts cannot be
//! listed. Everything else still gets planned.

use crate::config::ProjectRule;
use crate::error::MirrorError;
use crate::logging::Logger;
use crate::registry::{Catalog, Repository};
use crate::sync::glob::GlobSet;
use crate::sync::task::{CopyTask, ImageRef};
use std::collections::HashSet;

/// Hosts written into the planned references, scheme already stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTargets {
    pub source_host: String,
    pub destination_host: String,
}

impl PlanTargets {
    pub fn new(source_host: &str, destination_host: &str) -> Self {
        Self {
            source_host: source_host.to_string(),
            destination_host: destination_host.to_string(),
        }
    }
}

/// A scope (project or `project/repo`) that could not be planned
#[derive(Debug)]
pub struct PlanFailure {
    pub scope: String,
    pub error: MirrorError,
}

#[derive(Debug, Default)]
pub struct Plan {
    pub tasks: Vec<CopyTask>,
    /// Projects whose repository listing failed
    pub failed_projects: Vec<PlanFailure>,
    /// Repositories whose artifact listing failed
    pub skipped_repositories: Vec<PlanFailure>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_projects.is_empty()
    }
}

/// Per-run state: output plus the set of already planned triples
struct PlanBuilder {
    plan: Plan,
    seen: HashSet<(String, String, String)>,
}

impl PlanBuilder {
    fn new() -> Self {
        Self {
            plan: Plan::default(),
            seen: HashSet::new(),
        }
    }
}

pub struct SyncPlanner<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    targets: PlanTargets,
    output: Logger,
}

impl<'a, C: Catalog + ?Sized> SyncPlanner<'a, C> {
    pub fn new(catalog: &'a C, targets: PlanTargets, output: Logger) -> Self {
        Self {
            catalog,
            targets,
            output,
        }
    }

    /// Plan every rule in order
    pub async fn plan(&self, rules: &[ProjectRule]) -> Plan {
        let mut builder = PlanBuilder::new();

        for rule in rules {
            self.plan_rule(rule, &mut builder).await;
        }

        builder.plan
    }

    /// Plan one project without a rules file
    ///
    /// With an explicit repository the repository listing is skipped
    /// entirely; without one every repository of the project is planned.
    pub async fn plan_direct(
        &self,
        project: &str,
        repository: Option<&str>,
        tags: &[String],
    ) -> Plan {
        let mut builder = PlanBuilder::new();
        let tag_globs = tag_globs(tags);

        match repository {
            Some(repository) => {
                let repository = Repository::new(repository);
                self.plan_repository(project, repository.short_name(project), &tag_globs, &mut builder)
                    .await;
            }
            None => {
                let rule = ProjectRule {
                    name: project.to_string(),
                    tags: tags.to_vec(),
                    ..ProjectRule::default()
                };
                self.plan_rule(&rule, &mut builder).await;
            }
        }

        builder.plan
    }

    async fn plan_rule(&self, rule: &ProjectRule, builder: &mut PlanBuilder) {
        let project = rule.name.as_str();
        let includes = GlobSet::new(&rule.includes);
        let excludes = GlobSet::new(&rule.excludes);
        let tag_globs = tag_globs(&rule.tags);

        self.output.verbose(&format!("Listing repositories of project {}", project));
        let repositories = match self.catalog.list_repositories(project).await {
            Ok(repositories) => repositories,
            Err(error) => {
                self.output.error(&format!("list repos for project {}: {}", project, error));
                builder.plan.failed_projects.push(PlanFailure {
                    scope: project.to_string(),
                    error,
                });
                return;
            }
        };

        let before = builder.plan.tasks.len();
        let mut matched = 0;

        for repository in &repositories {
            let name = repository.short_name(project);

            if !includes.is_empty() && !includes.matches(name) {
                self.output.detail(&format!("{}/{}: not included", project, name));
                continue;
            }
            if !excludes.is_empty() && excludes.matches(name) {
                self.output.detail(&format!("{}/{}: excluded", project, name));
                continue;
            }

            matched += 1;
            self.plan_repository(project, name, &tag_globs, builder).await;
        }

        if matched == 0 {
            self.output.warning(&format!("No repos matched for project {:?}", project));
        } else {
            self.output.verbose(&format!(
                "Project {}: {} of {} repositories matched, {} tasks",
                project,
                matched,
                repositories.len(),
                builder.plan.tasks.len() - before
            ));
        }
    }

    async fn plan_repository(
        &self,
        project: &str,
        repository: &str,
        tag_globs: &GlobSet,
        builder: &mut PlanBuilder,
    ) {
        let artifacts = match self.catalog.list_artifacts(project, repository).await {
            Ok(artifacts) => artifacts,
            Err(error) => {
                self.output.warning(&format!("skip {}/{}: {}", project, repository, error));
                builder.plan.skipped_repositories.push(PlanFailure {
                    scope: format!("{}/{}", project, repository),
                    error,
                });
                return;
            }
        };

        for artifact in &artifacts {
            for tag in artifact.tag_names() {
                if !tag_globs.matches(tag) {
                    continue;
                }

                let key = (project.to_string(), repository.to_string(), tag.to_string());
                if !builder.seen.insert(key) {
                    continue;
                }

                builder.plan.tasks.push(CopyTask::new(
                    ImageRef::new(&self.targets.source_host, project, repository, tag),
                    ImageRef::new(&self.targets.destination_host, project, repository, tag),
                ));
            }
        }
    }
}

/// Tag filter; no patterns means every tag
fn tag_globs(tags: &[String]) -> GlobSet {
    if tags.is_empty() {
        GlobSet::match_all()
    } else {
        GlobSet::new(tags)
    }
}
