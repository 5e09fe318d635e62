//! Runner wiring configuration, catalog, planner and worker pool together

use crate::cli::args::{Args, Commands, CopyArgs, LoginArgs, LsArgs, SyncArgs};
use crate::concurrency::{ExecutionReport, WorkerPool};
use crate::config::{AppConfig, CredentialStore, Credentials, RegistryConfig, RulesFile};
use crate::copy::{CopyCommand, CopyInvoker, CopySettings, EndpointOptions, SkopeoInvoker};
use crate::error::{MirrorError, Result};
use crate::logging::{ConsoleProgress, Logger};
use crate::registry::{Catalog, CatalogClient};
use crate::sync::{CopyTask, Plan, PlanTargets, SyncPlanner};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settings for one `sync` run, detached from the parsed arguments
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub from: String,
    pub to: String,
    pub project: Option<String>,
    pub rules: Option<PathBuf>,
    pub repository: Option<String>,
    pub tags: Vec<String>,
    pub dry_run: bool,
    pub concurrency: usize,
    pub docker_network: Option<String>,
}

impl From<&SyncArgs> for SyncOptions {
    fn from(args: &SyncArgs) -> Self {
        Self {
            from: args.from.clone(),
            to: args.to.clone(),
            project: args.project.clone().filter(|p| !p.trim().is_empty()),
            rules: args.rules.clone(),
            repository: args.repo.clone().filter(|r| !r.trim().is_empty()),
            tags: args.tags.clone(),
            dry_run: args.dry_run,
            concurrency: args.concurrency,
            docker_network: args.docker_network.clone(),
        }
    }
}

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Self { args, output }
    }

    pub fn output(&self) -> &Logger {
        &self.output
    }

    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Commands::Sync(args) => {
                args.validate()?;
                let config = self.load_config()?;
                self.sync(&config, &SyncOptions::from(args)).await
            }
            Commands::Ls(args) => {
                let config = self.load_config()?;
                self.list(&config, args).await
            }
            Commands::Copy(args) => {
                let config = self.load_config()?;
                self.copy(&config, args).await
            }
            Commands::Login(args) => {
                args.validate()?;
                let config = self.load_config()?;
                self.login(&config, args)
            }
        }
    }

    fn load_config(&self) -> Result<AppConfig> {
        self.output
            .verbose(&format!("Loading config from {}", self.args.config.display()));
        AppConfig::load(&self.args.config)
    }

    fn load_store(&self, config: &AppConfig) -> Result<CredentialStore> {
        let path = config.auth_store_path()?;
        let store = CredentialStore::load(&path)?;
        self.output.detail(&format!(
            "Credential store {} ({} entries)",
            path.display(),
            store.len()
        ));
        Ok(store)
    }

    fn catalog_for(
        &self,
        config: &AppConfig,
        registry: &RegistryConfig,
        credentials: Credentials,
    ) -> Result<CatalogClient> {
        CatalogClient::builder(registry.api_base())
            .with_credentials(credentials)
            .with_insecure(registry.insecure)
            .with_timeout(Duration::from_secs(config.catalog_timeout_sec))
            .build()
    }

    /// Plan and, unless dry-run, execute a sync between two registries
    pub async fn sync(&self, config: &AppConfig, options: &SyncOptions) -> Result<()> {
        self.output.section("Harbor Air-Gap Sync");

        let source = config.registry(&options.from)?;
        let destination = config.registry(&options.to)?;
        let store = self.load_store(config)?;
        let source_credentials = config.credentials_for(&options.from, &store);
        let destination_credentials = config.credentials_for(&options.to, &store);

        let catalog = self.catalog_for(config, source, source_credentials.clone())?;
        self.output.info(&format!(
            "{} ({}) -> {} ({})",
            options.from,
            source.registry_host(),
            options.to,
            destination.registry_host()
        ));

        let plan = self
            .plan(&catalog, source, destination, options)
            .await?;

        let settings = CopySettings {
            mode: config.runtime_mode(options.docker_network.clone()),
            source: EndpointOptions::new(source.insecure, source_credentials),
            destination: EndpointOptions::new(destination.insecure, destination_credentials),
        };

        if options.dry_run {
            self.print_dry_run(&plan.tasks, &settings);
            return self.finish(&plan, None);
        }

        if plan.is_empty() {
            self.output.success("Nothing to copy.");
            return self.finish(&plan, None);
        }

        let tasks = plan.tasks.clone();
        let invoker: Arc<dyn CopyInvoker> =
            Arc::new(SkopeoInvoker::new(settings, self.output.clone()));
        let pool = WorkerPool::new(options.concurrency);

        self.output.subsection("Copying images");
        self.output.info(&format!(
            "{} copy task(s) with {} worker(s)",
            tasks.len(),
            pool.concurrency().min(tasks.len())
        ));
        let report = pool
            .execute(
                tasks,
                invoker,
                Arc::new(ConsoleProgress::new(self.output.clone())),
            )
            .await;

        self.finish(&plan, Some(&report))
    }

    async fn plan<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        source: &RegistryConfig,
        destination: &RegistryConfig,
        options: &SyncOptions,
    ) -> Result<Plan> {
        self.output.subsection("Planning");

        let targets = PlanTargets::new(source.registry_host(), destination.registry_host());
        let planner = SyncPlanner::new(catalog, targets, self.output.clone());

        let plan = match &options.rules {
            Some(path) => {
                let rules = RulesFile::load(path)?;
                let selected = rules.select(options.project.as_deref());
                if options.repository.is_some() || !options.tags.is_empty() {
                    self.output
                        .warning("--repo and --tags are ignored when --rules is given");
                }
                if selected.is_empty() {
                    self.output.warning(&format!(
                        "No rules in {} for project {:?}",
                        path.display(),
                        options.project.as_deref().unwrap_or_default()
                    ));
                }
                planner.plan(&selected).await
            }
            None => {
                let project = options.project.as_deref().ok_or_else(|| {
                    MirrorError::Validation("--project is required unless --rules is given".to_string())
                })?;
                planner
                    .plan_direct(project, options.repository.as_deref(), &options.tags)
                    .await
            }
        };

        self.output.info(&format!("Planned {} copy task(s)", plan.len()));
        Ok(plan)
    }

    fn print_dry_run(&self, tasks: &[CopyTask], settings: &CopySettings) {
        self.output.subsection("Dry run");
        for task in tasks {
            self.output.plain(&format!("[dry-run] copy {}", task));
            self.output
                .detail(&CopyCommand::for_task(settings, task).to_string());
        }
        if tasks.is_empty() {
            self.output.info("No images matched.");
        } else {
            self.output
                .info("Dry run only. Pass --dry-run false to execute.");
        }
    }

    /// Print the summary and turn failures into the exit status
    fn finish(&self, plan: &Plan, report: Option<&ExecutionReport>) -> Result<()> {
        let mut items = vec![
            ("Planned", plan.len().to_string()),
            ("Failed projects", plan.failed_projects.len().to_string()),
            ("Skipped repositories", plan.skipped_repositories.len().to_string()),
        ];
        if let Some(report) = report {
            items.push(("Copied", report.copied().to_string()));
            items.push(("Skipped (missing on source)", report.skipped().to_string()));
            items.push(("Failed", report.failed().to_string()));
            items.push(("Workers", report.concurrency.to_string()));
            items.push(("Copy time", self.output.format_duration(report.elapsed)));
        }
        items.push(("Total time", self.output.format_duration(self.output.elapsed())));
        self.output.summary_kv("Summary", &items);

        for failure in &plan.failed_projects {
            self.output
                .error(&format!("project {}: {}", failure.scope, failure.error));
        }

        let mut problems = Vec::new();
        if plan.has_failures() {
            problems.push(format!("{} project(s) could not be listed", plan.failed_projects.len()));
        }
        if let Some(report) = report {
            if report.failed() > 0 {
                problems.push(format!("{} copy task(s) failed", report.failed()));
            }
            if report.unaccounted() > 0 {
                problems.push(format!("{} copy task(s) were lost", report.unaccounted()));
            }
        }

        if problems.is_empty() {
            self.output.success("Sync completed");
            Ok(())
        } else {
            Err(MirrorError::Incomplete(problems.join(", ")))
        }
    }

    /// Print repositories of a project or artifacts of one repository
    pub async fn list(&self, config: &AppConfig, args: &LsArgs) -> Result<()> {
        let registry = config.registry(&args.registry)?;
        let store = self.load_store(config)?;
        let catalog = self.catalog_for(
            config,
            registry,
            config.credentials_for(&args.registry, &store),
        )?;
        self.list_catalog(&catalog, args).await
    }

    async fn list_catalog<C: Catalog + ?Sized>(&self, catalog: &C, args: &LsArgs) -> Result<()> {
        let project = args.project.as_str();

        match args.repo.as_deref().filter(|r| !r.is_empty()) {
            None => {
                let repositories = catalog.list_repositories(project).await?;
                self.output
                    .subsection(&format!("{}/{} repositories", args.registry, project));
                for repository in &repositories {
                    self.output
                        .plain(&format!("- {}", repository.short_name(project)));
                }
            }
            Some(repository) => {
                let artifacts = catalog.list_artifacts(project, repository).await?;
                self.output.subsection(&format!(
                    "{}/{}/{} artifacts",
                    args.registry, project, repository
                ));
                for artifact in &artifacts {
                    self.output.plain(&format!(
                        "digest={} tags=[{}]",
                        artifact.digest,
                        artifact.tag_names().collect::<Vec<_>>().join(", ")
                    ));
                }
            }
        }

        Ok(())
    }

    /// Command for an explicit copy; references go to the tool verbatim
    fn copy_command(&self, config: &AppConfig, args: &CopyArgs) -> Result<(SkopeoInvoker, CopyCommand)> {
        args.validate()?;

        let settings = CopySettings {
            mode: config.runtime_mode(args.docker_network.clone()),
            source: EndpointOptions::new(args.src_insecure, Credentials::anonymous()),
            destination: EndpointOptions::new(args.dst_insecure, Credentials::anonymous()),
        };
        let command = CopyCommand::build(&settings, args.from.trim(), args.to.trim());
        Ok((SkopeoInvoker::new(settings, self.output.clone()), command))
    }

    /// Copy one explicit reference without catalog discovery
    pub async fn copy(&self, config: &AppConfig, args: &CopyArgs) -> Result<()> {
        let (invoker, command) = self.copy_command(config, args)?;

        self.output
            .info(&format!("Plan: copy {} -> {}", args.from.trim(), args.to.trim()));
        if !args.execute {
            self.output.plain(&format!("[dry-run] {}", command));
            self.output
                .warning("Not executing. Add --do to perform the copy.");
            return Ok(());
        }

        self.output.step(&format!("Executing: {}", command));
        let output = invoker.run(&command, args.from.trim()).await?;
        if !output.trim().is_empty() {
            self.output.plain(output.trim_end());
        }
        self.output.success(&format!("Copied {}", args.to.trim()));
        Ok(())
    }

    /// Save credentials for a configured registry into the credential store
    pub fn login(&self, config: &AppConfig, args: &LoginArgs) -> Result<()> {
        config.registry(&args.registry)?;

        let password = match &args.password {
            Some(password) => password.clone(),
            None => {
                let mut input = String::new();
                std::io::stdin().read_to_string(&mut input)?;
                input.trim().to_string()
            }
        };
        if password.is_empty() {
            return Err(MirrorError::Validation("password must not be empty".to_string()));
        }

        let path = config.auth_store_path()?;
        let mut store = CredentialStore::load(&path)?;
        store.insert(&args.registry, Credentials::new(args.username.trim(), &password));
        store.save(&path)?;

        self.output.success(&format!(
            "Saved credentials for {} at {}",
            args.registry,
            path.display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Artifact, Repository};
    use async_trait::async_trait;
    use clap::Parser;

    struct FixedCatalog;

    #[async_trait]
    impl Catalog for FixedCatalog {
        async fn list_repositories(&self, project: &str) -> Result<Vec<Repository>> {
            if project == "broken" {
                return Err(MirrorError::catalog("http://src/api", Some(500), "boom"));
            }
            Ok(vec![
                Repository::new(&format!("{}/app", project)),
                Repository::new(&format!("{}/tools", project)),
            ])
        }

        async fn list_artifacts(&self, _project: &str, repository: &str) -> Result<Vec<Artifact>> {
            Ok(vec![Artifact::new(
                &format!("sha256:{}", repository),
                &["v1.0", "latest"],
            )])
        }
    }

    fn runner(argv: &[&str]) -> Runner {
        let args = Args::try_parse_from(
            ["airgap-mirror", "-q"].into_iter().chain(argv.iter().copied()),
        )
        .unwrap();
        Runner::new(args)
    }

    fn options(project: &str) -> SyncOptions {
        SyncOptions {
            from: "source".to_string(),
            to: "target".to_string(),
            project: Some(project.to_string()),
            rules: None,
            repository: None,
            tags: vec!["v1.*".to_string()],
            dry_run: true,
            concurrency: 2,
            docker_network: None,
        }
    }

    fn registries() -> (RegistryConfig, RegistryConfig) {
        (
            RegistryConfig::new("http://localhost:5001").with_insecure(true),
            RegistryConfig::new("https://mirror.internal"),
        )
    }

    #[test]
    fn test_sync_options_drop_blank_values() {
        let args = SyncArgs {
            from: "a".to_string(),
            to: "b".to_string(),
            project: Some("  ".to_string()),
            rules: None,
            repo: Some(String::new()),
            tags: Vec::new(),
            dry_run: true,
            concurrency: 2,
            docker_network: None,
        };
        let options = SyncOptions::from(&args);
        assert!(options.project.is_none());
        assert!(options.repository.is_none());
    }

    #[tokio::test]
    async fn test_plan_direct_with_host_targets() {
        let runner = runner(&["sync", "source", "target", "--project", "demo"]);
        let (source, destination) = registries();
        let plan = runner
            .plan(&FixedCatalog, &source, &destination, &options("demo"))
            .await
            .unwrap();

        let refs: Vec<String> = plan.tasks.iter().map(ToString::to_string).collect();
        assert_eq!(
            refs,
            vec![
                "localhost:5001/demo/app:v1.0 -> mirror.internal/demo/app:v1.0",
                "localhost:5001/demo/tools:v1.0 -> mirror.internal/demo/tools:v1.0",
            ]
        );
    }

    #[tokio::test]
    async fn test_plan_with_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.yaml");
        std::fs::write(
            &rules,
            "projects:\n  - name: demo\n    includes: [\"to*\"]\n  - name: other\n",
        )
        .unwrap();

        let runner = runner(&["sync", "source", "target", "--rules", "rules.yaml"]);
        let (source, destination) = registries();
        let mut options = options("demo");
        options.rules = Some(rules);
        options.tags.clear();

        let plan = runner
            .plan(&FixedCatalog, &source, &destination, &options)
            .await
            .unwrap();
        let tags: Vec<_> = plan
            .tasks
            .iter()
            .map(|t| format!("{}:{}", t.source.repository, t.source.tag))
            .collect();
        assert_eq!(tags, vec!["tools:v1.0", "tools:latest"]);
    }

    #[tokio::test]
    async fn test_failed_project_makes_run_incomplete() {
        let runner = runner(&["sync", "source", "target", "--project", "broken"]);
        let (source, destination) = registries();
        let plan = runner
            .plan(&FixedCatalog, &source, &destination, &options("broken"))
            .await
            .unwrap();

        assert!(plan.has_failures());
        let err = runner.finish(&plan, None).unwrap_err();
        assert!(matches!(err, MirrorError::Incomplete(_)));
    }

    #[test]
    fn test_finish_counts_failed_tasks_only() {
        let runner = runner(&["sync", "source", "target", "--project", "demo"]);
        let plan = Plan::default();
        assert!(runner.finish(&plan, Some(&ExecutionReport::default())).is_ok());

        let report = ExecutionReport {
            planned: 1,
            ..ExecutionReport::default()
        };
        assert!(runner.finish(&plan, Some(&report)).is_err());
    }

    #[tokio::test]
    async fn test_list_catalog() {
        let runner = runner(&["ls", "source", "--project", "demo"]);
        let args = LsArgs {
            registry: "source".to_string(),
            project: "demo".to_string(),
            repo: Some("app".to_string()),
        };
        assert!(runner.list_catalog(&FixedCatalog, &args).await.is_ok());

        let broken = LsArgs {
            project: "broken".to_string(),
            repo: None,
            ..args
        };
        assert!(runner.list_catalog(&FixedCatalog, &broken).await.is_err());
    }

    #[test]
    fn test_login_writes_store() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("nested").join("auth.json");
        let config = AppConfig::from_yaml(&format!(
            "auth_store: {}\nregistries:\n  source:\n    url: http://localhost:5001\n",
            store_path.display()
        ))
        .unwrap();

        let runner = runner(&["login", "source", "-u", "admin", "-p", "secret"]);
        let Commands::Login(args) = &runner.args.command else {
            panic!("expected login");
        };
        runner.login(&config, args).unwrap();

        let store = CredentialStore::load(&store_path).unwrap();
        assert_eq!(store.get("source"), Some(&Credentials::new("admin", "secret")));
        assert_eq!(config.credentials_for("source", &store).username, "admin");
    }

    #[test]
    fn test_login_rejects_unknown_registry() {
        let config = AppConfig::from_yaml("registries: {}\n").unwrap();
        let runner = runner(&["login", "nowhere", "-u", "admin", "-p", "secret"]);
        let Commands::Login(args) = &runner.args.command else {
            panic!("expected login");
        };
        assert!(matches!(runner.login(&config, args), Err(MirrorError::Config(_))));
    }

    #[tokio::test]
    async fn test_copy_without_do_is_dry_run() {
        let config = AppConfig::from_yaml("copy_tool_path: airgap-mirror-no-such-tool\n").unwrap();
        let runner = runner(&[
            "copy", "--from", "docker://a:5001/demo/app:1", "--to", "docker://b:5002/demo/app:1",
        ]);
        let Commands::Copy(args) = &runner.args.command else {
            panic!("expected copy");
        };
        assert!(runner.copy(&config, args).await.is_ok());
    }

    #[test]
    fn test_copy_passes_references_through() {
        let config = AppConfig::default();
        let runner = runner(&[
            "copy",
            "--from",
            "docker://localhost:5001/busybox:latest",
            "--to",
            "oci-archive:/tmp/busybox.tar",
            "--dst-insecure",
            "false",
        ]);
        let Commands::Copy(args) = &runner.args.command else {
            panic!("expected copy");
        };

        let (_, command) = runner.copy_command(&config, args).unwrap();
        assert_eq!(command.program, "skopeo");
        assert_eq!(
            command.args,
            vec![
                "copy",
                "--src-tls-verify=false",
                "docker://localhost:5001/busybox:latest",
                "oci-archive:/tmp/busybox.tar",
            ]
        );
    }

    #[tokio::test]
    async fn test_copy_rejects_blank_reference() {
        let config = AppConfig::default();
        let runner = runner(&["copy", "--from", " ", "--to", "docker://b/p/r:1"]);
        let Commands::Copy(args) = &runner.args.command else {
            panic!("expected copy");
        };
        assert!(matches!(
            runner.copy(&config, args).await,
            Err(MirrorError::Validation(_))
        ));
    }
}
