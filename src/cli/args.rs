//! Command-line argument parsing

use crate::error::{MirrorError, Result};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "airgap-mirror")]
#[command(about = "Mirror Harbor projects between registries for air-gapped networks")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(
        long = "config",
        global = true,
        default_value = "config.yaml",
        help = "Path to the YAML configuration file"
    )]
    pub config: PathBuf,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(
        long = "quiet",
        short = 'q',
        global = true,
        conflicts_with = "verbose",
        help = "Only print errors"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy matching images from one registry to another (dry-run by default)
    Sync(SyncArgs),
    /// List repositories of a project, or artifacts of one repository
    Ls(LsArgs),
    /// Copy a single explicit image reference
    Copy(CopyArgs),
    /// Store credentials for a configured registry
    Login(LoginArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SyncArgs {
    /// Source registry name from the config
    pub from: String,

    /// Destination registry name from the config
    pub to: String,

    #[arg(long = "project", help = "Project to sync; selects rules when --rules is given")]
    pub project: Option<String>,

    #[arg(long = "rules", help = "Rules file (overrides --repo and --tags)")]
    pub rules: Option<PathBuf>,

    #[arg(long = "repo", help = "Single repository to sync")]
    pub repo: Option<String>,

    #[arg(
        long = "tags",
        value_delimiter = ',',
        help = "Tag globs to include, comma separated (default: all)"
    )]
    pub tags: Vec<String>,

    #[arg(
        long = "dry-run",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Print what would be copied without copying"
    )]
    pub dry_run: bool,

    #[arg(
        long = "concurrency",
        short = 'j',
        default_value_t = 2,
        help = "Number of parallel copy operations"
    )]
    pub concurrency: usize,

    #[arg(long = "docker-network", help = "Docker network for containerized copies")]
    pub docker_network: Option<String>,
}

impl SyncArgs {
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_none() && self.project.as_deref().is_none_or(|p| p.trim().is_empty()) {
            return Err(MirrorError::Validation(
                "--project is required unless --rules is given".to_string(),
            ));
        }
        if self.from == self.to {
            return Err(MirrorError::Validation(format!(
                "source and destination are both {:?}",
                self.from
            )));
        }
        Ok(())
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LsArgs {
    /// Registry name from the config
    pub registry: String,

    #[arg(long = "project", help = "Project to list")]
    pub project: String,

    #[arg(long = "repo", help = "Repository whose artifacts to list")]
    pub repo: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CopyArgs {
    #[arg(long = "from", help = "Source reference, e.g. docker://localhost:5001/demo/app:1.0")]
    pub from: String,

    #[arg(long = "to", help = "Destination reference, e.g. docker://localhost:5002/demo/app:1.0")]
    pub to: String,

    #[arg(
        long = "src-insecure",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Disable TLS verification for the source"
    )]
    pub src_insecure: bool,

    #[arg(
        long = "dst-insecure",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Disable TLS verification for the destination"
    )]
    pub dst_insecure: bool,

    #[arg(long = "do", help = "Actually perform the copy (otherwise dry-run)")]
    pub execute: bool,

    #[arg(long = "docker-network", help = "Docker network for containerized copies")]
    pub docker_network: Option<String>,
}

impl CopyArgs {
    pub fn validate(&self) -> Result<()> {
        if self.from.trim().is_empty() || self.to.trim().is_empty() {
            return Err(MirrorError::Validation(
                "--from and --to must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LoginArgs {
    /// Registry name from the config
    pub registry: String,

    #[arg(long = "username", short = 'u', help = "Registry username")]
    pub username: String,

    #[arg(
        long = "password",
        short = 'p',
        conflicts_with = "password_stdin",
        help = "Registry password"
    )]
    pub password: Option<String>,

    #[arg(long = "password-stdin", help = "Read the password from stdin")]
    pub password_stdin: bool,
}

impl LoginArgs {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(MirrorError::Validation("--username must not be empty".to_string()));
        }
        if self.password.is_none() && !self.password_stdin {
            return Err(MirrorError::Validation(
                "provide --password or --password-stdin".to_string(),
            ));
        }
        Ok(())
    }
}
