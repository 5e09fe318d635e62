//! Argument vector for one copy tool run

use crate::config::Credentials;
use crate::sync::CopyTask;
use std::fmt;

const SOURCE_CREDS_FLAG: &str = "--src-creds";
const DEST_CREDS_FLAG: &str = "--dest-creds";

/// How the copy tool is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Copy tool on the local path
    Direct { program: String },
    /// `<runtime> run --rm [--network N] <image> copy ...`
    Container {
        runtime: String,
        image: String,
        network: Option<String>,
    },
}

impl RuntimeMode {
    pub fn program(&self) -> &str {
        match self {
            RuntimeMode::Direct { program } => program,
            RuntimeMode::Container { runtime, .. } => runtime,
        }
    }
}

/// TLS and credentials for one side of a copy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOptions {
    pub insecure: bool,
    pub credentials: Credentials,
}

impl EndpointOptions {
    pub fn new(insecure: bool, credentials: Credentials) -> Self {
        Self {
            insecure,
            credentials,
        }
    }
}

/// Everything needed to turn a task into a command, fixed for a whole run
#[derive(Debug, Clone)]
pub struct CopySettings {
    pub mode: RuntimeMode,
    pub source: EndpointOptions,
    pub destination: EndpointOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CopyCommand {
    /// Build the command copying `source_ref` to `destination_ref`
    ///
    /// References are passed through untouched, so they must already carry
    /// the `docker://` transport.
    pub fn build(settings: &CopySettings, source_ref: &str, destination_ref: &str) -> Self {
        let mut args = Vec::new();

        if let RuntimeMode::Container { image, network, .. } = &settings.mode {
            args.extend(["run".to_string(), "--rm".to_string()]);
            if let Some(network) = network {
                args.extend(["--network".to_string(), network.clone()]);
            }
            args.push(image.clone());
        }

        args.push("copy".to_string());
        if settings.source.insecure {
            args.push("--src-tls-verify=false".to_string());
        }
        if settings.destination.insecure {
            args.push("--dest-tls-verify=false".to_string());
        }
        if !settings.source.credentials.is_empty() {
            args.push(SOURCE_CREDS_FLAG.to_string());
            args.push(settings.source.credentials.to_flag_value());
        }
        if !settings.destination.credentials.is_empty() {
            args.push(DEST_CREDS_FLAG.to_string());
            args.push(settings.destination.credentials.to_flag_value());
        }
        args.push(source_ref.to_string());
        args.push(destination_ref.to_string());

        Self {
            program: settings.mode.program().to_string(),
            args,
        }
    }

    pub fn for_task(settings: &CopySettings, task: &CopyTask) -> Self {
        Self::build(
            settings,
            &task.source.transport_ref(),
            &task.destination.transport_ref(),
        )
    }

    /// Arguments with the password part of every credential flag masked
    pub fn redacted_args(&self) -> Vec<String> {
        let mut redacted = Vec::with_capacity(self.args.len());
        let mut mask_next = false;

        for arg in &self.args {
            if mask_next {
                let user = arg.split_once(':').map_or(arg.as_str(), |(user, _)| user);
                redacted.push(format!("{}:***", user));
                mask_next = false;
            } else {
                mask_next = arg == SOURCE_CREDS_FLAG || arg == DEST_CREDS_FLAG;
                redacted.push(arg.clone());
            }
        }

        redacted
    }
}

impl fmt::Display for CopyCommand {
    /// Shell-like form, safe to log
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.redacted_args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
