//! Running the copy tool as a subprocess

use crate::copy::command::{CopyCommand, CopySettings};
use crate::error::{MirrorError, Result};
use crate::logging::Logger;
use crate::sync::CopyTask;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Performs one copy task
///
/// Returns the tool output on success. A failed run is a
/// [`MirrorError::Copy`] carrying whatever the tool printed.
#[async_trait]
pub trait CopyInvoker: Send + Sync {
    async fn invoke(&self, task: &CopyTask) -> Result<String>;
}

pub struct SkopeoInvoker {
    settings: CopySettings,
    output: Logger,
}

impl SkopeoInvoker {
    pub fn new(settings: CopySettings, output: Logger) -> Self {
        Self { settings, output }
    }

    pub fn settings(&self) -> &CopySettings {
        &self.settings
    }

    pub fn command_for(&self, task: &CopyTask) -> CopyCommand {
        CopyCommand::for_task(&self.settings, task)
    }

    /// Run `command` to completion; `reference` names the copy in errors
    pub async fn run(&self, command: &CopyCommand, reference: &str) -> Result<String> {
        self.output.detail(&format!("exec {}", command));

        let result = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                MirrorError::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to start {}: {}", command.program, e),
                ))
            })?;

        let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&result.stderr));

        if result.status.success() {
            Ok(combined)
        } else {
            if combined.trim().is_empty() {
                combined = format!("{} exited with {}", command.program, result.status);
            }
            Err(MirrorError::Copy {
                reference: reference.to_string(),
                output: combined.trim_end().to_string(),
            })
        }
    }
}

#[async_trait]
impl CopyInvoker for SkopeoInvoker {
    async fn invoke(&self, task: &CopyTask) -> Result<String> {
        let command = self.command_for(task);
        self.run(&command, &task.source.transport_ref()).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::concurrency::{TaskOutcome, TaskState};
    use crate::config::Credentials;
    use crate::copy::command::{EndpointOptions, RuntimeMode};
    use crate::sync::ImageRef;

    fn invoker(program: &str) -> SkopeoInvoker {
        SkopeoInvoker::new(
            CopySettings {
                mode: RuntimeMode::Direct {
                    program: program.to_string(),
                },
                source: EndpointOptions::new(true, Credentials::new("admin", "pw")),
                destination: EndpointOptions::default(),
            },
            Logger::new_quiet(),
        )
    }

    fn task() -> CopyTask {
        CopyTask::new(
            ImageRef::new("localhost:5001", "demo", "app", "1.0"),
            ImageRef::new("localhost:5002", "demo", "app", "1.0"),
        )
    }

    #[tokio::test]
    async fn test_successful_run_returns_output() {
        let output = invoker("echo").invoke(&task()).await.unwrap();
        assert_eq!(
            output.trim(),
            "copy --src-tls-verify=false --src-creds admin:pw \
             docker://localhost:5001/demo/app:1.0 docker://localhost:5002/demo/app:1.0"
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_copy_error() {
        let err = invoker("false").invoke(&task()).await.unwrap_err();
        match &err {
            MirrorError::Copy { reference, output } => {
                assert_eq!(reference, "docker://localhost:5001/demo/app:1.0");
                assert!(output.contains("exited with"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            TaskOutcome::from_result(&Err(err)).state(),
            TaskState::Failed
        );
    }

    #[tokio::test]
    async fn test_missing_output_marker_is_captured() {
        let command = CopyCommand {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo 'reading manifest 1.0: manifest unknown' >&2; exit 1".to_string(),
            ],
        };
        let result = invoker("sh").run(&command, "docker://src/demo/app:1.0").await;
        assert_eq!(TaskOutcome::from_result(&result).state(), TaskState::Skipped);
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_start() {
        let err = invoker("airgap-mirror-no-such-tool")
            .invoke(&task())
            .await
            .unwrap_err();
        assert!(matches!(err, MirrorError::Io(_)));
        assert!(err.to_string().contains("airgap-mirror-no-such-tool"));
    }
}
