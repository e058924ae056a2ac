//! Post-write notification through `docker exec`

use async_trait::async_trait;
use bollard::Docker;
use bollard::exec::{CreateExecOptions, StartExecOptions};
use caddy_gen_core::config::NotifyConfig;
use caddy_gen_core::traits::Notifier;
use caddy_gen_core::Error;
use tracing::debug;

/// Runs the notify command inside the target container, detached
///
/// The command's output and exit status are not awaited; a successful
/// start counts as success.
#[derive(Debug, Clone)]
pub struct DockerExecNotifier {
    docker: Docker,
}

impl DockerExecNotifier {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl Notifier for DockerExecNotifier {
    async fn notify(&self, target: &NotifyConfig) -> Result<(), Error> {
        let exec = self
            .docker
            .create_exec(&target.container_id, exec_options(target))
            .await
            .map_err(|e| {
                Error::notify(format!(
                    "Failed to create exec in {}: {}",
                    target.container_id, e
                ))
            })?;

        self.docker
            .start_exec(
                &exec.id,
                Some(StartExecOptions {
                    detach: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| Error::notify(format!("Failed to start exec {}: {}", exec.id, e)))?;

        debug!(exec_id = %exec.id, container_id = %target.container_id, "Exec started");
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "docker-exec"
    }
}

fn exec_options(target: &NotifyConfig) -> CreateExecOptions<String> {
    CreateExecOptions {
        cmd: Some(target.command.clone()),
        working_dir: target.working_dir.clone(),
        attach_stdout: Some(false),
        attach_stderr: Some(false),
        ..Default::default()
    }
}
