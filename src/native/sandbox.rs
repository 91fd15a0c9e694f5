use std::fs::File;
use std::io::SeekFrom;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::{Instant, timeout};

use crate::config::SandboxConfig;
use crate::constants::BYTES_PER_MB;
use crate::core::{
    domain::{BuildArtifact, ExecutionLimits, ExecutionSample, LimitKind},
    traits::sandbox::{Execution, RunError, Sandbox},
};
use crate::native::probe::ProcessProbe;

/// Runs artifacts as plain child processes and enforces limits by polling
/// them, without any kernel-side isolation.
#[derive(Clone, Debug)]
pub struct NativeSandbox {
    poll_interval: Duration,
    grace_period: Duration,
}

#[derive(Debug)]
enum Stop {
    Exited(ExitStatus),
    Vanished,
    Limit(LimitKind),
}

#[derive(Debug)]
struct Supervision {
    stop: Stop,
    peak_bytes: u64,
    elapsed: Duration,
}

impl NativeSandbox {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            grace_period: config.grace_period,
        }
    }

    async fn supervise(
        &self,
        child: &mut Child,
        probe: &mut Option<ProcessProbe>,
        output: &File,
        limits: &ExecutionLimits,
        start: Instant,
    ) -> std::io::Result<Supervision> {
        let memory_limit_bytes = limits.memory_mb * BYTES_PER_MB;
        let mut peak_bytes = 0u64;
        let mut elapsed;

        let stop = loop {
            elapsed = start.elapsed();
            if let Some(status) = child.try_wait()? {
                break Stop::Exited(status);
            }
            let Some(resident) = probe.as_mut().and_then(ProcessProbe::resident_bytes) else {
                break Stop::Vanished;
            };
            peak_bytes = peak_bytes.max(resident);

            if peak_bytes as f64 >= memory_limit_bytes {
                break Stop::Limit(LimitKind::Memory);
            }
            if elapsed >= limits.time {
                break Stop::Limit(LimitKind::Time);
            }
            if output.metadata()?.len() >= limits.output_bytes {
                break Stop::Limit(LimitKind::Output);
            }

            tokio::time::sleep(self.poll_interval).await;
        };

        Ok(Supervision {
            stop,
            peak_bytes,
            elapsed,
        })
    }

    /// Stops a process that broke a limit and reaps it.
    async fn teardown(
        &self,
        child: &mut Child,
        probe: &mut Option<ProcessProbe>,
    ) -> std::io::Result<()> {
        if let Some(probe) = probe.as_mut() {
            let killed = probe.kill_descendants();
            if killed > 0 {
                tracing::debug!("Killed {} descendant processes", killed);
            }
            if probe.terminate() {
                if let Ok(status) = timeout(self.grace_period, child.wait()).await {
                    let status = status?;
                    tracing::debug!("Process stopped within grace period: {}", status);
                    return Ok(());
                }
            }
        }
        child.kill().await
    }
}

#[async_trait::async_trait]
impl Sandbox for NativeSandbox {
    #[tracing::instrument(skip(self, artifact, stdin), fields(target = %artifact.target.display()))]
    async fn execute(
        &self,
        artifact: &BuildArtifact,
        stdin: &str,
        limits: &ExecutionLimits,
    ) -> Result<Execution, RunError> {
        let output = tempfile::tempfile()?;
        let (program, args) = artifact.command_line();

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(output.try_clone()?))
            .stderr(Stdio::from(output.try_clone()?))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunError::Spawn {
                program: program.display().to_string(),
                msg: e.to_string(),
            })?;
        let start = Instant::now();
        let mut probe = child.id().map(ProcessProbe::new);
        tracing::debug!("Spawned process {:?}", child.id());

        // The child may exit without reading its input; a broken pipe here
        // is not a failure of the test.
        let feeder = child.stdin.take().map(|mut pipe| {
            let input = stdin.to_owned();
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(input.as_bytes()).await {
                    tracing::debug!("Could not write stdin: {}", e);
                }
            })
        });

        let supervised = self
            .supervise(&mut child, &mut probe, &output, limits, start)
            .await;
        if let Some(feeder) = feeder {
            feeder.abort();
        }
        let supervision = match supervised {
            Ok(supervision) => supervision,
            Err(e) => {
                let _ = child.kill().await;
                return Err(e.into());
            }
        };
        tracing::debug!("Supervision ended: {:?}", supervision);

        let (exit_code, stopped_by) = match supervision.stop {
            Stop::Exited(status) => (Some(exit_code(status)), None),
            Stop::Vanished => (Some(exit_code(child.wait().await?)), None),
            Stop::Limit(kind) => {
                self.teardown(&mut child, &mut probe).await?;
                (None, Some(kind))
            }
        };

        let output_bytes = output.metadata()?.len();
        let within_ceiling =
            stopped_by != Some(LimitKind::Output) && output_bytes <= limits.output_bytes;
        let output = if within_ceiling {
            read_output(output).await?
        } else {
            String::new()
        };

        Ok(Execution {
            sample: ExecutionSample {
                peak_memory_mb: supervision.peak_bytes as f64 / BYTES_PER_MB,
                elapsed: supervision.elapsed,
                exit_code,
                output_bytes,
                stopped_by,
            },
            output,
        })
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

async fn read_output(file: File) -> std::io::Result<String> {
    let mut file = tokio::fs::File::from_std(file);
    file.seek(SeekFrom::Start(0)).await?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
