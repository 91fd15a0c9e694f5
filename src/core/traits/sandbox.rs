use crate::core::domain::{BuildArtifact, ExecutionLimits, ExecutionSample};

#[derive(Clone, Debug)]
pub struct Execution {
    pub sample: ExecutionSample,
    /// Combined stdout and stderr. Empty when the output ceiling was hit.
    pub output: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to start {program}: {msg}")]
    Spawn { program: String, msg: String },
    #[error("supervision failed: {msg}")]
    Supervision { msg: String },
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::Supervision { msg: e.to_string() }
    }
}

/// Runs an artifact once on the given input under resource supervision.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Sandbox: std::fmt::Debug + Send + Sync {
    async fn execute(
        &self,
        artifact: &BuildArtifact,
        stdin: &str,
        limits: &ExecutionLimits,
    ) -> Result<Execution, RunError>;
}
