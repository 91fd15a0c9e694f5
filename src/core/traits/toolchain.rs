use std::path::Path;

use crate::core::domain::{BuildArtifact, Language};

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("{extension:?} files are not supported")]
    UnsupportedLanguage { extension: String },
    #[error("no {language} toolchain found on the search path (tried: {})", .candidates.join(", "))]
    ToolchainUnavailable {
        language: Language,
        candidates: Vec<String>,
    },
    #[error("compilation with {compiler} failed:\n{diagnostics}")]
    CompileError {
        compiler: String,
        diagnostics: String,
    },
    #[error("compilation with {compiler} did not finish in {timeout_ms} ms")]
    CompileTimeout { compiler: String, timeout_ms: u64 },
    #[error("could not prepare build: {msg}")]
    Internal { msg: String },
}

/// Turns a source file into something the sandbox can start.
#[mockall::automock]
#[async_trait::async_trait]
pub trait Toolchain: std::fmt::Debug + Send + Sync {
    async fn prepare(&self, source: &Path) -> Result<BuildArtifact, PrepareError>;
}
