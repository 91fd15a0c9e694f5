use std::path::PathBuf;

use crate::core::domain::TestCase;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("could not find test cases for problem {problem_id} at {}", path.display())]
    Missing { problem_id: u32, path: PathBuf },
    #[error("malformed test archive: {reason}")]
    Malformed { reason: String },
    #[error("could not read test archive: {msg}")]
    Unreadable { msg: String },
}

/// Source of a problem's ordered test cases.
#[mockall::automock]
#[async_trait::async_trait]
pub trait TestArchive: std::fmt::Debug + Send + Sync {
    async fn extract(&self, problem_id: u32) -> Result<Vec<TestCase>, ArchiveError>;
}
