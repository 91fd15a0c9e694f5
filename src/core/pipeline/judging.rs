use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::{
    domain::{JudgeResult, ProblemRecord},
    pipeline::running::run_tests,
    traits::{
        archive::{ArchiveError, TestArchive},
        sandbox::Sandbox,
        toolchain::{PrepareError, Toolchain},
    },
};

/// Reasons a judge run could not start. No test has run when one of
/// these is returned.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Prepare(#[from] PrepareError),
}

#[derive(Clone, Debug)]
pub struct JudgeService {
    toolchain: Arc<dyn Toolchain>,
    sandbox: Arc<dyn Sandbox>,
    archive: Arc<dyn TestArchive>,
    output_limit_bytes: u64,
}

impl JudgeService {
    pub fn new(
        toolchain: Arc<dyn Toolchain>,
        sandbox: Arc<dyn Sandbox>,
        archive: Arc<dyn TestArchive>,
        output_limit_bytes: u64,
    ) -> Self {
        Self {
            toolchain,
            sandbox,
            archive,
            output_limit_bytes,
        }
    }

    /// Judges `source` against every test case of `problem`.
    ///
    /// Test data is loaded before the build so a missing archive never
    /// costs a compilation.
    #[tracing::instrument(skip(self), fields(run_id = tracing::field::Empty))]
    pub async fn judge(
        &self,
        source: &Path,
        problem: &ProblemRecord,
    ) -> Result<JudgeResult, JudgeError> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let tests = self.archive.extract(problem.id).await?;
        tracing::info!("Loaded {} test cases", tests.len());

        let artifact = self.toolchain.prepare(source).await?;
        tracing::debug!("Prepared artifact: {:?}", artifact);

        let result = run_tests(
            run_id,
            &self.sandbox,
            &artifact,
            problem,
            &tests,
            self.output_limit_bytes,
        )
        .await;
        tracing::info!("Judge run finished: {}", result.headline());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::constants::OUTPUT_LIMIT_BYTES;
    use crate::core::{
        domain::{BuildArtifact, ExecutionSample, Language, TestCase, Verdict},
        traits::{
            archive::MockTestArchive,
            sandbox::{Execution, MockSandbox},
            toolchain::MockToolchain,
        },
    };

    fn problem() -> ProblemRecord {
        ProblemRecord::new(1083, 1.0, 512.0).expect("Limits are valid")
    }

    fn archive_with(tests: Vec<TestCase>) -> MockTestArchive {
        let mut archive = MockTestArchive::new();
        archive
            .expect_extract()
            .withf(|problem_id| *problem_id == 1083)
            .returning(move |_| Ok(tests.clone()));
        archive
    }

    fn python_toolchain() -> MockToolchain {
        let mut toolchain = MockToolchain::new();
        toolchain.expect_prepare().returning(|source| {
            Ok(BuildArtifact::interpreted(
                source.to_path_buf(),
                PathBuf::from("/usr/bin/python3"),
            ))
        });
        toolchain
    }

    fn echo_sandbox() -> MockSandbox {
        let mut sandbox = MockSandbox::new();
        sandbox.expect_execute().returning(|_, stdin, _| {
            Ok(Execution {
                sample: ExecutionSample {
                    peak_memory_mb: 1.0,
                    elapsed: Duration::from_millis(5),
                    exit_code: Some(0),
                    output_bytes: stdin.len() as u64,
                    stopped_by: None,
                },
                output: stdin.to_string(),
            })
        });
        sandbox
    }

    fn service(
        toolchain: MockToolchain,
        sandbox: MockSandbox,
        archive: MockTestArchive,
    ) -> JudgeService {
        JudgeService::new(
            Arc::new(toolchain),
            Arc::new(sandbox),
            Arc::new(archive),
            OUTPUT_LIMIT_BYTES,
        )
    }

    fn echo_tests() -> Vec<TestCase> {
        vec![
            TestCase {
                ordinal: 1,
                input: "1 2 3\n".to_string(),
                expected_output: "1 2 3".to_string(),
            },
            TestCase {
                ordinal: 2,
                input: "4 5".to_string(),
                expected_output: "4 6".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_judge_runs_every_test() {
        let service = service(python_toolchain(), echo_sandbox(), archive_with(echo_tests()));

        let result = service
            .judge(Path::new("solution.py"), &problem())
            .await
            .expect("Judge run should succeed");

        assert_eq!(result.problem_id, 1083);
        assert_eq!(result.tests.len(), 2);
        assert_eq!(result.tests[0].verdict, Verdict::Accepted);
        assert_eq!(result.tests[1].verdict, Verdict::WrongAnswer);
        assert!(result.finished_at >= result.started_at);
    }

    #[tokio::test]
    async fn test_missing_archive_aborts_before_build() {
        let mut archive = MockTestArchive::new();
        archive.expect_extract().returning(|problem_id| {
            Err(ArchiveError::Missing {
                problem_id,
                path: PathBuf::from("data/io/1083.zip"),
            })
        });
        let mut toolchain = MockToolchain::new();
        toolchain.expect_prepare().never();
        let mut sandbox = MockSandbox::new();
        sandbox.expect_execute().never();

        let result = service(toolchain, sandbox, archive)
            .judge(Path::new("solution.py"), &problem())
            .await;

        assert!(matches!(
            result,
            Err(JudgeError::Archive(ArchiveError::Missing { problem_id: 1083, .. }))
        ));
    }

    #[tokio::test]
    async fn test_toolchain_failure_aborts_run() {
        let mut toolchain = MockToolchain::new();
        toolchain.expect_prepare().returning(|_| {
            Err(PrepareError::ToolchainUnavailable {
                language: Language::Cpp,
                candidates: vec!["clang++".to_string(), "g++".to_string()],
            })
        });
        let mut sandbox = MockSandbox::new();
        sandbox.expect_execute().never();

        let result = service(toolchain, sandbox, archive_with(echo_tests()))
            .judge(Path::new("solution.cpp"), &problem())
            .await;

        assert!(matches!(
            result,
            Err(JudgeError::Prepare(PrepareError::ToolchainUnavailable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_compile_error_surfaces_diagnostics() {
        let mut toolchain = MockToolchain::new();
        toolchain.expect_prepare().returning(|_| {
            Err(PrepareError::CompileError {
                compiler: "g++".to_string(),
                diagnostics: "error: expected ';' before 'return'".to_string(),
            })
        });
        let mut sandbox = MockSandbox::new();
        sandbox.expect_execute().never();

        let err = service(toolchain, sandbox, archive_with(echo_tests()))
            .judge(Path::new("solution.cpp"), &problem())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("expected ';'"));
    }

    #[tokio::test]
    async fn test_rejudge_is_idempotent() {
        let tests: Vec<TestCase> = echo_tests()
            .into_iter()
            .map(|test| TestCase {
                expected_output: test.input.clone(),
                ..test
            })
            .collect();
        let service = service(python_toolchain(), echo_sandbox(), archive_with(tests));

        let mut run_ids = Vec::new();
        for _ in 0..2 {
            let result = service
                .judge(Path::new("solution.py"), &problem())
                .await
                .expect("Judge run should succeed");

            assert_eq!(result.headline(), Verdict::Accepted);
            assert_eq!(
                result.tests.iter().map(|t| (t.ordinal, &t.verdict)).collect::<Vec<_>>(),
                vec![(1, &Verdict::Accepted), (2, &Verdict::Accepted)]
            );
            run_ids.push(result.run_id);
        }
        assert_ne!(run_ids[0], run_ids[1]);
    }
}
