use std::sync::Arc;

use uuid::Uuid;

use crate::core::{
    domain::{BuildArtifact, ExecutionLimits, JudgeResult, ProblemRecord, TestCase, TestReport, Verdict},
    traits::sandbox::Sandbox,
    verdict::derive_verdict,
};

/// Runs every test case in order, one process at a time.
///
/// A failing test never stops the run: each test case gets exactly one
/// report, in the same order as `tests`.
#[tracing::instrument(skip_all, fields(run_id = %run_id, problem_id = problem.id, tests = tests.len()))]
pub async fn run_tests(
    run_id: Uuid,
    sandbox: &Arc<dyn Sandbox>,
    artifact: &BuildArtifact,
    problem: &ProblemRecord,
    tests: &[TestCase],
    output_limit_bytes: u64,
) -> JudgeResult {
    let started_at = chrono::Utc::now();
    let limits = ExecutionLimits::for_problem(problem, output_limit_bytes);

    let mut reports = Vec::with_capacity(tests.len());
    for test in tests {
        let report = run_test(sandbox, artifact, test, &limits).await;
        tracing::info!(
            "Test #{}: {} ({:?}, {:?} MB)",
            report.ordinal,
            report.verdict,
            report.elapsed,
            report.peak_memory_mb
        );
        reports.push(report);
    }

    JudgeResult {
        run_id,
        problem_id: problem.id,
        started_at,
        finished_at: chrono::Utc::now(),
        tests: reports,
    }
}

async fn run_test(
    sandbox: &Arc<dyn Sandbox>,
    artifact: &BuildArtifact,
    test: &TestCase,
    limits: &ExecutionLimits,
) -> TestReport {
    match sandbox.execute(artifact, &test.input, limits).await {
        Ok(execution) => TestReport {
            ordinal: test.ordinal,
            verdict: derive_verdict(
                &execution.sample,
                limits,
                &execution.output,
                &test.expected_output,
            ),
            elapsed: Some(execution.sample.elapsed),
            peak_memory_mb: Some(execution.sample.peak_memory_mb),
        },
        Err(e) => {
            tracing::error!("Test #{} could not be supervised: {}", test.ordinal, e);
            TestReport {
                ordinal: test.ordinal,
                verdict: Verdict::InternalError {
                    message: e.to_string(),
                },
                elapsed: None,
                peak_memory_mb: None,
            }
        }
    }
}
