use crate::core::domain::{ExecutionLimits, ExecutionSample, LimitKind, Verdict};

/// Classifies one finished execution.
///
/// Checks run in a fixed order and the first match wins: memory, exit
/// code, time, output size, then the answer itself. A process stopped by
/// the supervisor has no exit code and carries the limit it was stopped
/// for, which decides the verdict even when the recorded value sits
/// exactly on the limit.
pub fn derive_verdict(
    sample: &ExecutionSample,
    limits: &ExecutionLimits,
    output: &str,
    expected: &str,
) -> Verdict {
    let stopped_by = |kind| sample.stopped_by == Some(kind);

    if stopped_by(LimitKind::Memory) || sample.peak_memory_mb > limits.memory_mb {
        return Verdict::MemoryLimitExceeded;
    }
    if matches!(sample.exit_code, Some(code) if code != 0) {
        return Verdict::RuntimeError;
    }
    if stopped_by(LimitKind::Time) || sample.elapsed > limits.time {
        return Verdict::TimeLimitExceeded;
    }
    if stopped_by(LimitKind::Output) || sample.output_bytes > limits.output_bytes {
        return Verdict::OutputLimitExceeded;
    }
    if sample.stopped_by.is_none() && sample.exit_code.is_none() {
        return Verdict::RuntimeError;
    }

    if tokens_match(output, expected) {
        Verdict::Accepted
    } else {
        Verdict::WrongAnswer
    }
}

/// Exact, case-sensitive comparison of whitespace-delimited tokens.
pub fn tokens_match(output: &str, expected: &str) -> bool {
    itertools::equal(output.split_whitespace(), expected.split_whitespace())
}
