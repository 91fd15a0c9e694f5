use std::fmt;

use crate::core::domain::{JudgeResult, TestReport, Verdict};

impl JudgeResult {
    /// First verdict that is not `ACCEPTED`, in test order.
    pub fn headline(&self) -> Verdict {
        self.tests
            .iter()
            .map(|test| &test.verdict)
            .find(|verdict| !verdict.is_accepted())
            .cloned()
            .unwrap_or(Verdict::Accepted)
    }

    /// Wall-clock time of the whole run, zero if the clock went backwards.
    pub fn duration(&self) -> std::time::Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    pub fn accepted_count(&self) -> usize {
        self.tests
            .iter()
            .filter(|test| test.verdict.is_accepted())
            .count()
    }
}

/// Result table for one judged submission.
#[derive(Debug)]
pub struct Report<'a> {
    pub title: &'a str,
    pub result: &'a JudgeResult,
}

impl<'a> Report<'a> {
    pub fn new(title: &'a str, result: &'a JudgeResult) -> Self {
        Self { title, result }
    }
}

const TEST_WIDTH: usize = 6;
const VERDICT_WIDTH: usize = 24;
const TIME_WIDTH: usize = 10;
const MEMORY_WIDTH: usize = 12;

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{}: {}", self.result.problem_id, self.title)?;
        writeln!(
            f,
            "RESULT: {} ({}/{} passed)",
            self.result.headline(),
            self.result.accepted_count(),
            self.result.tests.len()
        )?;
        writeln!(f, "TEST RESULTS:")?;
        writeln!(
            f,
            "{:^TEST_WIDTH$}|{:^VERDICT_WIDTH$}|{:^TIME_WIDTH$}|{:^MEMORY_WIDTH$}",
            "TEST", "VERDICT", "TIME", "MEMORY"
        )?;
        writeln!(
            f,
            "{}+{}+{}+{}",
            "-".repeat(TEST_WIDTH),
            "-".repeat(VERDICT_WIDTH),
            "-".repeat(TIME_WIDTH),
            "-".repeat(MEMORY_WIDTH)
        )?;
        for test in &self.result.tests {
            let (time, memory) = columns(test);
            writeln!(
                f,
                "{:^TEST_WIDTH$}|{:^VERDICT_WIDTH$}|{:^TIME_WIDTH$}|{:^MEMORY_WIDTH$}",
                format!("#{}", test.ordinal),
                test.verdict.to_string(),
                time,
                memory
            )?;
        }
        writeln!(
            f,
            "RUN {} at {} ({:.3} s)",
            self.result.run_id,
            self.result.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.result.duration().as_secs_f64()
        )
    }
}

fn columns(test: &TestReport) -> (String, String) {
    let memory = test
        .peak_memory_mb
        .map(|mb| format!("{:.1} MB", mb))
        .unwrap_or_else(|| "--".to_string());

    // Timings of killed runs only say when the supervisor gave up.
    let time = match (&test.verdict, test.elapsed) {
        (Verdict::TimeLimitExceeded | Verdict::MemoryLimitExceeded, _) | (_, None) => {
            "--".to_string()
        }
        (_, Some(elapsed)) => format!("{:.3} s", elapsed.as_secs_f64()),
    };

    (time, memory)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;

    fn result_with(verdicts: Vec<Verdict>) -> JudgeResult {
        JudgeResult {
            run_id: Uuid::new_v4(),
            problem_id: 1068,
            started_at: chrono::Utc::now(),
            finished_at: chrono::Utc::now(),
            tests: verdicts
                .into_iter()
                .enumerate()
                .map(|(idx, verdict)| TestReport {
                    ordinal: idx + 1,
                    verdict,
                    elapsed: Some(Duration::from_millis(25)),
                    peak_memory_mb: Some(3.5),
                })
                .collect(),
        }
    }

    #[test]
    fn test_headline_is_first_failure() {
        let result = result_with(vec![
            Verdict::Accepted,
            Verdict::WrongAnswer,
            Verdict::TimeLimitExceeded,
        ]);
        assert_eq!(result.headline(), Verdict::WrongAnswer);
        assert_eq!(result.accepted_count(), 1);
    }

    #[test]
    fn test_headline_all_accepted() {
        let result = result_with(vec![Verdict::Accepted, Verdict::Accepted]);
        assert_eq!(result.headline(), Verdict::Accepted);
    }

    #[test]
    fn test_report_table() {
        let mut result = result_with(vec![Verdict::Accepted, Verdict::TimeLimitExceeded]);
        result.tests.push(TestReport {
            ordinal: 3,
            verdict: Verdict::InternalError {
                message: "boom".to_string(),
            },
            elapsed: None,
            peak_memory_mb: None,
        });

        let rendered = Report::new("Weird Algorithm", &result).to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "#1068: Weird Algorithm");
        assert_eq!(lines[1], "RESULT: TIME_LIMIT_EXCEEDED (1/3 passed)");
        assert_eq!(lines.len(), 9);
        assert!(lines[5].contains("#1") && lines[5].contains("0.025 s"));
        assert!(lines[5].contains("3.5 MB"));
        assert!(lines[6].contains("TIME_LIMIT_EXCEEDED") && lines[6].contains("--"));
        assert!(lines[7].contains("ERROR: boom"));
        assert!(lines[8].starts_with(&format!("RUN {} at ", result.run_id)));
    }

    #[test]
    fn test_duration_spans_the_run() {
        let mut result = result_with(vec![Verdict::Accepted]);
        result.finished_at = result.started_at + chrono::Duration::milliseconds(1500);
        assert_eq!(result.duration(), Duration::from_millis(1500));

        let rendered = Report::new("Weird Algorithm", &result).to_string();
        assert!(rendered.trim_end().ends_with("(1.500 s)"));

        result.finished_at = result.started_at - chrono::Duration::seconds(1);
        assert_eq!(result.duration(), Duration::ZERO);
    }
}
