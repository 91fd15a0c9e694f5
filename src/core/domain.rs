use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LimitError {
    #[error("time limit must be a positive number of seconds, got {0}")]
    Time(f64),
    #[error("memory limit must be a positive number of megabytes, got {0}")]
    Memory(f64),
}

/// Per-problem metadata the engine needs: which archive to read and the
/// limits every test case runs under.
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemRecord {
    pub id: u32,
    pub time_limit: Duration,
    pub memory_limit_mb: f64,
}

impl ProblemRecord {
    pub fn new(id: u32, time_limit_s: f64, memory_limit_mb: f64) -> Result<Self, LimitError> {
        if !(time_limit_s.is_finite() && time_limit_s > 0.0) {
            return Err(LimitError::Time(time_limit_s));
        }
        if !(memory_limit_mb.is_finite() && memory_limit_mb > 0.0) {
            return Err(LimitError::Memory(memory_limit_mb));
        }

        Ok(Self {
            id,
            time_limit: Duration::from_secs_f64(time_limit_s),
            memory_limit_mb,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub ordinal: usize,
    pub input: String,
    pub expected_output: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
    Java,
    Python,
}

impl Language {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "c" => Some(Language::C),
            "cpp" | "cxx" | "cc" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "py" => Some(Language::Python),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::Python => "Python",
        };
        f.write_str(name)
    }
}

/// How a [`BuildArtifact`] is started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Executor {
    /// The target is a native executable.
    Direct,
    /// The target is handed to another program: `program args.. target`.
    Interpreter { program: PathBuf, args: Vec<OsString> },
}

#[derive(Clone, Debug)]
pub struct BuildArtifact {
    pub target: PathBuf,
    pub executor: Executor,
    /// Build directory holding compiled output. Removed when the last
    /// clone of the artifact is dropped.
    pub workspace: Option<Arc<TempDir>>,
}

impl BuildArtifact {
    pub fn compiled(target: PathBuf, workspace: TempDir) -> Self {
        Self {
            target,
            executor: Executor::Direct,
            workspace: Some(Arc::new(workspace)),
        }
    }

    pub fn interpreted(target: PathBuf, interpreter: PathBuf) -> Self {
        Self {
            target,
            executor: Executor::Interpreter {
                program: interpreter,
                args: Vec::new(),
            },
            workspace: None,
        }
    }

    /// Program to spawn and the arguments that follow it.
    pub fn command_line(&self) -> (&Path, Vec<OsString>) {
        match &self.executor {
            Executor::Direct => (self.target.as_path(), Vec::new()),
            Executor::Interpreter { program, args } => {
                let mut argv = args.clone();
                argv.push(self.target.clone().into_os_string());
                (program.as_path(), argv)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionLimits {
    pub time: Duration,
    pub memory_mb: f64,
    pub output_bytes: u64,
}

impl ExecutionLimits {
    pub fn for_problem(problem: &ProblemRecord, output_bytes: u64) -> Self {
        Self {
            time: problem.time_limit,
            memory_mb: problem.memory_limit_mb,
            output_bytes,
        }
    }
}

/// Limit the supervisor enforced by stopping a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LimitKind {
    Memory,
    Time,
    Output,
}

/// What the supervisor observed while one test case ran.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionSample {
    pub peak_memory_mb: f64,
    pub elapsed: Duration,
    /// `None` when the supervisor stopped the process before it exited.
    pub exit_code: Option<i32>,
    pub output_bytes: u64,
    pub stopped_by: Option<LimitKind>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    OutputLimitExceeded,
    InternalError { message: String },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => f.write_str("ACCEPTED"),
            Verdict::WrongAnswer => f.write_str("WRONG_ANSWER"),
            Verdict::TimeLimitExceeded => f.write_str("TIME_LIMIT_EXCEEDED"),
            Verdict::MemoryLimitExceeded => f.write_str("MEMORY_LIMIT_EXCEEDED"),
            Verdict::RuntimeError => f.write_str("RUNTIME_ERROR"),
            Verdict::OutputLimitExceeded => f.write_str("OUTPUT_LIMIT_EXCEEDED"),
            Verdict::InternalError { message } => write!(f, "ERROR: {}", message),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestReport {
    pub ordinal: usize,
    pub verdict: Verdict,
    pub elapsed: Option<Duration>,
    pub peak_memory_mb: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct JudgeResult {
    pub run_id: Uuid,
    pub problem_id: u32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub tests: Vec<TestReport>,
}
