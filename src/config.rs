use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

use crate::constants::{
    ARCHIVE_DIR, COMPILE_TIMEOUT, GRACE_PERIOD, MANIFEST_FILE, OUTPUT_LIMIT_BYTES, POLL_INTERVAL,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Judge a solution against a problem's stored test cases.
#[derive(Debug, Parser)]
#[command(name = "local-judge", version)]
pub struct Cli {
    /// List position, problem number or title (`_` for spaces)
    pub problem: String,

    /// Solution file (.c, .cpp, .java or .py)
    pub source: PathBuf,

    #[command(flatten)]
    pub options: ConfigArgs,
}

/// Overrides for the built-in defaults, each also readable from the
/// environment.
#[derive(Clone, Debug, Default, Args)]
pub struct ConfigArgs {
    /// Directory holding manifest.json and io/<id>.zip
    #[arg(long, env = "LOCAL_JUDGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Parent directory of build workspaces
    #[arg(long, env = "LOCAL_JUDGE_BUILD_DIR")]
    pub build_dir: Option<PathBuf>,

    /// Comma-separated C compiler candidates
    #[arg(long, env = "LOCAL_JUDGE_CC")]
    pub cc: Option<String>,

    /// Comma-separated C++ compiler candidates
    #[arg(long, env = "LOCAL_JUDGE_CXX")]
    pub cxx: Option<String>,

    #[arg(long, env = "LOCAL_JUDGE_JAVAC")]
    pub javac: Option<String>,

    #[arg(long, env = "LOCAL_JUDGE_JAVA")]
    pub java: Option<String>,

    #[arg(long, env = "LOCAL_JUDGE_PYTHON")]
    pub python: Option<String>,

    #[arg(long, env = "LOCAL_JUDGE_COMPILER_FALLBACK", value_enum)]
    pub compiler_fallback: Option<CompilerFallback>,

    #[arg(
        long,
        env = "LOCAL_JUDGE_COMPILE_TIMEOUT_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub compile_timeout_ms: Option<u64>,
}

/// What the dispatcher does when a compiler is present but fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum CompilerFallback {
    /// Only the first compiler found on the search path is tried.
    #[default]
    FirstFound,
    /// Keep going down the candidate list until one compiler succeeds.
    FirstSuccessful,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolchainConfig {
    pub build_dir: PathBuf,
    pub c_compilers: Vec<String>,
    pub cpp_compilers: Vec<String>,
    pub java_compiler: String,
    pub java_launcher: String,
    pub python_interpreter: String,
    pub fallback: CompilerFallback,
    pub compile_timeout: Duration,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        let msvc_first: &[&str] = if cfg!(windows) { &["clang-cl"] } else { &[] };
        let owned = |names: &[&str]| -> Vec<String> {
            msvc_first
                .iter()
                .chain(names)
                .map(|name| name.to_string())
                .collect()
        };

        Self {
            build_dir: std::env::temp_dir().join("local-judge"),
            c_compilers: owned(&["clang", "gcc", "cc"]),
            cpp_compilers: owned(&["clang++", "g++", "c++"]),
            java_compiler: "javac".to_string(),
            java_launcher: "java".to_string(),
            python_interpreter: if cfg!(windows) { "python" } else { "python3" }.to_string(),
            fallback: CompilerFallback::default(),
            compile_timeout: COMPILE_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SandboxConfig {
    pub poll_interval: Duration,
    pub grace_period: Duration,
    pub output_limit_bytes: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            grace_period: GRACE_PERIOD,
            output_limit_bytes: OUTPUT_LIMIT_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JudgeConfig {
    pub data_dir: PathBuf,
    pub toolchain: ToolchainConfig,
    pub sandbox: SandboxConfig,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            toolchain: ToolchainConfig::default(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl JudgeConfig {
    /// Applies `args` over the defaults. Options left unset keep their
    /// default value.
    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let toolchain = &mut config.toolchain;

        if let Some(dir) = args.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = args.build_dir {
            toolchain.build_dir = dir;
        }
        if let Some(list) = args.cc {
            toolchain.c_compilers = name_list("LOCAL_JUDGE_CC", &list)?;
        }
        if let Some(list) = args.cxx {
            toolchain.cpp_compilers = name_list("LOCAL_JUDGE_CXX", &list)?;
        }
        if let Some(name) = args.javac {
            toolchain.java_compiler = name;
        }
        if let Some(name) = args.java {
            toolchain.java_launcher = name;
        }
        if let Some(name) = args.python {
            toolchain.python_interpreter = name;
        }
        if let Some(fallback) = args.compiler_fallback {
            toolchain.fallback = fallback;
        }
        if let Some(ms) = args.compile_timeout_ms {
            toolchain.compile_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(MANIFEST_FILE)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join(ARCHIVE_DIR)
    }
}

fn name_list(key: &str, value: &str) -> Result<Vec<String>, ConfigError> {
    let names: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if names.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a comma-separated list of program names".to_string(),
        });
    }
    Ok(names)
}
