use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{CompilerFallback, ToolchainConfig};
use crate::core::{
    domain::{BuildArtifact, Executor, Language},
    traits::toolchain::{PrepareError, Toolchain},
};
use crate::native::path;

/// Build-or-interpret strategy for one language.
#[derive(Clone, Debug, PartialEq)]
pub enum Recipe {
    /// `<compiler> <source> -o <output>`, first resolvable candidate wins.
    CLike { compilers: Vec<String> },
    /// `<javac> -d <dir> <source>`, then `<launcher> -cp <dir> <class>`.
    Java {
        compilers: Vec<String>,
        launcher: String,
    },
    Interpreted { interpreter: String },
}

#[derive(Debug)]
pub struct NativeToolchain {
    recipes: HashMap<Language, Recipe>,
    build_dir: PathBuf,
    fallback: CompilerFallback,
    compile_timeout: Duration,
}

enum Protocol<'a> {
    CLike,
    Java { launcher: &'a Path },
}

impl NativeToolchain {
    pub fn new(config: &ToolchainConfig) -> Self {
        let recipes = HashMap::from([
            (
                Language::C,
                Recipe::CLike {
                    compilers: config.c_compilers.clone(),
                },
            ),
            (
                Language::Cpp,
                Recipe::CLike {
                    compilers: config.cpp_compilers.clone(),
                },
            ),
            (
                Language::Java,
                Recipe::Java {
                    compilers: vec![config.java_compiler.clone()],
                    launcher: config.java_launcher.clone(),
                },
            ),
            (
                Language::Python,
                Recipe::Interpreted {
                    interpreter: config.python_interpreter.clone(),
                },
            ),
        ]);

        Self {
            recipes,
            build_dir: config.build_dir.clone(),
            fallback: config.fallback,
            compile_timeout: config.compile_timeout,
        }
    }

    fn recipe_for(&self, source: &Path) -> Result<(Language, &Recipe), PrepareError> {
        let extension = source
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let unsupported = || PrepareError::UnsupportedLanguage {
            extension: format!(".{}", extension),
        };

        let language = Language::from_extension(&extension).ok_or_else(unsupported)?;
        let recipe = self.recipes.get(&language).ok_or_else(unsupported)?;
        Ok((language, recipe))
    }

    async fn compile(
        &self,
        language: Language,
        compilers: &[String],
        source: &Path,
        protocol: Protocol<'_>,
    ) -> Result<BuildArtifact, PrepareError> {
        let mut last_failure = None;

        for name in compilers {
            let Some(compiler) = path::resolve(name) else {
                tracing::debug!("{} compiler {:?} not found on the search path", language, name);
                continue;
            };
            tracing::debug!("Compiling with {}", compiler.display());

            match self.compile_once(&compiler, source, &protocol).await {
                Ok(artifact) => return Ok(artifact),
                Err(e @ PrepareError::CompileError { .. })
                    if self.fallback == CompilerFallback::FirstSuccessful =>
                {
                    tracing::warn!("{}; trying the next candidate", e);
                    last_failure = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_failure.unwrap_or_else(|| PrepareError::ToolchainUnavailable {
            language,
            candidates: compilers.to_vec(),
        }))
    }

    async fn compile_once(
        &self,
        compiler: &Path,
        source: &Path,
        protocol: &Protocol<'_>,
    ) -> Result<BuildArtifact, PrepareError> {
        let workspace = self.workspace().await?;
        let stem = source
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_else(|| OsString::from("solution"));

        let mut cmd = Command::new(compiler);
        let artifact_target = match protocol {
            Protocol::CLike => {
                let mut binary = stem;
                binary.push(std::env::consts::EXE_SUFFIX);
                let output = workspace.path().join(binary);
                cmd.arg(source).arg("-o").arg(&output);
                output
            }
            Protocol::Java { .. } => {
                cmd.arg("-d").arg(workspace.path()).arg(source);
                PathBuf::from(stem)
            }
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let compiler_name = compiler.display().to_string();
        let out = match timeout(self.compile_timeout, cmd.output()).await {
            Ok(out) => out.map_err(|e| PrepareError::Internal {
                msg: format!("failed to execute {}: {}", compiler_name, e),
            })?,
            Err(_) => {
                return Err(PrepareError::CompileTimeout {
                    compiler: compiler_name,
                    timeout_ms: self.compile_timeout.as_millis() as u64,
                });
            }
        };

        if !out.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&out.stderr).into_owned();
            let stdout = String::from_utf8_lossy(&out.stdout);
            if !stdout.trim().is_empty() {
                if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                    diagnostics.push('\n');
                }
                diagnostics.push_str(&stdout);
            }
            return Err(PrepareError::CompileError {
                compiler: compiler_name,
                diagnostics,
            });
        }

        let artifact = match protocol {
            Protocol::CLike => BuildArtifact::compiled(artifact_target, workspace),
            Protocol::Java { launcher } => BuildArtifact {
                executor: Executor::Interpreter {
                    program: launcher.to_path_buf(),
                    args: vec![
                        OsString::from("-cp"),
                        workspace.path().as_os_str().to_os_string(),
                    ],
                },
                target: artifact_target,
                workspace: Some(Arc::new(workspace)),
            },
        };
        Ok(artifact)
    }

    async fn workspace(&self) -> Result<TempDir, PrepareError> {
        let internal = |e: std::io::Error| PrepareError::Internal {
            msg: format!("build directory {}: {}", self.build_dir.display(), e),
        };

        tokio::fs::create_dir_all(&self.build_dir)
            .await
            .map_err(internal)?;
        tempfile::Builder::new()
            .prefix("build_")
            .tempdir_in(&self.build_dir)
            .map_err(internal)
    }
}

#[async_trait::async_trait]
impl Toolchain for NativeToolchain {
    #[tracing::instrument(skip(self))]
    async fn prepare(&self, source: &Path) -> Result<BuildArtifact, PrepareError> {
        let (language, recipe) = self.recipe_for(source)?;

        let source = std::path::absolute(source).map_err(|e| PrepareError::Internal {
            msg: format!("{}: {}", source.display(), e),
        })?;
        if !source.is_file() {
            return Err(PrepareError::Internal {
                msg: format!("source file {} does not exist", source.display()),
            });
        }

        match recipe {
            Recipe::CLike { compilers } => {
                self.compile(language, compilers, &source, Protocol::CLike)
                    .await
            }
            Recipe::Java {
                compilers,
                launcher,
            } => {
                let launcher_path =
                    path::resolve(launcher).ok_or_else(|| PrepareError::ToolchainUnavailable {
                        language,
                        candidates: vec![launcher.clone()],
                    })?;
                self.compile(
                    language,
                    compilers,
                    &source,
                    Protocol::Java {
                        launcher: &launcher_path,
                    },
                )
                .await
            }
            Recipe::Interpreted { interpreter } => {
                let interpreter_path =
                    path::resolve(interpreter).ok_or_else(|| PrepareError::ToolchainUnavailable {
                        language,
                        candidates: vec![interpreter.clone()],
                    })?;
                Ok(BuildArtifact::interpreted(source, interpreter_path))
            }
        }
    }
}
