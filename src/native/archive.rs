use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::constants::{ARCHIVE_EXTENSION, INPUT_EXTENSION, OUTPUT_EXTENSION};
use crate::core::{
    domain::TestCase,
    traits::archive::{ArchiveError, TestArchive},
};

/// Reads `<dir>/<problem id>.zip` archives holding `<n>.in` / `<n>.out`
/// pairs.
#[derive(Clone, Debug)]
pub struct ZipArchiveReader {
    dir: PathBuf,
}

#[derive(Default)]
struct Pair {
    input: Option<String>,
    output: Option<String>,
}

impl ZipArchiveReader {
    pub fn new<T: AsRef<Path>>(dir: T) -> Self {
        Self {
            dir: dir.as_ref().into(),
        }
    }

    pub fn archive_path(&self, problem_id: u32) -> PathBuf {
        self.dir
            .join(format!("{}.{}", problem_id, ARCHIVE_EXTENSION))
    }
}

#[async_trait::async_trait]
impl TestArchive for ZipArchiveReader {
    #[tracing::instrument(skip(self))]
    async fn extract(&self, problem_id: u32) -> Result<Vec<TestCase>, ArchiveError> {
        let path = self.archive_path(problem_id);
        if !path.is_file() {
            return Err(ArchiveError::Missing { problem_id, path });
        }

        let tests = tokio::task::spawn_blocking(move || read_archive(&path))
            .await
            .map_err(|e| ArchiveError::Unreadable { msg: e.to_string() })??;
        tracing::debug!("Extracted {} test cases", tests.len());
        Ok(tests)
    }
}

fn read_archive(path: &Path) -> Result<Vec<TestCase>, ArchiveError> {
    let unreadable = |e: &dyn std::fmt::Display| ArchiveError::Unreadable {
        msg: format!("{}: {}", path.display(), e),
    };

    let file = File::open(path).map_err(|e| unreadable(&e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| unreadable(&e))?;

    let mut pairs: BTreeMap<usize, Pair> = BTreeMap::new();
    for idx in 0..archive.len() {
        let mut member = archive.by_index(idx).map_err(|e| unreadable(&e))?;
        if member.is_dir() {
            continue;
        }

        let name = member.name().to_string();
        let member_path = Path::new(&name);
        let extension = member_path.extension().and_then(|ext| ext.to_str());
        if extension != Some(INPUT_EXTENSION) && extension != Some(OUTPUT_EXTENSION) {
            continue;
        }
        let ordinal = member_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<usize>().ok())
            .filter(|ordinal| *ordinal > 0)
            .ok_or_else(|| ArchiveError::Malformed {
                reason: format!("{:?} is not named <n>.in or <n>.out", name),
            })?;

        let mut bytes = Vec::new();
        member.read_to_end(&mut bytes).map_err(|e| unreadable(&e))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let pair = pairs.entry(ordinal).or_default();
        let slot = if extension == Some(INPUT_EXTENSION) {
            &mut pair.input
        } else {
            &mut pair.output
        };
        if slot.replace(text).is_some() {
            return Err(ArchiveError::Malformed {
                reason: format!("{:?} appears more than once", name),
            });
        }
    }

    into_test_cases(pairs)
}

/// Checks that ordinals run 1..=N without gaps and that every input has
/// its expected output.
fn into_test_cases(pairs: BTreeMap<usize, Pair>) -> Result<Vec<TestCase>, ArchiveError> {
    if pairs.is_empty() {
        return Err(ArchiveError::Malformed {
            reason: "archive contains no test cases".to_string(),
        });
    }

    let mut tests = Vec::with_capacity(pairs.len());
    for (expected, (ordinal, pair)) in (1..).zip(pairs) {
        if ordinal != expected {
            return Err(ArchiveError::Malformed {
                reason: format!("test case {} is missing", expected),
            });
        }
        match (pair.input, pair.output) {
            (Some(input), Some(expected_output)) => tests.push(TestCase {
                ordinal,
                input,
                expected_output,
            }),
            (None, _) => {
                return Err(ArchiveError::Malformed {
                    reason: format!("{}.{} is missing", ordinal, INPUT_EXTENSION),
                });
            }
            (_, None) => {
                return Err(ArchiveError::Malformed {
                    reason: format!("{}.{} is missing", ordinal, OUTPUT_EXTENSION),
                });
            }
        }
    }
    Ok(tests)
}
