use std::time::Duration;

pub const OUTPUT_LIMIT_BYTES: u64 = 500 * 1024 * 1024;
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
pub const GRACE_PERIOD: Duration = Duration::from_millis(10);
pub const COMPILE_TIMEOUT: Duration = Duration::from_secs(30);

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub const ARCHIVE_EXTENSION: &str = "zip";
pub const INPUT_EXTENSION: &str = "in";
pub const OUTPUT_EXTENSION: &str = "out";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const ARCHIVE_DIR: &str = "io";
