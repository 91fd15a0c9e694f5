use std::panic;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, JudgeConfig};
use crate::core::pipeline::judging::JudgeService;
use crate::core::report::Report;
use crate::manifest::Manifest;
use crate::native::archive::ZipArchiveReader;
use crate::native::sandbox::NativeSandbox;
use crate::native::toolchain::NativeToolchain;

mod config;
mod constants;
mod core;
mod manifest;
mod native;


#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let source = cli.source;

    let config = JudgeConfig::from_args(cli.options)?;
    let manifest = Manifest::load(&config.manifest_path())?;
    let entry = manifest.find(&cli.problem)?;
    let problem = entry.problem_record()?;

    let service = JudgeService::new(
        Arc::new(NativeToolchain::new(&config.toolchain)),
        Arc::new(NativeSandbox::new(&config.sandbox)),
        Arc::new(ZipArchiveReader::new(config.archive_dir())),
        config.sandbox.output_limit_bytes,
    );

    tracing::info!(
        "Judging {} against #{}: {}",
        source.display(),
        entry.problem_number,
        entry.title
    );
    match service.judge(&source, &problem).await {
        Ok(result) => {
            print!("{}", Report::new(&entry.title, &result));
            if result.headline().is_accepted() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Err(err) => {
            tracing::error!("Judge run failed: {}", err);
            println!("#{}: {}", entry.problem_number, entry.title);
            println!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
