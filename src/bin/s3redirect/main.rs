use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing::{debug, error, trace, warn};

use s3redirect_rs::config::Config;
use s3redirect_rs::{CLIArgs, RedirectPipeline, exit_code_from_error};

pub mod indicator;
mod tracing_init;
pub mod ui_config;

const EXIT_CODE_FATAL: i32 = 1;
const EXIT_CODE_WARNING: i32 = 3;

/// s3redirect - materialize redirect rules as S3 objects.
///
/// This binary is a thin wrapper over the s3redirect-rs library.
#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config_exit_if_err();

    if let Some(shell) = config.auto_complete_shell {
        generate(
            shell,
            &mut CLIArgs::command(),
            "s3redirect",
            &mut std::io::stdout(),
        );

        return Ok(());
    }

    start_tracing_if_necessary(&config);

    trace!("config = {:?}", config);

    let exit_code = run(config).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }

    Ok(())
}

#[cfg_attr(coverage_nightly, coverage(off))]
fn load_config_exit_if_err() -> Config {
    match Config::try_from(CLIArgs::parse()) {
        Ok(config) => config,
        Err(error_message) => {
            clap::Error::raw(clap::error::ErrorKind::ValueValidation, error_message).exit()
        }
    }
}

fn start_tracing_if_necessary(config: &Config) -> bool {
    let Some(ref tracing_config) = config.tracing_config else {
        return false;
    };

    tracing_init::init_tracing(tracing_config);
    true
}

/// The most severe exit code among `errors`: fatal (1) over invalid input
/// (2) over partial failure (3).
fn exit_code_for(errors: &[anyhow::Error]) -> i32 {
    errors
        .iter()
        .map(exit_code_from_error)
        .min()
        .unwrap_or(EXIT_CODE_FATAL)
}

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run(config: Config) -> Result<i32> {
    let start_time = tokio::time::Instant::now();
    debug!("redirect pipeline start.");

    let mut pipeline = RedirectPipeline::new(config.clone()).await?;
    let indicator_join_handle = indicator::show_indicator(
        pipeline.get_stats_receiver(),
        ui_config::is_progress_indicator_needed(&config),
        ui_config::is_show_result_needed(&config),
        config.dry_run,
    );

    pipeline.run().await;
    indicator_join_handle.await?;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

    if let Some(errors) = pipeline.get_errors_and_consume() {
        for err in &errors {
            error!("{:#}", err);
        }
        let exit_code = exit_code_for(&errors);
        if exit_code == EXIT_CODE_WARNING {
            warn!(duration_sec = duration_sec, "s3redirect completed with failures.");
        } else {
            error!(duration_sec = duration_sec, "s3redirect failed.");
        }
        return Ok(exit_code);
    }

    debug!(duration_sec = duration_sec, "s3redirect has been completed.");

    if pipeline.has_warning() {
        return Ok(EXIT_CODE_WARNING);
    }

    Ok(0)
}
