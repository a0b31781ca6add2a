use s3redirect_rs::config::Config;

/// Whether to show the live-updating progress indicator.
///
/// Hidden in quiet mode, above Warn verbosity, and with JSON logging.
pub fn is_progress_indicator_needed(config: &Config) -> bool {
    if config.show_no_progress {
        return false;
    }

    let Some(ref tracing_config) = config.tracing_config else {
        return true;
    };

    if log::Level::Warn < tracing_config.tracing_level {
        return false;
    }

    !tracing_config.json_tracing
}

/// Whether to show the final result summary line.
pub fn is_show_result_needed(config: &Config) -> bool {
    if config.show_no_progress {
        return false;
    }

    match config.tracing_config {
        Some(ref tracing_config) => !tracing_config.json_tracing,
        None => true,
    }
}
