pub mod args;

use std::path::PathBuf;

use aws_smithy_types::checksum_config::RequestChecksumCalculation;

use crate::types::{ClientConfigLocation, RedirectSource, S3Credentials, StoragePath};

pub const DEFAULT_WORKER_SIZE: u16 = 16;
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Main configuration for the s3redirect-rs materialization pipeline.
///
/// Holds everything needed to run a [`RedirectPipeline`](crate::RedirectPipeline):
/// the target bucket/prefix, the local build mirror, where the redirect rules
/// come from, the concurrency limit and the AWS client settings.
///
/// # Quick Start
///
/// ```
/// use s3redirect_rs::Config;
///
/// let config = Config::for_target("my-site-bucket", "www");
/// assert_eq!(config.worker_size, 16);
/// assert_eq!(config.content_type, "text/html");
/// ```
///
/// Then customize fields as needed:
///
/// ```
/// use s3redirect_rs::Config;
/// use s3redirect_rs::types::RedirectSource;
///
/// let mut config = Config::for_target("my-site-bucket", "www");
/// config.build_root = "public".into();
/// config.redirects = RedirectSource::File("redirects.json".into());
/// config.worker_size = 32;
/// config.dry_run = true;
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub target: StoragePath,
    pub build_root: PathBuf,
    pub redirects: RedirectSource,
    pub show_no_progress: bool,
    pub target_client_config: Option<ClientConfig>,
    pub tracing_config: Option<TracingConfig>,
    pub worker_size: u16,
    pub warn_as_error: bool,
    pub dry_run: bool,
    pub rate_limit_objects: Option<u32>,
    pub content_type: String,
    pub auto_complete_shell: Option<clap_complete::shells::Shell>,
}

impl Config {
    /// Create a `Config` with defaults for the given S3 bucket and prefix.
    ///
    /// The build root defaults to the current directory and the redirect
    /// source to `redirects.json` in it.
    ///
    /// ```
    /// use s3redirect_rs::Config;
    /// use s3redirect_rs::types::StoragePath;
    ///
    /// let config = Config::for_target("bucket", "prefix");
    /// let StoragePath::S3 { bucket, prefix } = &config.target;
    /// assert_eq!(bucket, "bucket");
    /// assert_eq!(prefix, "prefix");
    /// ```
    pub fn for_target(bucket: &str, prefix: &str) -> Self {
        Config {
            target: StoragePath::S3 {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
            },
            ..Config::default()
        }
    }
}

impl Default for Config {
    /// The `target` defaults to an empty bucket/prefix. Set it before running a
    /// pipeline.
    fn default() -> Self {
        Config {
            target: StoragePath::S3 {
                bucket: String::new(),
                prefix: String::new(),
            },
            build_root: PathBuf::from("."),
            redirects: RedirectSource::File(PathBuf::from("redirects.json")),
            show_no_progress: false,
            target_client_config: None,
            tracing_config: None,
            worker_size: DEFAULT_WORKER_SIZE,
            warn_as_error: false,
            dry_run: false,
            rate_limit_objects: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            auto_complete_shell: None,
        }
    }
}

/// AWS S3 client configuration.
///
/// Credentials are resolved by the SDK: either a named profile or the default
/// provider chain.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_config_location: ClientConfigLocation,
    pub credential: S3Credentials,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub accelerate: bool,
    pub cli_timeout_config: CLITimeoutConfig,
    pub disable_stalled_stream_protection: bool,
    pub request_checksum_calculation: RequestChecksumCalculation,
}

/// Timeout configuration for AWS SDK operations.
#[derive(Debug, Clone, Default)]
pub struct CLITimeoutConfig {
    pub operation_timeout_milliseconds: Option<u64>,
    pub operation_attempt_timeout_milliseconds: Option<u64>,
    pub connect_timeout_milliseconds: Option<u64>,
    pub read_timeout_milliseconds: Option<u64>,
}

/// Tracing (logging) configuration.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub tracing_level: log::Level,
    pub json_tracing: bool,
    pub aws_sdk_tracing: bool,
    pub span_events_tracing: bool,
    pub disable_color_tracing: bool,
}
