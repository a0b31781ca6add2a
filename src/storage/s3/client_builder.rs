use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::stalled_stream_protection::StalledStreamProtectionConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;

use crate::config::{CLITimeoutConfig, ClientConfig};
use crate::types::{ClientConfigLocation, S3Credentials};

impl ClientConfig {
    /// Build an S3 client from this configuration.
    ///
    /// Credentials are resolved by the SDK provider chain, optionally pinned to
    /// a named profile. SDK-level retries keep their defaults.
    pub async fn create_client(&self) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile_files) = build_profile_files(&self.client_config_location) {
            loader = loader.profile_files(profile_files);
        }
        if let S3Credentials::Profile(ref profile_name) = self.credential {
            loader = loader.profile_name(profile_name);
        }
        if let Some(ref region) = self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(ref endpoint_url) = self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader = loader.timeout_config(build_timeout_config(&self.cli_timeout_config));

        if self.disable_stalled_stream_protection {
            loader = loader.stalled_stream_protection(StalledStreamProtectionConfig::disabled());
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(self.force_path_style)
            .accelerate(self.accelerate)
            .request_checksum_calculation(self.request_checksum_calculation.clone())
            .build();

        Client::from_conf(s3_config)
    }
}

fn build_profile_files(location: &ClientConfigLocation) -> Option<ProfileFiles> {
    if location.aws_config_file.is_none() && location.aws_shared_credentials_file.is_none() {
        return None;
    }

    let mut builder = ProfileFiles::builder();
    builder = match location.aws_config_file {
        Some(ref path) => builder.with_file(ProfileFileKind::Config, path),
        None => builder.include_default_config_file(true),
    };
    builder = match location.aws_shared_credentials_file {
        Some(ref path) => builder.with_file(ProfileFileKind::Credentials, path),
        None => builder.include_default_credentials_file(true),
    };

    Some(builder.build())
}

fn build_timeout_config(cli_timeout_config: &CLITimeoutConfig) -> TimeoutConfig {
    let mut builder = TimeoutConfig::builder();

    if let Some(ms) = cli_timeout_config.operation_timeout_milliseconds {
        builder = builder.operation_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli_timeout_config.operation_attempt_timeout_milliseconds {
        builder = builder.operation_attempt_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli_timeout_config.connect_timeout_milliseconds {
        builder = builder.connect_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli_timeout_config.read_timeout_milliseconds {
        builder = builder.read_timeout(Duration::from_millis(ms));
    }

    builder.build()
}
