/*!
# Overview
s3redirect-rs turns a list of URL redirect rules into S3 objects that an edge
proxy reads to perform redirects.

Rules are grouped by the location they redirect away from. Each group becomes
one `<location>/index.html` object under the target prefix, carrying the
group's redirects as user metadata (`redirect-location-{i}`,
`redirect-pattern-{i}`). Objects that already exist in the local build output
only get their metadata replaced; missing ones are created as placeholders
marked `redirect-failure: not-found`.

## Features
- **Bounded concurrency**: at most `--worker-size` remote operations in flight
- **Partial failure tolerant**: a failed object never stops the others
- **Streaming results**: outcomes are tallied as they complete
- **Library-First**: the s3redirect CLI is a thin wrapper over this crate

Example usage
=============

```toml
[dependencies]
s3redirect-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use s3redirect_rs::config::args::parse_from_args;
use s3redirect_rs::{Config, RedirectPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = vec![
        "s3redirect",
        "s3://my-bucket/site",
        "--build-root",
        "./public",
        "--redirects",
        "./redirects.json",
    ];

    let parsed_args = parse_from_args(args).unwrap();
    let config = Config::try_from(parsed_args).unwrap();
    let mut pipeline = RedirectPipeline::new(config).await?;
    pipeline.close_stats_sender();
    pipeline.run().await;

    if pipeline.has_error() {
        eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
    }
    Ok(())
}
```
*/

#![allow(clippy::collapsible_if)]

pub mod aggregator;
pub mod config;
pub mod executor;
pub mod grouper;
pub mod oracle;
pub mod pipeline;
pub mod plan;
pub mod scheduler;
pub mod source;
pub mod storage;
pub mod types;

#[cfg(test)]
mod rate_limiting_properties;
#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregator::{AggregateReport, AggregationObserver};
pub use config::Config;
pub use config::args::{CLIArgs, parse_from_args};
pub use oracle::{ExistenceOracle, LocalMirrorOracle};
pub use pipeline::{RedirectPipeline, RunReport};
pub use storage::{Metadata, Storage, StorageTrait};
pub use types::error::{S3RedirectError, StoreError, exit_code_from_error};
pub use types::{MaterializeStatistics, OperationOutcome, RedirectRule, RedirectSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexported_errors_map_to_exit_codes() {
        let store_error = anyhow::anyhow!(StoreError::new("AccessDenied", "Access Denied"));
        assert_eq!(exit_code_from_error(&store_error), 1);
        assert_eq!(
            exit_code_from_error(&anyhow::anyhow!(S3RedirectError::InvalidRedirects(
                "redirects.json: expected value".to_string()
            ))),
            2
        );
    }
}
