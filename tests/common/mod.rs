//! Shared E2E test infrastructure for s3redirect-rs.
//!
//! Provides `TestHelper` for bucket management, object inspection, and
//! pipeline execution against real AWS S3. All helpers use the
//! `s3redirect-e2e-test` AWS profile.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use s3redirect_rs::config::args::build_config_from_args;
use s3redirect_rs::{Config, RedirectPipeline, RedirectRule, RunReport};
use uuid::Uuid;

/// AWS profile used for all E2E tests.
const AWS_PROFILE: &str = "s3redirect-e2e-test";

/// Location constraint fallback when the profile has no region.
const DEFAULT_REGION: &str = "us-east-1";

/// Result of running a redirect pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    pub report: Option<RunReport>,
    pub has_error: bool,
    pub has_warning: bool,
    pub errors: Vec<String>,
}

/// Content type and user metadata of a stored object.
#[derive(Debug)]
pub struct ObjectHead {
    pub content_type: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// RAII guard that deletes all objects and the bucket when dropped.
pub struct BucketGuard {
    helper: Arc<TestHelper>,
    bucket: String,
}

impl Drop for BucketGuard {
    fn drop(&mut self) {
        let helper = self.helper.clone();
        let bucket = self.bucket.clone();
        // block_on() may panic while the runtime shuts down after a failed test
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tokio::runtime::Handle::current().block_on(async move {
                helper.delete_bucket_cascade(&bucket).await;
            });
        }));
    }
}

pub struct TestHelper {
    client: Client,
    region: String,
}

impl TestHelper {
    pub async fn new() -> Arc<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(AWS_PROFILE)
            .load()
            .await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let client = Client::new(&sdk_config);

        Arc::new(Self { client, region })
    }

    pub fn bucket_guard(self: &Arc<Self>, bucket: &str) -> BucketGuard {
        BucketGuard {
            helper: Arc::clone(self),
            bucket: bucket.to_string(),
        }
    }

    pub fn generate_bucket_name(&self) -> String {
        format!("s3redirect-e2e-{}", Uuid::new_v4())
    }

    pub async fn create_bucket(&self, bucket: &str) {
        let mut builder = self.client.create_bucket().bucket(bucket);

        // us-east-1 must NOT specify a location constraint
        if self.region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(self.region.as_str());
            let config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            builder = builder.create_bucket_configuration(config);
        }

        builder
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to create bucket {bucket}: {e}"));
    }

    pub async fn delete_bucket_cascade(&self, bucket: &str) {
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket);
            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }

            let Ok(resp) = req.send().await else {
                break;
            };

            let objects: Vec<ObjectIdentifier> = resp
                .contents()
                .iter()
                .filter_map(|obj| {
                    obj.key()
                        .map(|k| ObjectIdentifier::builder().key(k).build().unwrap())
                })
                .collect();

            if !objects.is_empty() {
                let delete = Delete::builder()
                    .set_objects(Some(objects))
                    .quiet(true)
                    .build()
                    .unwrap();
                let _ = self
                    .client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await;
            }

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        let _ = self.client.delete_bucket().bucket(bucket).send().await;
    }

    pub async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to put object {key} in {bucket}: {e}"));
    }

    pub async fn get_object_body(&self, bucket: &str, key: &str) -> Vec<u8> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to get object {key} in {bucket}: {e}"));
        output.body.collect().await.unwrap().into_bytes().to_vec()
    }

    pub async fn head_object(&self, bucket: &str, key: &str) -> ObjectHead {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .unwrap_or_else(|e| panic!("Failed to head object {key} in {bucket}: {e}"));

        ObjectHead {
            content_type: output.content_type().map(|s| s.to_string()),
            metadata: output.metadata().cloned().unwrap_or_default(),
        }
    }

    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(ref token) = continuation_token {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.unwrap();

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        keys
    }

    /// Build a Config from CLI-style args, adding the e2e profile unless one
    /// is given.
    pub fn build_config(args: Vec<&str>) -> Config {
        let mut full_args: Vec<String> = vec!["s3redirect".to_string()];
        full_args.extend(args.iter().map(|s| s.to_string()));

        if !full_args.iter().any(|a| a.starts_with("--target-profile")) {
            full_args.push("--target-profile".to_string());
            full_args.push(AWS_PROFILE.to_string());
        }

        build_config_from_args(full_args)
            .unwrap_or_else(|e| panic!("Failed to build config from args: {e}"))
    }

    /// Write `rules` as a redirects file under `dir` and return its path.
    pub fn write_redirects(dir: &Path, rules: &[RedirectRule]) -> String {
        let path = dir.join("redirects.json");
        std::fs::write(&path, serde_json::to_vec(rules).unwrap()).unwrap();
        path.to_string_lossy().to_string()
    }

    /// Run the pipeline with the stats sender closed and collect results.
    pub async fn run_pipeline(config: Config) -> PipelineResult {
        let mut pipeline = RedirectPipeline::new(config)
            .await
            .unwrap_or_else(|e| panic!("Failed to create pipeline: {e}"));

        pipeline.close_stats_sender();
        pipeline.run().await;

        let has_error = pipeline.has_error();
        let has_warning = pipeline.has_warning();
        let errors = pipeline
            .get_errors_and_consume()
            .unwrap_or_default()
            .into_iter()
            .map(|e| format!("{e:?}"))
            .collect();

        PipelineResult {
            report: pipeline.get_report(),
            has_error,
            has_warning,
            errors,
        }
    }
}

/// Default timeout for E2E tests.
pub const E2E_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Wraps an async E2E test body with a timeout.
#[macro_export]
macro_rules! e2e_timeout {
    ($body:expr) => {
        tokio::time::timeout(common::E2E_TIMEOUT, $body)
            .await
            .expect("E2E test timed out")
    };
}
