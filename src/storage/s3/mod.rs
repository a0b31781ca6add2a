pub mod client_builder;

use anyhow::{Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::MetadataDirective;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use leaky_bucket::RateLimiter;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ClientConfig;
use crate::storage::{Metadata, Storage, StorageTrait};
use crate::types::error::{S3RedirectError, StoreError};
use crate::types::{MaterializeStatistics, StoragePath};

/// Turns an AWS SDK error into the storage error contract.
///
/// Service errors (S3 API responses such as `AccessDenied` or `NoSuchBucket`)
/// become a [`StoreError`] so the caller can record them per operation.
/// Everything else (network, timeout, construction failure) becomes
/// [`S3RedirectError::AwsSdk`], which is fatal for the run.
fn into_storage_error<E>(e: SdkError<E>, context: &'static str) -> anyhow::Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    if let Some(service_err) = e.as_service_error() {
        let store_error = StoreError::new(
            service_err.code().unwrap_or("unknown"),
            service_err.message().unwrap_or("no message"),
        );
        return anyhow!(store_error).context(context);
    }
    anyhow!(S3RedirectError::AwsSdk(DisplayErrorContext(&e).to_string())).context(context)
}

/// Encode each path segment of an object key for the `x-amz-copy-source`
/// header, leaving the separators intact.
fn encode_copy_source(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{encoded_key}")
}

fn to_metadata_map(metadata: &Metadata) -> HashMap<String, String> {
    metadata.iter().cloned().collect()
}

/// Factory for creating S3 storage instances.
pub struct S3StorageFactory;

impl S3StorageFactory {
    pub async fn create(
        path: StoragePath,
        client_config: Option<ClientConfig>,
        stats_sender: Sender<MaterializeStatistics>,
        rate_limit_objects_per_sec: Option<Arc<RateLimiter>>,
        has_warning: Arc<AtomicBool>,
    ) -> Result<Storage> {
        let StoragePath::S3 { bucket, .. } = path;

        let Some(client_config) = client_config else {
            return Err(anyhow!(S3RedirectError::InvalidConfig(
                "S3 client configuration is required.".to_string()
            )));
        };
        let client = Arc::new(client_config.create_client().await);

        Ok(Box::new(S3Storage {
            bucket,
            client,
            stats_sender,
            rate_limit_objects_per_sec,
            has_warning,
        }))
    }
}

/// S3 storage writing redirect objects into a single bucket.
#[derive(Clone)]
struct S3Storage {
    bucket: String,
    client: Arc<Client>,
    stats_sender: Sender<MaterializeStatistics>,
    rate_limit_objects_per_sec: Option<Arc<RateLimiter>>,
    has_warning: Arc<AtomicBool>,
}

#[async_trait]
impl StorageTrait for S3Storage {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<()> {
        self.exec_rate_limit_objects_per_sec().await;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .set_metadata(Some(to_metadata_map(metadata)))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                let error = into_storage_error(e, "aws_sdk_s3::client::put_object() failed.");
                tracing::debug!(
                    bucket = self.bucket,
                    key = key,
                    error = format!("{error:#}"),
                    "S3 PutObject API call failed."
                );
                error
            })?;

        Ok(())
    }

    async fn copy_metadata_only(
        &self,
        key: &str,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<()> {
        self.exec_rate_limit_objects_per_sec().await;

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(key)
            .copy_source(encode_copy_source(&self.bucket, key))
            .metadata_directive(MetadataDirective::Replace)
            .content_type(content_type)
            .set_metadata(Some(to_metadata_map(metadata)))
            .send()
            .await
            .map_err(|e| {
                let error = into_storage_error(e, "aws_sdk_s3::client::copy_object() failed.");
                tracing::debug!(
                    bucket = self.bucket,
                    key = key,
                    error = format!("{error:#}"),
                    "S3 CopyObject API call failed."
                );
                error
            })?;

        Ok(())
    }

    fn get_stats_sender(&self) -> Sender<MaterializeStatistics> {
        self.stats_sender.clone()
    }

    async fn send_stats(&self, stats: MaterializeStatistics) {
        let _ = self.stats_sender.send(stats).await;
    }

    fn set_warning(&self) {
        self.has_warning.store(true, Ordering::SeqCst);
    }
}

impl S3Storage {
    async fn exec_rate_limit_objects_per_sec(&self) {
        if let Some(ref rate_limiter) = self.rate_limit_objects_per_sec {
            rate_limiter.acquire_one().await;
        }
    }
}
