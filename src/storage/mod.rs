use anyhow::Result;
use async_channel::Sender;
use async_trait::async_trait;
use dyn_clone::DynClone;
use leaky_bucket::RateLimiter;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Config;
use crate::types::MaterializeStatistics;

pub mod s3;

/// Type alias for a boxed Storage trait object.
pub type Storage = Box<dyn StorageTrait + Send + Sync>;

/// Ordered user metadata attached to a redirect object.
pub type Metadata = Vec<(String, String)>;

/// Remote object store operations needed to materialize redirect objects.
///
/// Keys passed to these methods are full object keys (prefix included).
///
/// Error contract: a failure reported by the service itself is returned as an
/// `anyhow::Error` wrapping [`StoreError`](crate::types::error::StoreError),
/// which callers record per operation. Any other error (transport, timeout,
/// request construction) is fatal for the run.
#[async_trait]
pub trait StorageTrait: DynClone {
    /// Create or overwrite an object with the given body, content type and
    /// user metadata.
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<()>;

    /// Replace the content type and user metadata of an existing object
    /// without touching its body. The resulting metadata is exactly
    /// `metadata`; previous entries are dropped.
    async fn copy_metadata_only(
        &self,
        key: &str,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<()>;

    /// Get the statistics sender channel.
    fn get_stats_sender(&self) -> Sender<MaterializeStatistics>;

    /// Send a statistics event through the channel.
    async fn send_stats(&self, stats: MaterializeStatistics);

    /// Set the warning flag to indicate a warning occurred.
    fn set_warning(&self);
}

dyn_clone::clone_trait_object!(StorageTrait);

// Default refill interval 100ms
const REFILL_PER_INTERVAL_DIVIDER: usize = 10;

pub(crate) fn build_rate_limiter(rate_limit_value: u32) -> Arc<RateLimiter> {
    let refill = if (rate_limit_value as usize) <= REFILL_PER_INTERVAL_DIVIDER {
        1
    } else {
        rate_limit_value as usize / REFILL_PER_INTERVAL_DIVIDER
    };
    Arc::new(
        RateLimiter::builder()
            .max(rate_limit_value as usize)
            .initial(rate_limit_value as usize)
            .refill(refill)
            .fair(true)
            .build(),
    )
}

/// Create the S3 storage for the configured target.
pub async fn create_storage(
    config: Config,
    stats_sender: Sender<MaterializeStatistics>,
    has_warning: Arc<AtomicBool>,
) -> Result<Storage> {
    let rate_limit_objects_per_sec = config.rate_limit_objects.map(build_rate_limiter);

    s3::S3StorageFactory::create(
        config.target.clone(),
        config.target_client_config.clone(),
        stats_sender,
        rate_limit_objects_per_sec,
        has_warning,
    )
    .await
}
