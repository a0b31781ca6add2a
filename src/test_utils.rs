//! Shared test utilities for the s3redirect library crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_channel::Sender;
use async_trait::async_trait;

use crate::config::Config;
use crate::oracle::ExistenceOracle;
use crate::storage::{Metadata, StorageTrait};
use crate::types::error::StoreError;
use crate::types::{MaterializeStatistics, StoragePath};

/// Initialise a dummy tracing subscriber for tests.
///
/// Uses `try_init` so that only the first call in a process actually
/// installs the subscriber; subsequent calls are silently ignored.
pub(crate) fn init_dummy_tracing_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("dummy=trace")
        .try_init();
}

/// Create a default [`Config`] suitable for most unit tests.
///
/// Key defaults: `worker_size=4`, bucket=`"test-bucket"`, prefix=`"www"`.
pub(crate) fn make_test_config() -> Config {
    Config {
        target: StoragePath::S3 {
            bucket: "test-bucket".to_string(),
            prefix: "www".to_string(),
        },
        worker_size: 4,
        ..Config::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub(crate) enum FailureKind {
    Store(StoreError),
    Fatal,
}

#[derive(Default)]
struct MockState {
    objects: Mutex<HashMap<String, StoredObject>>,
    failures: Mutex<HashMap<String, FailureKind>>,
    delays: Mutex<HashMap<String, Duration>>,
    put_count: AtomicUsize,
    copy_count: AtomicUsize,
}

/// In-memory object store with per-key failure injection.
#[derive(Clone)]
pub(crate) struct MockStorage {
    state: Arc<MockState>,
    stats_sender: Sender<MaterializeStatistics>,
    has_warning: Arc<AtomicBool>,
}

impl MockStorage {
    pub fn new() -> Self {
        let (stats_sender, _) = async_channel::unbounded();
        Self::with_stats_sender(stats_sender)
    }

    pub fn with_stats_sender(stats_sender: Sender<MaterializeStatistics>) -> Self {
        Self {
            state: Arc::new(MockState::default()),
            stats_sender,
            has_warning: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle on the same objects that reports to another stats channel and
    /// warning flag.
    pub fn attach(
        &self,
        stats_sender: Sender<MaterializeStatistics>,
        has_warning: Arc<AtomicBool>,
    ) -> Self {
        Self {
            state: self.state.clone(),
            stats_sender,
            has_warning,
        }
    }

    pub fn insert(&self, key: &str, object: StoredObject) {
        self.state
            .objects
            .lock()
            .unwrap()
            .insert(key.to_string(), object);
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.state.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> HashSet<String> {
        self.state.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn fail_key(&self, key: &str, failure: FailureKind) {
        self.state
            .failures
            .lock()
            .unwrap()
            .insert(key.to_string(), failure);
    }

    /// Make every write to `key` take `delay` before it lands or fails.
    pub fn delay_key(&self, key: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(key.to_string(), delay);
    }

    pub fn put_count(&self) -> usize {
        self.state.put_count.load(Ordering::SeqCst)
    }

    pub fn copy_count(&self) -> usize {
        self.state.copy_count.load(Ordering::SeqCst)
    }

    async fn injected_delay(&self, key: &str) {
        let delay = self.state.delays.lock().unwrap().get(key).copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn injected_failure(&self, key: &str) -> Result<()> {
        match self.state.failures.lock().unwrap().get(key) {
            Some(FailureKind::Store(store_error)) => Err(anyhow!(store_error.clone())),
            Some(FailureKind::Fatal) => Err(anyhow!("connection reset by peer")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageTrait for MockStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<()> {
        self.state.put_count.fetch_add(1, Ordering::SeqCst);
        self.injected_delay(key).await;
        self.injected_failure(key)?;

        self.insert(
            key,
            StoredObject {
                body,
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn copy_metadata_only(
        &self,
        key: &str,
        content_type: &str,
        metadata: &Metadata,
    ) -> Result<()> {
        self.state.copy_count.fetch_add(1, Ordering::SeqCst);
        self.injected_delay(key).await;
        self.injected_failure(key)?;

        let mut objects = self.state.objects.lock().unwrap();
        let Some(object) = objects.get_mut(key) else {
            return Err(anyhow!(StoreError::new(
                "NoSuchKey",
                "The specified key does not exist."
            )));
        };
        object.content_type = content_type.to_string();
        object.metadata = metadata.clone();
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

/// Oracle answering from a fixed set of sub paths.
#[derive(Clone)]
pub(crate) struct StaticOracle {
    existing: Option<HashSet<String>>,
}

impl StaticOracle {
    /// Nothing exists.
    pub fn none() -> Self {
        Self {
            existing: Some(HashSet::new()),
        }
    }

    /// Everything exists.
    pub fn all() -> Self {
        Self { existing: None }
    }

    pub fn with(sub_paths: &[&str]) -> Self {
        Self {
            existing: Some(sub_paths.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[async_trait]
impl ExistenceOracle for StaticOracle {
    async fn exists(&self, sub_path: &str) -> bool {
        match self.existing {
            Some(ref existing) => existing.contains(sub_path),
            None => true,
        }
    }
}
