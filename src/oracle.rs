use std::path::PathBuf;

use async_trait::async_trait;
use dyn_clone::DynClone;

/// Answers whether an object already exists at a key, without asking the
/// remote store.
#[async_trait]
pub trait ExistenceOracle: DynClone {
    async fn exists(&self, sub_path: &str) -> bool;
}

dyn_clone::clone_trait_object!(ExistenceOracle);

pub type Oracle = Box<dyn ExistenceOracle + Send + Sync>;

/// Probes the local build output that mirrors the remote prefix.
///
/// The mirror is trusted to match the remote state: a file that exists locally
/// but was never uploaded leads to a metadata update of a missing object,
/// which the store reports as an error for that operation.
#[derive(Debug, Clone)]
pub struct LocalMirrorOracle {
    build_root: PathBuf,
}

impl LocalMirrorOracle {
    pub fn new(build_root: impl Into<PathBuf>) -> Self {
        Self {
            build_root: build_root.into(),
        }
    }
}

#[async_trait]
impl ExistenceOracle for LocalMirrorOracle {
    async fn exists(&self, sub_path: &str) -> bool {
        let path = self.build_root.join(sub_path);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "build mirror probe miss.");
                false
            }
        }
    }
}
