use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::error::StoreError;

pub mod error;

/// A single redirect rule as supplied by the redirect source.
///
/// `location` is the path being redirected away from, `redirect` the
/// destination. `pattern` is only interpreted by the proxy at serve time and is
/// carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRule {
    pub location: String,
    pub redirect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl RedirectRule {
    pub fn new(location: &str, redirect: &str) -> Self {
        Self {
            location: location.to_string(),
            redirect: redirect.to_string(),
            pattern: None,
        }
    }

    pub fn with_pattern(location: &str, redirect: &str, pattern: &str) -> Self {
        Self {
            location: location.to_string(),
            redirect: redirect.to_string(),
            pattern: Some(pattern.to_string()),
        }
    }
}

/// Result of executing one object plan.
///
/// `copied` is true when the metadata-only update path was taken and false
/// when a fresh placeholder object was created. A store-reported failure is
/// kept in `error`; the operation still counts as done.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub sub_path: String,
    pub key: String,
    pub copied: bool,
    pub error: Option<StoreError>,
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Human readable name of the write path taken.
    pub fn operation_name(&self) -> &'static str {
        if self.copied { "update" } else { "create" }
    }
}

/// Statistics sent through the stats channel during pipeline execution.
#[derive(Debug, PartialEq)]
pub enum MaterializeStatistics {
    ObjectCreated { key: String },
    ObjectUpdated { key: String },
    ObjectError { key: String },
    ObjectSkip { key: String },
    Progress { processed: u64, total: u64 },
}

/// S3 storage path specification.
#[derive(Debug, Clone)]
pub enum StoragePath {
    S3 { bucket: String, prefix: String },
}

/// Where the redirect rules are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectSource {
    File(PathBuf),
    Url(String),
}

impl Display for RedirectSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RedirectSource::File(path) => write!(f, "{}", path.display()),
            RedirectSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// AWS configuration file locations.
#[derive(Debug, Clone)]
pub struct ClientConfigLocation {
    pub aws_config_file: Option<PathBuf>,
    pub aws_shared_credentials_file: Option<PathBuf>,
}

/// How the S3 client obtains credentials.
///
/// Credentials are never handled directly; either a named profile is
/// selected or the SDK default provider chain is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3Credentials {
    Profile(String),
    FromEnvironment,
}
