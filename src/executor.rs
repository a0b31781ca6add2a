//! Execution of a single object plan.
//!
//! Each plan goes through `Start -> Probed -> {Creating | Updating} -> Done`:
//! the existence oracle is probed once, then exactly one remote write is
//! issued. A store-reported failure is kept in the outcome and ends the
//! operation; any other error is returned to the caller.

use anyhow::Result;
use tracing::{debug, warn};

use crate::oracle::Oracle;
use crate::plan::ObjectPlan;
use crate::storage::{Metadata, Storage};
use crate::types::OperationOutcome;
use crate::types::error::as_store_error;

pub const REDIRECT_FAILURE_METADATA_KEY: &str = "redirect-failure";
pub const REDIRECT_FAILURE_NOT_FOUND: &str = "not-found";

/// Body written to freshly created redirect objects.
pub const PLACEHOLDER_BODY: &str = "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Redirect</title></head><body></body></html>\n";

#[derive(Clone)]
pub struct OperationExecutor {
    storage: Storage,
    oracle: Oracle,
    content_type: String,
    dry_run: bool,
}

impl OperationExecutor {
    pub fn new(storage: Storage, oracle: Oracle, content_type: &str, dry_run: bool) -> Self {
        Self {
            storage,
            oracle,
            content_type: content_type.to_string(),
            dry_run,
        }
    }

    /// Run one plan to completion.
    ///
    /// `Ok` is returned for both successful writes and store-reported failures;
    /// check [`OperationOutcome::error`]. `Err` means the run cannot continue.
    pub async fn execute(&self, plan: ObjectPlan) -> Result<OperationOutcome> {
        let exists = self.oracle.exists(&plan.sub_path).await;

        let mut outcome = OperationOutcome {
            sub_path: plan.sub_path,
            key: plan.key,
            copied: exists,
            error: None,
        };

        if self.dry_run {
            debug!(
                key = outcome.key,
                operation = outcome.operation_name(),
                "[dry-run] skipping write."
            );
            return Ok(outcome);
        }

        let result = if exists {
            debug!(key = outcome.key, "replacing metadata of existing object.");
            self.storage
                .copy_metadata_only(&outcome.key, &self.content_type, &plan.metadata)
                .await
        } else {
            debug!(key = outcome.key, "creating placeholder object.");
            self.storage
                .put_object(
                    &outcome.key,
                    PLACEHOLDER_BODY.as_bytes().to_vec(),
                    &self.content_type,
                    &with_not_found_marker(plan.metadata),
                )
                .await
        };

        if let Err(e) = result {
            let Some(store_error) = as_store_error(&e) else {
                return Err(e);
            };
            warn!(
                key = outcome.key,
                operation = outcome.operation_name(),
                s3_error_code = store_error.code,
                s3_error_message = store_error.message,
                "failed to {} redirect object '{}'.",
                outcome.operation_name(),
                outcome.key,
            );
            outcome.error = Some(store_error.clone());
        }

        Ok(outcome)
    }
}

fn with_not_found_marker(mut metadata: Metadata) -> Metadata {
    metadata.push((
        REDIRECT_FAILURE_METADATA_KEY.to_string(),
        REDIRECT_FAILURE_NOT_FOUND.to_string(),
    ));
    metadata
}
