//! Redirect materialization pipeline orchestrator.
//!
//! Connects the stages of a run:
//!
//! ```text
//! rules → group → plan (+ collision check) → BoundedScheduler
//!       → OperationExecutor workers (probe + one write each) → aggregate
//! ```
//!
//! Per-operation store errors never stop the run. They are tallied and, when
//! any occurred, recorded as an [`S3RedirectError::PartialFailure`] after all
//! operations have reported. Any other error stops scheduling and is recorded
//! as-is.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_channel::{Receiver, Sender};
use tracing::{error, info, warn};

use crate::aggregator::{AggregateReport, StatsObserver, aggregate};
use crate::config::Config;
use crate::executor::OperationExecutor;
use crate::grouper::group;
use crate::oracle::{LocalMirrorOracle, Oracle};
use crate::plan::{ObjectPlan, find_key_collisions, plan};
use crate::scheduler::BoundedScheduler;
use crate::source::load_redirect_rules;
use crate::storage::{self, Storage};
use crate::types::error::S3RedirectError;
use crate::types::{MaterializeStatistics, RedirectRule, StoragePath};

/// Counts of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub rules: u64,
    pub groups: u64,
    /// Groups not written because an earlier group already claimed their key.
    pub skipped: u64,
    pub operations: AggregateReport,
}

/// The redirect materialization pipeline.
///
/// ## Usage
///
/// ```no_run
/// # async fn example() -> anyhow::Result<()> {
/// # use s3redirect_rs::{Config, RedirectPipeline};
/// # let config: Config = todo!();
/// let mut pipeline = RedirectPipeline::new(config).await?;
/// pipeline.run().await;
/// if pipeline.has_error() {
///     eprintln!("{:?}", pipeline.get_errors_and_consume().unwrap()[0]);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RedirectPipeline {
    config: Config,
    target: Storage,
    oracle: Oracle,
    stats_receiver: Receiver<MaterializeStatistics>,
    has_error: Arc<AtomicBool>,
    has_warning: Arc<AtomicBool>,
    errors: Arc<Mutex<VecDeque<anyhow::Error>>>,
    report: Option<RunReport>,
    ready: bool,
}

impl RedirectPipeline {
    /// Create a pipeline writing to S3 and probing `config.build_root`.
    pub async fn new(config: Config) -> Result<Self> {
        let has_warning = Arc::new(AtomicBool::new(false));
        let (stats_sender, stats_receiver) = async_channel::unbounded();

        let target =
            storage::create_storage(config.clone(), stats_sender, has_warning.clone()).await?;
        let oracle: Oracle = Box::new(LocalMirrorOracle::new(config.build_root.clone()));

        Ok(Self::assemble(
            config,
            target,
            oracle,
            stats_receiver,
            has_warning,
        ))
    }

    /// Create a pipeline over a caller-provided storage and oracle.
    ///
    /// `storage_factory` receives the statistics sender and warning flag the
    /// storage must report to.
    pub fn with_storage<F>(config: Config, storage_factory: F, oracle: Oracle) -> Self
    where
        F: FnOnce(Sender<MaterializeStatistics>, Arc<AtomicBool>) -> Storage,
    {
        let has_warning = Arc::new(AtomicBool::new(false));
        let (stats_sender, stats_receiver) = async_channel::unbounded();
        let target = storage_factory(stats_sender, has_warning.clone());

        Self::assemble(config, target, oracle, stats_receiver, has_warning)
    }

    fn assemble(
        config: Config,
        target: Storage,
        oracle: Oracle,
        stats_receiver: Receiver<MaterializeStatistics>,
        has_warning: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            target,
            oracle,
            stats_receiver,
            has_error: Arc::new(AtomicBool::new(false)),
            has_warning,
            errors: Arc::new(Mutex::new(VecDeque::new())),
            report: None,
            ready: true,
        }
    }

    /// Load the rules from the configured source and materialize them.
    pub async fn run(&mut self) {
        assert!(self.ready, "RedirectPipeline::run() called more than once");
        self.ready = false;

        match load_redirect_rules(&self.config.redirects).await {
            Ok(rules) => self.execute_pipeline(rules).await,
            Err(e) => {
                error!("failed to load redirect rules: {:#}", e);
                self.record_error(e);
            }
        }

        self.shutdown();
    }

    /// Materialize already loaded rules.
    pub async fn run_with_rules(&mut self, rules: Vec<RedirectRule>) {
        assert!(self.ready, "RedirectPipeline::run() called more than once");
        self.ready = false;

        self.execute_pipeline(rules).await;

        self.shutdown();
    }

    /// Check if any error occurred, including partial failure.
    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    /// Check if any warning occurred during the pipeline execution.
    pub fn has_warning(&self) -> bool {
        self.has_warning.load(Ordering::SeqCst)
    }

    /// Consume and return all accumulated errors.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_errors_and_consume(&self) -> Option<Vec<anyhow::Error>> {
        if !self.has_error() {
            return None;
        }
        let mut error_list = self.errors.lock().unwrap();
        let mut errors = Vec::with_capacity(error_list.len());
        while let Some(e) = error_list.pop_front() {
            errors.push(e);
        }
        Some(errors)
    }

    /// Get error messages without consuming them.
    ///
    /// Returns `None` if no errors occurred.
    pub fn get_error_messages(&self) -> Option<Vec<String>> {
        if !self.has_error() {
            return None;
        }
        let error_list = self.errors.lock().unwrap();
        Some(error_list.iter().map(|e| e.to_string()).collect())
    }

    /// Get the stats receiver for progress reporting.
    pub fn get_stats_receiver(&self) -> Receiver<MaterializeStatistics> {
        self.stats_receiver.clone()
    }

    /// Counts of the finished run.
    ///
    /// `None` before the run and when it stopped on a fatal error.
    pub fn get_report(&self) -> Option<RunReport> {
        self.report
    }

    /// Close the stats sender to signal the progress reporter to finish.
    pub fn close_stats_sender(&self) {
        self.target.get_stats_sender().close();
    }

    async fn execute_pipeline(&mut self, rules: Vec<RedirectRule>) {
        let groups = group(rules);
        let rule_count = groups.rule_count() as u64;
        let group_count = groups.len() as u64;

        let StoragePath::S3 { ref prefix, .. } = self.config.target;
        let plans: Vec<ObjectPlan> = groups
            .iter()
            .map(|(location, rules)| plan(prefix, location, rules))
            .collect();

        let plans = self.drop_colliding_plans(plans).await;
        let skipped = group_count - plans.len() as u64;
        let total = plans.len() as u64;

        info!(
            rules = rule_count,
            groups = group_count,
            skipped,
            worker_size = self.config.worker_size,
            dry_run = self.config.dry_run,
            "materializing redirect objects."
        );

        let executor = Arc::new(OperationExecutor::new(
            dyn_clone::clone_box(&*self.target),
            dyn_clone::clone_box(&*self.oracle),
            &self.config.content_type,
            self.config.dry_run,
        ));
        let operations = plans.into_iter().map(move |object_plan| {
            let executor = executor.clone();
            async move { executor.execute(object_plan).await }
        });

        let scheduler = BoundedScheduler::new(self.config.worker_size as usize);
        let observer = StatsObserver::new(self.target.get_stats_sender());

        match aggregate(scheduler.run(operations), total, &observer).await {
            Ok(operations) => {
                info!(
                    rules = rule_count,
                    groups = group_count,
                    attempted = operations.processed,
                    created = operations.created,
                    updated = operations.updated,
                    failed = operations.errors,
                    skipped,
                    "{}redirect objects materialized.",
                    if self.config.dry_run { "[dry-run] " } else { "" }
                );

                self.report = Some(RunReport {
                    rules: rule_count,
                    groups: group_count,
                    skipped,
                    operations,
                });

                if operations.has_errors() {
                    self.record_error(anyhow::Error::new(S3RedirectError::PartialFailure {
                        succeeded: operations.succeeded,
                        failed: operations.errors,
                    }));
                }
            }
            Err(e) => {
                error!("pipeline stopped: {:#}", e);
                self.record_error(e);
            }
        }

        if self.config.warn_as_error && self.has_warning.load(Ordering::SeqCst) {
            self.record_error(anyhow::anyhow!(
                "warnings promoted to errors (--warn-as-error)"
            ));
        }
    }

    /// Keep the first plan for each key; later plans for the same key are
    /// skipped with a warning.
    async fn drop_colliding_plans(&self, mut plans: Vec<ObjectPlan>) -> Vec<ObjectPlan> {
        let collisions = find_key_collisions(&plans);
        if collisions.is_empty() {
            return plans;
        }

        for collision in &collisions {
            warn!(
                key = collision.key,
                kept_location = collision.kept_location,
                dropped_location = collision.dropped_location,
                "distinct locations map to the same object key, skipping '{}'.",
                collision.dropped_location,
            );
            self.target
                .send_stats(MaterializeStatistics::ObjectSkip {
                    key: collision.key.clone(),
                })
                .await;
        }
        self.target.set_warning();

        let mut claimed = HashSet::new();
        plans.retain(|object_plan| claimed.insert(object_plan.key.clone()));
        plans
    }

    fn record_error(&self, error: anyhow::Error) {
        self.has_error.store(true, Ordering::SeqCst);
        self.errors.lock().unwrap().push_back(error);
    }

    fn shutdown(&self) {
        self.close_stats_sender();
    }
}
