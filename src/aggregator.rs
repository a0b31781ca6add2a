use anyhow::Result;
use async_channel::Sender;
use tracing::{debug, info, warn};

use crate::scheduler::OutcomeStream;
use crate::types::{MaterializeStatistics, OperationOutcome};

/// Counts produced by [`aggregate`].
///
/// `processed == succeeded + errors` and `succeeded == created + updated`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateReport {
    pub processed: u64,
    pub succeeded: u64,
    pub created: u64,
    pub updated: u64,
    pub errors: u64,
}

impl AggregateReport {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Receives progress and per-outcome notifications while the outcome stream
/// is consumed.
pub trait AggregationObserver {
    fn on_progress(&self, processed: u64, total: u64);

    fn on_outcome(&self, outcome: &OperationOutcome);
}

/// Observer that forwards to the statistics channel.
pub struct StatsObserver {
    stats_sender: Sender<MaterializeStatistics>,
}

impl StatsObserver {
    pub fn new(stats_sender: Sender<MaterializeStatistics>) -> Self {
        Self { stats_sender }
    }

    fn send(&self, stats: MaterializeStatistics) {
        // A closed or dropped receiver only means nobody is watching.
        let _ = self.stats_sender.try_send(stats);
    }
}

impl AggregationObserver for StatsObserver {
    fn on_progress(&self, processed: u64, total: u64) {
        self.send(MaterializeStatistics::Progress { processed, total });
    }

    fn on_outcome(&self, outcome: &OperationOutcome) {
        let key = outcome.key.clone();
        let stats = match (outcome.is_success(), outcome.copied) {
            (false, _) => MaterializeStatistics::ObjectError { key },
            (true, true) => MaterializeStatistics::ObjectUpdated { key },
            (true, false) => MaterializeStatistics::ObjectCreated { key },
        };
        self.send(stats);
    }
}

/// Consume `stream` to the end and tally its outcomes.
///
/// Store errors are counted and reported to the observer. After a fatal
/// error no new operations start, but the stream is still drained so the ones
/// already in flight are tallied and observed; the first fatal error is then
/// returned.
pub async fn aggregate<O>(
    mut stream: OutcomeStream<OperationOutcome>,
    total: u64,
    observer: &O,
) -> Result<AggregateReport>
where
    O: AggregationObserver + ?Sized,
{
    let mut report = AggregateReport::default();
    let mut fatal_error: Option<anyhow::Error> = None;

    while let Some(result) = stream.next().await {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if fatal_error.is_none() {
                    warn!("fatal error, draining operations in flight: {:#}", e);
                    fatal_error = Some(e);
                } else {
                    debug!("further fatal error while draining: {:#}", e);
                }
                continue;
            }
        };

        report.processed += 1;
        match (&outcome.error, outcome.copied) {
            (Some(_), _) => report.errors += 1,
            (None, true) => {
                report.succeeded += 1;
                report.updated += 1;
            }
            (None, false) => {
                report.succeeded += 1;
                report.created += 1;
            }
        }

        debug!(
            key = outcome.key,
            operation = outcome.operation_name(),
            success = outcome.is_success(),
            processed = report.processed,
            total,
            "operation completed."
        );

        observer.on_progress(report.processed, total);
        observer.on_outcome(&outcome);
    }

    if let Some(e) = fatal_error {
        info!(
            processed = report.processed,
            errors = report.errors,
            "operations in flight drained after fatal error."
        );
        return Err(e);
    }

    info!(
        processed = report.processed,
        created = report.created,
        updated = report.updated,
        errors = report.errors,
        "all operations reported."
    );

    Ok(report)
}
