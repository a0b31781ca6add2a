// Live progress display fed by the pipeline's statistics channel.

use std::io;
use std::io::Write;

use async_channel::Receiver;
use indicatif::{HumanCount, HumanDuration, ProgressBar, ProgressStyle};
use s3redirect_rs::types::MaterializeStatistics;
use simple_moving_average::{SMA, SumTreeSMA};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

/// Totals returned by [`show_indicator`] after the stats channel closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndicatorSummary {
    pub created_count: u64,
    pub updated_count: u64,
    pub error_count: u64,
    pub skip_count: u64,
    pub processed: u64,
    pub total: u64,
}

impl IndicatorSummary {
    fn apply(&mut self, stats: MaterializeStatistics) -> u64 {
        match stats {
            MaterializeStatistics::ObjectCreated { .. } => {
                self.created_count += 1;
                1
            }
            MaterializeStatistics::ObjectUpdated { .. } => {
                self.updated_count += 1;
                1
            }
            MaterializeStatistics::ObjectError { .. } => {
                self.error_count += 1;
                0
            }
            MaterializeStatistics::ObjectSkip { .. } => {
                self.skip_count += 1;
                0
            }
            MaterializeStatistics::Progress { processed, total } => {
                self.processed = self.processed.max(processed);
                self.total = total;
                0
            }
        }
    }

    fn written(&self) -> u64 {
        self.created_count + self.updated_count
    }
}

const MOVING_AVERAGE_PERIOD_SECS: usize = 10;

const REFRESH_INTERVAL: f32 = 1.0;

/// Spawn a task that reads statistics until the channel closes, updating a
/// progress line and finally logging a summary.
pub fn show_indicator(
    stats_receiver: Receiver<MaterializeStatistics>,
    show_progress: bool,
    show_result: bool,
    dry_run: bool,
) -> JoinHandle<IndicatorSummary> {
    let progress_text = ProgressBar::new(0);
    if let Ok(progress_style) = ProgressStyle::with_template("{wide_msg}") {
        progress_text.set_style(progress_style);
    }
    let label = if dry_run { "[dry-run] " } else { "" };

    tokio::spawn(async move {
        let start_time = Instant::now();
        let mut ma_written_count = SumTreeSMA::<_, u64, MOVING_AVERAGE_PERIOD_SECS>::new();
        let mut summary = IndicatorSummary::default();

        loop {
            let mut period_count: u64 = 0;

            let period = Instant::now();
            loop {
                while let Ok(stats) = stats_receiver.try_recv() {
                    period_count += summary.apply(stats);
                }

                if REFRESH_INTERVAL < period.elapsed().as_secs_f32() {
                    break;
                }

                if stats_receiver.is_closed() {
                    // drain anything sent between try_recv() and close()
                    while let Ok(stats) = stats_receiver.try_recv() {
                        summary.apply(stats);
                    }

                    let elapsed = start_time.elapsed();
                    let elapsed_secs_f64 = elapsed.as_secs_f64();

                    let mut objects_per_sec = (summary.written() as f64 / elapsed_secs_f64) as u64;
                    if elapsed_secs_f64 < REFRESH_INTERVAL as f64 {
                        objects_per_sec = summary.written();
                    }

                    info!(
                        message = "redirect summary",
                        dry_run,
                        created = summary.created_count,
                        updated = summary.updated_count,
                        objects_per_sec,
                        skipped = summary.skip_count,
                        error = summary.error_count,
                        duration_sec = elapsed_secs_f64,
                    );

                    if show_result {
                        if let Ok(result_style) = ProgressStyle::with_template("{msg}") {
                            progress_text.set_style(result_style);
                        }

                        progress_text.finish_with_message(format!(
                            "{label}created {:>3} objects,  updated {:>3} objects | {:>3} objects/sec,  skipped {} objects,  error {} objects,  duration {}",
                            summary.created_count,
                            summary.updated_count,
                            HumanCount(objects_per_sec),
                            summary.skip_count,
                            summary.error_count,
                            HumanDuration(elapsed),
                        ));

                        println!();
                        let _ = io::stdout().flush();
                    }

                    return summary;
                }

                tokio::time::sleep(std::time::Duration::from_secs_f32(0.05)).await;
            }

            ma_written_count.add_sample(period_count);

            if show_progress {
                progress_text.set_message(format!(
                    "{label}{}/{} processed,  created {:>3},  updated {:>3} | {:>3} objects/sec,  skipped {},  error {}",
                    summary.processed,
                    summary.total,
                    summary.created_count,
                    summary.updated_count,
                    HumanCount(ma_written_count.get_average()),
                    summary.skip_count,
                    summary.error_count,
                ));
            }
        }
    })
}
