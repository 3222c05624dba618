//! The streaming scoring pipeline.
//!
//! Reads the input line by line, accumulates records into per-shape batches,
//! submits each full batch to the oracle, and writes one merged output row
//! per record in batch order. A failed batch degrades to blank result
//! columns; it never aborts the run. The output file is flushed after every
//! batch so a resumed run can trust what it replays.

use std::fs::File;
use std::io::{BufRead, BufReader};

use tracing::{info, warn};

use crate::api::{dispatch_batch, NameOracle};
use crate::batch::{BatchSet, BATCH_SIZE};
use crate::config::RunConfig;
use crate::error::AppError;
use crate::output::writer::OpenMode;
use crate::output::{OutputSink, RowFormatter};
use crate::record::LineParser;
use crate::resume::ResumeLedger;

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows_written: u64,
    pub lines_skipped: u64,
    pub records_resumed: u64,
    pub batches_dispatched: u64,
    pub batches_failed: u64,
}

/// Row-count milestones for progress logging: every 100 rows below 1k,
/// every 1k below 10k, every 10k below 100k, every 100k beyond.
fn is_progress_milestone(n: u64) -> bool {
    n != 0
        && ((n < 1_000 && n % 100 == 0)
            || (n < 10_000 && n % 1_000 == 0)
            || (n < 100_000 && n % 10_000 == 0)
            || n % 100_000 == 0)
}

/// One run of the pipeline. Holds the per-run state the batch flusher and
/// the line loop share.
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    oracle: &'a dyn NameOracle,
    formatter: RowFormatter,
    ledger: ResumeLedger,
    summary: RunSummary,
    row_id: u64,
}

impl<'a> Pipeline<'a> {
    /// Runs one scoring pass end to end.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, an unreachable oracle at startup,
    /// input or output I/O errors, and malformed lines unless
    /// `skip_errors` is set. Batch submission errors are not fatal.
    pub async fn run(
        config: &'a RunConfig,
        oracle: &'a dyn NameOracle,
    ) -> Result<RunSummary, AppError> {
        config.validate()?;

        // The version tag goes into every row, and an oracle that cannot
        // even report its version will not score anything either.
        let version = oracle.software_version().await?;
        info!("Remote scoring engine: {}", version);

        let output_path = config.output_path();
        let ledger = if config.resume && output_path.exists() {
            ResumeLedger::load(&output_path, config.separator, config.output_columns())?
        } else {
            ResumeLedger::new()
        };
        // Checked before the sink is opened: opening in append mode creates
        // the file, which would make every resumed run look non-empty.
        let resume_target_has_content = config.resume
            && std::fs::metadata(&output_path)
                .map(|m| m.len() > 0)
                .unwrap_or(false);

        let mode = if config.resume {
            OpenMode::Append
        } else if config.overwrite {
            OpenMode::Truncate
        } else {
            OpenMode::CreateNew
        };
        let mut sink = OutputSink::open(&output_path, mode)?;
        info!(
            "Scoring {} with service '{}' into {}",
            config.input_file.display(),
            config.service,
            output_path.display()
        );

        let mut pipeline = Pipeline {
            config,
            oracle,
            formatter: RowFormatter::new(config.separator, config.digest, version),
            // Appended rows continue the numbering of the replayed ones.
            row_id: ledger.len() as u64,
            ledger,
            summary: RunSummary::default(),
        };

        if config.header && !resume_target_has_content {
            let header = pipeline
                .formatter
                .header_line(config.input_format, config.service);
            sink.write_line(&header)?;
            sink.flush()?;
        }

        pipeline.stream(&mut sink).await?;
        sink.finish()?;

        let summary = pipeline.summary;
        info!(
            "Run complete: {} rows written, {} resumed, {} lines skipped, {} batches ({} failed)",
            summary.rows_written,
            summary.records_resumed,
            summary.lines_skipped,
            summary.batches_dispatched + summary.batches_failed,
            summary.batches_failed
        );
        Ok(summary)
    }

    async fn stream(&mut self, sink: &mut OutputSink) -> Result<(), AppError> {
        let file = File::open(&self.config.input_file).map_err(AppError::InputIo)?;
        let reader = BufReader::new(file);

        let mut parser = LineParser::new(
            self.config.input_format,
            self.config.separator,
            self.config.with_uid,
            self.config.default_country.clone(),
        );
        let mut batches = BatchSet::new(BATCH_SIZE);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(AppError::InputIo)?;
            let record = match parser.parse_line(&line, line_no as u64) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) if self.config.skip_errors => {
                    warn!("Skipping line {}: {}", line_no, err);
                    self.summary.lines_skipped += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };

            if self.config.resume && self.ledger.is_done(record.id()) {
                self.summary.records_resumed += 1;
                continue;
            }

            if batches.push(record) >= BATCH_SIZE {
                self.flush_ready(&mut batches, false, sink).await?;
            }
        }

        self.flush_ready(&mut batches, true, sink).await
    }

    /// Dispatches every due batch and writes its rows. Oracle errors turn
    /// into blank result columns for the whole batch.
    async fn flush_ready(
        &mut self,
        batches: &mut BatchSet,
        at_end: bool,
        sink: &mut OutputSink,
    ) -> Result<(), AppError> {
        for (shape, records) in batches.take_ready(at_end) {
            let results =
                match dispatch_batch(self.oracle, self.config.service, shape, &records).await {
                    Ok(results) => {
                        self.summary.batches_dispatched += 1;
                        results
                    }
                    Err(err) => {
                        warn!(
                            "Batch of {} {} records failed, writing blank columns: {}",
                            records.len(),
                            shape,
                            err
                        );
                        self.summary.batches_failed += 1;
                        Default::default()
                    }
                };

            for record in records.values() {
                let row = self.formatter.render_row(
                    record,
                    results.get(record.id()),
                    self.config.service,
                    self.row_id,
                );
                sink.write_line(&row)?;
                self.row_id += 1;
                self.summary.rows_written += 1;
                if self.config.resume {
                    self.ledger.mark_done(record.id());
                }
                if is_progress_milestone(self.summary.rows_written) {
                    info!("Processed {} rows", self.summary.rows_written);
                }
            }
            sink.flush()?;
        }
        Ok(())
    }
}
