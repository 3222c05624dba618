//! Resume ledger: the set of already-completed ids, recovered by replaying
//! a prior output file.
//!
//! The output file is the only persistence the tool has, so resume
//! correctness rests entirely on what reached disk. Every data row's first
//! column is a completed id. Header and comment lines (leading `#`) are
//! skipped. The expected column count comes from the configured layout, not
//! from the file, so a torn row from a mid-write crash can never define the
//! width: any row that disagrees is reported and treated as NOT done, and
//! the record is re-submitted rather than silently dropped.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

/// Ids that are permanently complete for the remainder of the run.
#[derive(Debug, Default)]
pub struct ResumeLedger {
    done: HashSet<String>,
}

impl ResumeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays an existing output file into a ledger. `expected_columns` is
    /// the column count of a complete data row under the run's layout.
    ///
    /// # Errors
    ///
    /// Returns `AppError::OutputIo` if the file cannot be read; malformed
    /// rows are warnings, never errors.
    pub fn load(
        path: &Path,
        separator: char,
        expected_columns: usize,
    ) -> Result<Self, crate::error::AppError> {
        let file = File::open(path).map_err(crate::error::AppError::OutputIo)?;
        let reader = BufReader::new(file);

        let mut done = HashSet::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(crate::error::AppError::OutputIo)?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(separator).collect();
            if fields.len() != expected_columns {
                warn!(
                    "Resume ledger line {}: {} columns, expected {}; treating as not done",
                    line_no,
                    fields.len(),
                    expected_columns
                );
                continue;
            }
            done.insert(fields[0].to_string());

            if line_no > 0 && line_no % 100_000 == 0 {
                info!("Replaying {}: {} lines", path.display(), line_no);
            }
        }

        info!(
            "Recovered {} completed ids from {}",
            done.len(),
            path.display()
        );
        Ok(Self { done })
    }

    pub fn is_done(&self, id: &str) -> bool {
        self.done.contains(id)
    }

    pub fn mark_done(&mut self, id: impl Into<String>) {
        self.done.insert(id.into());
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}
