//! Buffered output sink for result rows.
//!
//! Resume correctness depends on every row the run considers done actually
//! reaching storage, so the sink exposes an explicit `flush` the driver
//! calls after each batch, and a consuming `finish`. A resumed run appends;
//! it never truncates or rewrites prior rows.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// How the output file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fail if the file already exists.
    CreateNew,
    /// Replace any existing file.
    Truncate,
    /// Append to an existing file, creating it if absent.
    Append,
}

/// Buffered writer over the single shared output file.
pub struct OutputSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl OutputSink {
    /// Opens the output file in the given mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::OutputIo` if the file cannot be opened.
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self, AppError> {
        let mut options = OpenOptions::new();
        options.write(true);
        match mode {
            OpenMode::CreateNew => options.create_new(true),
            OpenMode::Truncate => options.create(true).truncate(true),
            OpenMode::Append => options.create(true).append(true),
        };
        let file = options.open(path).map_err(AppError::OutputIo)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one row, appending the line terminator.
    pub fn write_line(&mut self, line: &str) -> Result<(), AppError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(AppError::OutputIo)
    }

    pub fn flush(&mut self) -> Result<(), AppError> {
        self.writer.flush().map_err(AppError::OutputIo)
    }

    /// Flushes and closes the sink.
    pub fn finish(mut self) -> Result<(), AppError> {
        self.flush()
    }
}
