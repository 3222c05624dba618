//! Output row formatting and the shared output sink.

pub mod formatter;
pub mod layout;
pub mod writer;

pub use formatter::RowFormatter;
pub use writer::{OpenMode, OutputSink};
