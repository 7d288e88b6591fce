//! # ffweave-progress
//!
//! Turns the text ffmpeg writes with `-progress <url>` into structured
//! update events.
//!
//! - [`ProgressParser`] consumes chunks or lines and emits one
//!   [`ProgressUpdate`] per completed record, to callbacks and channels.
//! - [`reader::consume`] pumps any `tokio` reader into a parser.
//! - Non-record lines are buffered as [`LogEntry`]s, tagged with the media
//!   time of the last completed record.

pub mod parser;
pub mod reader;
pub mod value;

pub use parser::{LogEntry, ProgressParser, ProgressUpdate, PROGRESS_KEY};
pub use reader::consume;
pub use value::{ProgressRecord, ProgressValue};

pub use ffweave_core::{Error, Result};
