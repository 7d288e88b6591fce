//! ffweave - build exact ffmpeg command lines and follow ffmpeg progress
//!
//! This library crate re-exports the workspace crates under one name and is
//! what the `ffweave` binary and the integration tests build on.

pub use ffweave_graph as graph;
pub use ffweave_progress as progress;

pub use ffweave_core::config;
pub use ffweave_core::{Config, Error, FfmpegConfig, ProgressConfig, Result};

pub use ffweave_graph::{
    quote, Arg, CommandOption, FfmpegCommand, FilterChain, FilterGraph, FilterNode, Filterable,
    InputFile, Job, OutputFile, StreamSpecifier,
};

pub use ffweave_progress::{consume, LogEntry, ProgressParser, ProgressUpdate, ProgressValue};
