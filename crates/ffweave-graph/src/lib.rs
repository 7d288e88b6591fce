//! # ffweave-graph
//!
//! A typed model of an ffmpeg invocation and its exact command-line
//! rendering.
//!
//! This crate provides:
//!
//! - **Options** ([`CommandOption`], [`Arg`]) -- validated `-name value`
//!   pairs, with filter-graph aliases normalized to `-filter_complex`.
//! - **Filters** ([`FilterNode`], [`FilterChain`], [`FilterGraph`]) --
//!   nodes joined by `,`, chains joined by `;`, with labelled output pads.
//! - **Stream specifiers** ([`StreamSpecifier`]) -- references to input
//!   streams or chain output pads, resolved when they are built.
//! - **Files and commands** ([`InputFile`], [`OutputFile`],
//!   [`FfmpegCommand`]) -- token lists in ffmpeg's positional order.
//! - **Quoting** ([`quote`]) -- a single shell-safe command string.
//! - **Jobs** ([`Job`]) -- whole commands described as JSON.

pub mod command;
pub mod filter;
pub mod input;
pub mod job;
pub mod option;
pub mod output;
pub mod quote;
pub mod stream;

// ---- Re-exports for convenience ----

pub use command::FfmpegCommand;
pub use filter::{Attachment, FilterChain, FilterGraph, FilterNode, FilterParams, Filterable};
pub use input::InputFile;
pub use job::Job;
pub use option::{Arg, CommandOption, OptionValue, Options, FILTER_ALIASES, FILTER_COMPLEX};
pub use output::OutputFile;
pub use stream::{SpecifierOwner, StreamOwner, StreamSpecifier};

pub use ffweave_core::{Error, Result};
