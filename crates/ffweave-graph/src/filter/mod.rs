//! The filter-graph model: nodes, chains and graphs.
//!
//! A [`FilterGraph`] renders to ffmpeg's filtergraph syntax: chains are
//! separated by `;`, nodes within a chain by `,`, and parameters within a
//! node by `:`.

mod chain;
mod graph;
mod node;

pub use chain::{Attachment, FilterChain};
pub use graph::{FilterGraph, Filterable};
pub use node::{FilterNode, FilterParams};
