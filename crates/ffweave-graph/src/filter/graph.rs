//! An ordered collection of filter chains.

use std::fmt;

use uuid::Uuid;

use ffweave_core::{Error, Result};

use crate::filter::{FilterChain, FilterNode};
use crate::stream::StreamOwner;

/// Anything a call site may hand over where "a filter, a chain, or a graph"
/// is accepted. `Other` carries non-filter values through untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Filterable<T> {
    Graph(FilterGraph),
    Chain(FilterChain),
    Node(FilterNode),
    Other(T),
}

/// A full filter graph, as passed to `-filter_complex`.
///
/// The graph owns its chains. Insertion order is significant: it fixes the
/// positional pad names other entities use to reference chain outputs.
///
/// # Example
///
/// ```
/// use ffweave_graph::{FilterChain, FilterGraph, FilterNode};
///
/// let mut graph = FilterGraph::new();
/// graph.add_filter_chain(FilterChain::from_nodes([
///     FilterNode::positional("scale", [640, -1])?,
/// ]))?;
/// assert_eq!(graph.to_string(), "scale=640:-1");
/// # Ok::<(), ffweave_core::Error>(())
/// ```
///
/// A clone is a distinct graph: it gets a fresh identity, its chains are
/// attached to it, and links between its own chains follow it.
#[derive(Debug, PartialEq)]
pub struct FilterGraph {
    id: Uuid,
    chains: Vec<FilterChain>,
}

impl Default for FilterGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterGraph {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            chains: Vec::new(),
        }
    }

    /// Identity used by chain back-references.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Take ownership of `chain`, append it and attach it to this graph.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the chain has no nodes.
    /// - [`Error::Resolution`] if one of the chain's inputs links to a chain
    ///   of a different graph.
    pub fn add_filter_chain(&mut self, mut chain: FilterChain) -> Result<&FilterChain> {
        if chain.is_empty() {
            return Err(Error::invalid_argument("filter chain has no filter nodes"));
        }
        self.check_chain_links(&chain)?;

        let position = self.chains.len();
        chain.attach(self.id, position);
        tracing::debug!("Attached filter chain #{} to graph {}", position, self.id);

        self.chains.push(chain);
        Ok(&self.chains[position])
    }

    /// Position of `chain` within this graph, compared by identity.
    pub fn chain_position(&self, chain: &FilterChain) -> Option<usize> {
        self.chains.iter().position(|c| std::ptr::eq(c, chain))
    }

    pub fn chain(&self, position: usize) -> Option<&FilterChain> {
        self.chains.get(position)
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Normalize "a filter, a chain or a graph" into a graph.
    ///
    /// Graphs are returned unchanged, chains and nodes are wrapped into a new
    /// single-chain graph, and anything else passes through as-is.
    pub fn wrap<T>(value: Filterable<T>) -> Filterable<T> {
        match value {
            Filterable::Graph(graph) => Filterable::Graph(graph),
            Filterable::Chain(chain) => Filterable::Graph(FilterGraph::from(chain)),
            Filterable::Node(node) => Filterable::Graph(FilterGraph::from(node)),
            Filterable::Other(other) => Filterable::Other(other),
        }
    }

    /// Check that every chain-pad input link points into this graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] for the first link to another graph.
    pub fn check_links(&self) -> Result<()> {
        self.chains
            .iter()
            .try_for_each(|chain| self.check_chain_links(chain))
    }

    fn check_chain_links(&self, chain: &FilterChain) -> Result<()> {
        for spec in chain.inputs() {
            if let StreamOwner::FilterChain { graph, position, .. } = spec.owner() {
                if *graph != self.id {
                    return Err(Error::resolution(
                        spec.raw(),
                        format!("filter chain #{position}"),
                        "input links to a chain of a different filter graph",
                    ));
                }
            }
        }
        Ok(())
    }

    fn push_unchecked(&mut self, mut chain: FilterChain) {
        chain.attach(self.id, self.chains.len());
        self.chains.push(chain);
    }
}

impl Clone for FilterGraph {
    fn clone(&self) -> Self {
        let mut graph = FilterGraph::new();
        for chain in &self.chains {
            let mut chain = chain.clone();
            chain.retarget_inputs(self.id, graph.id);
            graph.push_unchecked(chain);
        }
        graph
    }
}

/// Wraps a detached chain. Input links are not checked here, since the new
/// graph has no chains they could point at; callers that accept wrapped
/// graphs run [`FilterGraph::check_links`].
impl From<FilterChain> for FilterGraph {
    fn from(chain: FilterChain) -> Self {
        let mut graph = FilterGraph::new();
        graph.push_unchecked(chain);
        graph
    }
}

impl From<FilterNode> for FilterGraph {
    fn from(node: FilterNode) -> Self {
        FilterGraph::from(FilterChain::from_nodes([node]))
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}
