//! A linear sequence of filter nodes.

use std::fmt;

use uuid::Uuid;

use crate::filter::FilterNode;
use crate::stream::StreamSpecifier;

/// Non-owning back-reference from a chain to the graph that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
    /// Identity of the owning graph.
    pub graph: Uuid,
    /// Position of the chain within that graph.
    pub position: usize,
}

/// One linear filter pipeline: `[in]node,node,node[out]`.
///
/// Input links are stream specifiers rendered before the first node. Output
/// pads are declared with [`with_outputs`](Self::with_outputs) or
/// [`with_output_labels`](Self::with_output_labels); their names depend on
/// the chain's position, so they only exist once the chain has been added to
/// a [`FilterGraph`](crate::FilterGraph).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    nodes: Vec<FilterNode>,
    inputs: Vec<StreamSpecifier>,
    outputs: Vec<Option<String>>,
    attachment: Option<Attachment>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from nodes in order.
    pub fn from_nodes(nodes: impl IntoIterator<Item = FilterNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Append a node.
    pub fn node(mut self, node: FilterNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Append an input link.
    pub fn input(mut self, spec: StreamSpecifier) -> Self {
        self.inputs.push(spec);
        self
    }

    /// Append an input link in place.
    pub fn add_input(&mut self, spec: StreamSpecifier) -> &mut Self {
        self.inputs.push(spec);
        self
    }

    /// Declare `count` unlabelled output pads, addressable by index.
    pub fn with_outputs(mut self, count: usize) -> Self {
        self.outputs = vec![None; count];
        self
    }

    /// Declare output pads addressable by index or by label.
    pub fn with_output_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = labels.into_iter().map(|l| Some(l.into())).collect();
        self
    }

    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    pub fn inputs(&self) -> &[StreamSpecifier] {
        &self.inputs
    }

    /// Number of declared output pads.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The owning graph and position, if attached.
    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    pub(crate) fn attach(&mut self, graph: Uuid, position: usize) {
        self.attachment = Some(Attachment { graph, position });
    }

    pub(crate) fn retarget_inputs(&mut self, from: Uuid, to: Uuid) {
        for spec in &mut self.inputs {
            spec.retarget(from, to);
        }
    }

    /// Name of the output pad `specifier` refers to.
    ///
    /// `specifier` is either a pad index or one of the labels given to
    /// [`with_output_labels`](Self::with_output_labels). The returned name is
    /// positional (`c<position>_<index>`), which is why the chain must be
    /// attached.
    pub fn resolve_output_pad(&self, specifier: &str) -> Result<String, String> {
        let attachment = self
            .attachment
            .ok_or_else(|| "filter chain is not attached to a filter graph".to_string())?;

        let index = match specifier.parse::<usize>() {
            Ok(index) if index < self.outputs.len() => index,
            Ok(index) => {
                return Err(format!(
                    "output pad index {index} out of range (chain declares {} output pads)",
                    self.outputs.len()
                ))
            }
            Err(_) => self
                .outputs
                .iter()
                .position(|label| label.as_deref() == Some(specifier))
                .ok_or_else(|| format!("no output pad labelled '{specifier}'"))?,
        };

        Ok(pad_name(attachment.position, index))
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self.attachment {
            Some(a) => format!("filter chain #{}", a.position),
            None => "detached filter chain".to_string(),
        }
    }
}

fn pad_name(position: usize, index: usize) -> String {
    format!("c{position}_{index}")
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for spec in &self.inputs {
            write!(f, "{}", spec.to_link())?;
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{node}")?;
        }

        if let Some(attachment) = self.attachment {
            for index in 0..self.outputs.len() {
                write!(f, "[{}]", pad_name(attachment.position, index))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> FilterNode {
        FilterNode::positional("scale", [640, -1]).unwrap()
    }

    #[test]
    fn nodes_join_with_commas() {
        let chain = FilterChain::new()
            .node(scale())
            .node(FilterNode::keyed("fps", [("fps", 30)]).unwrap())
            .node(FilterNode::new("hflip"));
        assert_eq!(chain.to_string(), "scale=640:-1,fps=fps=30,hflip");
    }

    #[test]
    fn detached_chain_cannot_resolve_pads() {
        let chain = FilterChain::from_nodes([scale()]).with_outputs(1);
        let err = chain.resolve_output_pad("0").unwrap_err();
        assert!(err.contains("not attached"));
        assert_eq!(chain.describe(), "detached filter chain");
    }

    #[test]
    fn attached_chain_resolves_index_and_label() {
        let mut chain = FilterChain::from_nodes([FilterNode::new("split")])
            .with_output_labels(["main", "thumb"]);
        chain.attach(Uuid::new_v4(), 2);

        assert_eq!(chain.resolve_output_pad("0").unwrap(), "c2_0");
        assert_eq!(chain.resolve_output_pad("1").unwrap(), "c2_1");
        assert_eq!(chain.resolve_output_pad("thumb").unwrap(), "c2_1");
        assert!(chain.resolve_output_pad("2").unwrap_err().contains("out of range"));
        assert!(chain.resolve_output_pad("preview").unwrap_err().contains("preview"));
    }

    #[test]
    fn attached_chain_renders_output_pads() {
        let mut chain = FilterChain::from_nodes([FilterNode::new("split")]).with_outputs(2);
        assert_eq!(chain.to_string(), "split");

        chain.attach(Uuid::new_v4(), 1);
        assert_eq!(chain.to_string(), "split[c1_0][c1_1]");
    }

    #[test]
    fn chain_without_declared_outputs_renders_no_labels() {
        let mut chain = FilterChain::from_nodes([scale()]);
        chain.attach(Uuid::new_v4(), 0);
        assert_eq!(chain.to_string(), "scale=640:-1");
        assert!(chain.resolve_output_pad("0").is_err());
    }
}
