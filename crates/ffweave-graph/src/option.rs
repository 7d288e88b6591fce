//! Command-line options: a name plus an optional argument.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use ffweave_core::{Error, Result};

use crate::filter::{FilterChain, FilterGraph, FilterNode, Filterable};

/// Option names ffmpeg accepts a filter description for. Any of them paired
/// with a filter argument is stored as `filter_complex`.
pub const FILTER_ALIASES: [&str; 7] = [
    "filter",
    "filter:v",
    "vf",
    "filter:a",
    "af",
    "filter_complex",
    "lavfi",
];

/// The canonical name filter options are normalized to.
pub const FILTER_COMPLEX: &str = "filter_complex";

/// An unvalidated option argument.
///
/// `List` and `Map` exist so that collections coming from dynamic sources
/// (JSON jobs, generic callers) can be represented and then rejected: a
/// positional command line has no way to express them.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// No argument; the option renders as a bare flag.
    Null,
    /// Any value with a plain string form.
    Text(String),
    /// A filter description, rendered in filter-graph syntax.
    Filter(FilterGraph),
    /// An ordered list. Never valid as an option argument.
    List(Vec<Arg>),
    /// A key/value map. Never valid as an option argument.
    Map(Vec<(String, Arg)>),
}

impl Arg {
    /// Wrap any `Display` value as text.
    pub fn display(value: impl fmt::Display) -> Self {
        Arg::Text(value.to_string())
    }

    /// Short description of the argument's shape, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Null => "null",
            Arg::Text(_) => "string",
            Arg::Filter(_) => "filter",
            Arg::List(_) => "list",
            Arg::Map(_) => "map",
        }
    }

    /// Whether this argument is a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Arg::List(_) | Arg::Map(_))
    }

    /// The string form of a scalar argument, or `None` for `Null` and
    /// collections.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Arg::Text(s) => Some(s.clone()),
            Arg::Filter(graph) => Some(graph.to_string()),
            Arg::Null | Arg::List(_) | Arg::Map(_) => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Text(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Text(value.clone())
    }
}

macro_rules! arg_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Text(value.to_string())
                }
            }
        )*
    };
}

arg_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, bool, char);

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

impl<T: Into<Arg>> From<Vec<T>> for Arg {
    fn from(values: Vec<T>) -> Self {
        Arg::List(values.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Arg>> From<BTreeMap<K, V>> for Arg {
    fn from(map: BTreeMap<K, V>) -> Self {
        Arg::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Arg>, S> From<HashMap<K, V, S>> for Arg {
    fn from(map: HashMap<K, V, S>) -> Self {
        Arg::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<FilterGraph> for Arg {
    fn from(graph: FilterGraph) -> Self {
        Arg::Filter(graph)
    }
}

impl From<FilterChain> for Arg {
    fn from(chain: FilterChain) -> Self {
        Arg::Filter(FilterGraph::from(chain))
    }
}

impl From<FilterNode> for Arg {
    fn from(node: FilterNode) -> Self {
        Arg::Filter(FilterGraph::from(node))
    }
}

impl<T: Into<Arg>> From<Filterable<T>> for Arg {
    fn from(value: Filterable<T>) -> Self {
        match FilterGraph::wrap(value) {
            Filterable::Graph(graph) => Arg::Filter(graph),
            Filterable::Chain(chain) => chain.into(),
            Filterable::Node(node) => node.into(),
            Filterable::Other(other) => other.into(),
        }
    }
}

impl From<serde_json::Value> for Arg {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Text(b.to_string()),
            Value::Number(n) => Arg::Text(n.to_string()),
            Value::String(s) => Arg::Text(s),
            Value::Array(items) => Arg::List(items.into_iter().map(Arg::from).collect()),
            Value::Object(map) => {
                Arg::Map(map.into_iter().map(|(k, v)| (k, Arg::from(v))).collect())
            }
        }
    }
}

/// A validated option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Renders as `-name`.
    Flag,
    /// Renders as `-name value`.
    Text(String),
    /// Renders as `-name <graph>`.
    Filter(FilterGraph),
}

/// One command-line option. Immutable once built.
///
/// # Example
///
/// ```
/// use ffweave_graph::{CommandOption, FilterNode};
///
/// let opt = CommandOption::new("threads", 8)?;
/// assert_eq!(opt.to_tokens(), vec!["-threads", "8"]);
///
/// let scale = FilterNode::positional("scale", [640, -1])?;
/// let vf = CommandOption::new("vf", scale)?;
/// assert_eq!(vf.name(), "filter_complex");
/// # Ok::<(), ffweave_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    name: String,
    value: OptionValue,
}

impl CommandOption {
    /// Build an option, validating the argument.
    ///
    /// A filter alias name paired with a filter argument is stored as
    /// `filter_complex`, whichever alias was passed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for an empty name or a collection
    /// argument, and [`Error::Resolution`] for a filter argument whose input
    /// links point into a different graph.
    pub fn new(name: impl Into<String>, arg: impl Into<Arg>) -> Result<Self> {
        let name = name.into();
        let arg = arg.into();
        Self::validate(&name, &arg)?;

        let value = match arg {
            Arg::Null => OptionValue::Flag,
            Arg::Text(s) => OptionValue::Text(s),
            Arg::Filter(graph) => OptionValue::Filter(graph),
            collection @ (Arg::List(_) | Arg::Map(_)) => {
                return Err(collection_error(&name, &collection))
            }
        };

        let name = match value {
            OptionValue::Filter(_) if FILTER_ALIASES.contains(&name.as_str()) => {
                if name != FILTER_COMPLEX {
                    tracing::debug!("Normalizing filter option -{} to -{}", name, FILTER_COMPLEX);
                }
                FILTER_COMPLEX.to_string()
            }
            _ => name,
        };

        Ok(Self { name, value })
    }

    /// An option without an argument.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: OptionValue::Flag,
        }
    }

    /// An option with a plain string argument.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: OptionValue::Text(value.into()),
        }
    }

    /// Check that `arg` can be rendered as the argument of option `name`.
    pub fn validate(name: &str, arg: &Arg) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("option name must not be empty"));
        }
        if arg.is_collection() {
            return Err(collection_error(name, arg));
        }
        if let Arg::Filter(graph) = arg {
            graph.check_links()?;
        }
        Ok(())
    }

    /// The stored option name, without the leading dash.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The validated value.
    pub fn value(&self) -> &OptionValue {
        &self.value
    }

    /// `[-name]` or `[-name, value]`.
    pub fn to_tokens(&self) -> Vec<String> {
        let flag = format!("-{}", self.name);
        match &self.value {
            OptionValue::Flag => vec![flag],
            OptionValue::Text(s) => vec![flag, s.clone()],
            OptionValue::Filter(graph) => vec![flag, graph.to_string()],
        }
    }
}

fn collection_error(name: &str, arg: &Arg) -> Error {
    Error::invalid_argument(format!(
        "option -{name} cannot take a {} argument",
        arg.kind()
    ))
}

/// An ordered list of options, rendered in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    items: Vec<CommandOption>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an option.
    pub fn add(&mut self, name: impl Into<String>, arg: impl Into<Arg>) -> Result<&mut Self> {
        self.items.push(CommandOption::new(name, arg)?);
        Ok(self)
    }

    /// Append an already-built option.
    pub fn push(&mut self, option: CommandOption) -> &mut Self {
        self.items.push(option);
        self
    }

    /// Look up the first option with the given stored name.
    pub fn get(&self, name: &str) -> Option<&CommandOption> {
        self.items.iter().find(|o| o.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandOption> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every option's tokens, concatenated in order.
    pub fn to_tokens(&self) -> Vec<String> {
        self.items.iter().flat_map(CommandOption::to_tokens).collect()
    }
}

impl FromIterator<CommandOption> for Options {
    fn from_iter<I: IntoIterator<Item = CommandOption>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
