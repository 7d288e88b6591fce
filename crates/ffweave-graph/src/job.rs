//! JSON job descriptions.
//!
//! A job describes a whole command declaratively:
//!
//! ```json
//! {
//!   "global_options": { "y": null },
//!   "inputs": [ { "url": "in.mp4", "options": { "threads": 8 } } ],
//!   "filter_graph": [
//!     { "inputs": [ { "input": 0, "stream": "v" } ],
//!       "nodes": [ { "name": "scale", "params": [640, -1] } ],
//!       "outputs": 1 }
//!   ],
//!   "outputs": [
//!     { "url": "out.mp4",
//!       "options": { "c:v": "libx264" },
//!       "streams": [ { "chain": 0, "pad": 0 }, { "input": 0, "stream": "a" } ] }
//!   ]
//! }
//! ```
//!
//! Option maps keep their order. Stream references are objects with either
//! `input` (+ optional `stream`) or `chain` (+ optional `pad`, default `0`).

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use ffweave_core::{Error, Result};

use crate::command::FfmpegCommand;
use crate::filter::{FilterChain, FilterNode};
use crate::input::InputFile;
use crate::option::{Arg, CommandOption};
use crate::output::OutputFile;
use crate::stream::StreamSpecifier;

/// Root of a job description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Job {
    pub global_options: Map<String, Value>,
    pub inputs: Vec<JobInput>,
    pub filter_graph: Vec<JobChain>,
    pub outputs: Vec<JobOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobInput {
    pub url: String,
    pub options: Map<String, Value>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobChain {
    pub inputs: Vec<Value>,
    pub nodes: Vec<JobNode>,
    /// A pad count, or an array of pad labels.
    pub outputs: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobNode {
    pub name: String,
    /// `null`, an array of positional values, or an object of keyed values.
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobOutput {
    pub url: String,
    pub options: Map<String, Value>,
    /// Must be an array of stream references.
    pub streams: Value,
}

impl Job {
    /// Parse a job from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a job file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build a command from this job.
    pub fn to_command(&self) -> Result<FfmpegCommand> {
        self.apply(FfmpegCommand::new())
    }

    /// Add this job's options, inputs, chains and outputs to `cmd`.
    ///
    /// Chain references must point at chains listed earlier in
    /// `filter_graph`, since pad names are positional.
    pub fn apply(&self, mut cmd: FfmpegCommand) -> Result<FfmpegCommand> {
        for (name, value) in &self.global_options {
            cmd.global_option(name.as_str(), value.clone())?;
        }

        for job_input in &self.inputs {
            let mut input = InputFile::new(job_input.url.as_str())?;
            for option in build_options(&job_input.options)? {
                input.push_option(option);
            }
            if let Some(ref label) = job_input.label {
                input = input.with_label(label.as_str());
            }
            cmd.add_input(input);
        }

        for (index, job_chain) in self.filter_graph.iter().enumerate() {
            let mut chain = FilterChain::new();
            for node in &job_chain.nodes {
                chain = chain.node(build_node(node)?);
            }
            for reference in &job_chain.inputs {
                let spec = resolve_reference(&cmd, reference)?;
                chain.add_input(spec);
            }
            chain = apply_outputs(chain, &job_chain.outputs, index)?;
            cmd.add_filter_chain(chain)?;
        }

        for job_output in &self.outputs {
            let mut output = OutputFile::new(job_output.url.as_str())?;
            for option in build_options(&job_output.options)? {
                output.push_option(option);
            }
            let references = match &job_output.streams {
                Value::Null => &[][..],
                Value::Array(items) => items.as_slice(),
                other => {
                    return Err(Error::invalid_argument(format!(
                        "streams of output '{}' must be an array, got {}",
                        job_output.url,
                        json_kind(other)
                    )))
                }
            };
            let specs = references
                .iter()
                .map(|r| resolve_reference(&cmd, r))
                .collect::<Result<Vec<_>>>()?;
            output.add_streams(specs);
            cmd.add_output(output)?;
        }

        Ok(cmd)
    }
}

fn build_options(options: &Map<String, Value>) -> Result<Vec<CommandOption>> {
    options
        .iter()
        .map(|(name, value)| CommandOption::new(name.as_str(), value.clone()))
        .collect()
}

fn build_node(node: &JobNode) -> Result<FilterNode> {
    match &node.params {
        Value::Null => {
            if node.name.is_empty() {
                return Err(Error::invalid_argument("filter name must not be empty"));
            }
            Ok(FilterNode::new(node.name.as_str()))
        }
        Value::Array(values) => {
            FilterNode::positional(node.name.as_str(), values.iter().cloned().map(Arg::from))
        }
        Value::Object(pairs) => FilterNode::keyed(
            node.name.as_str(),
            pairs.iter().map(|(k, v)| (k.as_str(), Arg::from(v.clone()))),
        ),
        other => FilterNode::positional(node.name.as_str(), [Arg::from(other.clone())]),
    }
}

/// Upper bound on the output pads a single job chain may declare.
const MAX_OUTPUT_PADS: u64 = u16::MAX as u64;

fn apply_outputs(chain: FilterChain, outputs: &Value, index: usize) -> Result<FilterChain> {
    match outputs {
        Value::Null => Ok(chain),
        Value::Number(n) => {
            let count = n.as_u64().ok_or_else(|| {
                Error::invalid_argument(format!(
                    "filter chain #{index} outputs must be a non-negative integer, got {n}"
                ))
            })?;
            if count > MAX_OUTPUT_PADS {
                return Err(Error::invalid_argument(format!(
                    "filter chain #{index} declares {count} output pads (limit {MAX_OUTPUT_PADS})"
                )));
            }
            Ok(chain.with_outputs(count as usize))
        }
        Value::Array(labels) => {
            let labels = labels
                .iter()
                .map(|l| {
                    l.as_str().map(str::to_string).ok_or_else(|| {
                        Error::invalid_argument(format!(
                            "filter chain #{index} output labels must be strings"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(chain.with_output_labels(labels))
        }
        other => Err(Error::invalid_argument(format!(
            "filter chain #{index} outputs must be a count or a list of labels, got {}",
            json_kind(other)
        ))),
    }
}

/// Turn a JSON stream reference into a resolved specifier.
fn resolve_reference(cmd: &FfmpegCommand, reference: &Value) -> Result<StreamSpecifier> {
    let Value::Object(fields) = reference else {
        return Err(Error::invalid_argument(format!(
            "stream reference must be an object, got {}",
            json_kind(reference)
        )));
    };

    if let Some(index) = fields.get("input") {
        let index = as_index(index, "input")?;
        let input = cmd.input(index).ok_or_else(|| {
            Error::resolution(
                reference_raw(fields.get("stream")),
                format!("input #{index}"),
                format!("command has {} inputs", cmd.inputs().len()),
            )
        })?;
        return StreamSpecifier::new(input, reference_raw(fields.get("stream")));
    }

    if let Some(index) = fields.get("chain") {
        let index = as_index(index, "chain")?;
        let pad = fields.get("pad").map_or_else(|| "0".to_string(), |p| reference_raw(Some(p)));
        let chain = cmd.filter_graph().chain(index).ok_or_else(|| {
            Error::resolution(
                &pad,
                format!("filter chain #{index}"),
                "no such chain (chains can only reference chains listed before them)",
            )
        })?;
        return StreamSpecifier::new(chain, pad);
    }

    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    Err(Error::invalid_entity(format!(
        "stream reference must name an 'input' or a 'chain', got keys [{}]",
        keys.join(", ")
    )))
}

fn as_index(value: &Value, what: &str) -> Result<usize> {
    value
        .as_u64()
        .map(|i| i as usize)
        .ok_or_else(|| Error::invalid_argument(format!("'{what}' must be a non-negative integer")))
}

fn reference_raw(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
