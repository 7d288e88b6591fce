//! The top-level ffmpeg invocation.

use ffweave_core::{Error, FfmpegConfig, Result};

use crate::filter::{FilterChain, FilterGraph};
use crate::input::InputFile;
use crate::option::{Arg, CommandOption, Options};
use crate::output::OutputFile;
use crate::quote;
use crate::stream::{StreamOwner, StreamSpecifier};

/// A complete ffmpeg command: global options, inputs, one filter graph and
/// outputs.
///
/// Rendering follows ffmpeg's positional grammar:
///
/// ```text
/// <global options> ([input options] -i <url>)... [-filter_complex <graph>]
///     ([output options] [-map <spec>]... <url>)...
/// ```
///
/// # Example
///
/// ```
/// use ffweave_graph::{Arg, FfmpegCommand, InputFile, OutputFile};
///
/// let mut cmd = FfmpegCommand::new();
/// cmd.global_option("y", Arg::Null)?;
/// cmd.add_input(InputFile::new("in.mp4")?);
/// cmd.add_output(OutputFile::new("out.mp4")?.option("c:v", "libx264")?)?;
///
/// assert_eq!(
///     cmd.to_command_string(),
///     r#"ffmpeg -y -i "in.mp4" -c:v "libx264" "out.mp4""#
/// );
/// # Ok::<(), ffweave_core::Error>(())
/// ```
///
/// Cloning a command clones its filter graph under a new identity and
/// repoints the outputs' chain references at the copy.
#[derive(Debug, PartialEq)]
pub struct FfmpegCommand {
    program: Option<String>,
    global_options: Options,
    inputs: Vec<InputFile>,
    graph: FilterGraph,
    outputs: Vec<OutputFile>,
}

impl Clone for FfmpegCommand {
    fn clone(&self) -> Self {
        let graph = self.graph.clone();
        let mut outputs = self.outputs.clone();
        for output in &mut outputs {
            output.retarget_streams(self.graph.id(), graph.id());
        }
        Self {
            program: self.program.clone(),
            global_options: self.global_options.clone(),
            inputs: self.inputs.clone(),
            graph,
            outputs,
        }
    }
}

impl Default for FfmpegCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommand {
    /// An empty command rendered with the `ffmpeg` program name.
    pub fn new() -> Self {
        Self::with_program(Some("ffmpeg".to_string()))
    }

    /// An empty command with an explicit (or no) program name.
    pub fn with_program(program: Option<String>) -> Self {
        Self {
            program,
            global_options: Options::new(),
            inputs: Vec::new(),
            graph: FilterGraph::new(),
            outputs: Vec::new(),
        }
    }

    /// An empty command seeded from configuration: program name plus the
    /// global options the config enables.
    pub fn from_config(config: &FfmpegConfig) -> Self {
        let program = Some(config.program.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        let mut cmd = Self::with_program(program);

        if config.overwrite {
            cmd.global_options.push(CommandOption::flag("y"));
        }
        if config.hide_banner {
            cmd.global_options.push(CommandOption::flag("hide_banner"));
        }
        if let Some(ref level) = config.loglevel {
            cmd.global_options.push(CommandOption::text("loglevel", level));
        }
        if let Some(ref url) = config.progress_url {
            cmd.global_options.push(CommandOption::text("progress", url));
            cmd.global_options.push(CommandOption::flag("nostats"));
        }

        cmd
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }

    /// Validate and append a global option.
    pub fn global_option(&mut self, name: impl Into<String>, arg: impl Into<Arg>) -> Result<&mut Self> {
        self.global_options.add(name, arg)?;
        Ok(self)
    }

    pub fn global_options(&self) -> &Options {
        &self.global_options
    }

    /// Register an input. Inputs without a label get their ordinal position.
    pub fn add_input(&mut self, mut input: InputFile) -> &InputFile {
        let index = self.inputs.len();
        if input.label().is_none() {
            input.set_label(index.to_string());
        }
        tracing::debug!("Registered {}", input.describe());
        self.inputs.push(input);
        &self.inputs[index]
    }

    pub fn input(&self, index: usize) -> Option<&InputFile> {
        self.inputs.get(index)
    }

    pub fn inputs(&self) -> &[InputFile] {
        &self.inputs
    }

    /// Add a chain to this command's filter graph.
    pub fn add_filter_chain(&mut self, chain: FilterChain) -> Result<&FilterChain> {
        self.graph.add_filter_chain(chain)
    }

    pub fn filter_graph(&self) -> &FilterGraph {
        &self.graph
    }

    /// Register an output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] if one of the output's streams points at
    /// a filter chain that does not belong to this command's graph.
    pub fn add_output(&mut self, output: OutputFile) -> Result<&OutputFile> {
        for spec in output.streams() {
            self.check_owner(spec)?;
        }
        self.outputs.push(output);
        Ok(&self.outputs[self.outputs.len() - 1])
    }

    pub fn outputs(&self) -> &[OutputFile] {
        &self.outputs
    }

    fn check_owner(&self, spec: &StreamSpecifier) -> Result<()> {
        if let StreamOwner::FilterChain { graph, position, .. } = spec.owner() {
            if *graph != self.graph.id() {
                return Err(Error::resolution(
                    spec.raw(),
                    format!("filter chain #{position}"),
                    "chain belongs to a different filter graph",
                ));
            }
        }
        Ok(())
    }

    /// The full argument list, without the program name.
    pub fn to_command_tokens(&self) -> Vec<String> {
        let mut tokens = self.global_options.to_tokens();

        for input in &self.inputs {
            tokens.extend(input.to_tokens());
        }

        if !self.graph.is_empty() {
            tokens.push("-filter_complex".to_string());
            tokens.push(self.graph.to_string());
        }

        for output in &self.outputs {
            tokens.extend(output.to_tokens());
        }

        tracing::debug!(
            "Rendered command: {} inputs, {} chains, {} outputs, {} tokens",
            self.inputs.len(),
            self.graph.len(),
            self.outputs.len(),
            tokens.len()
        );
        tokens
    }

    /// The full command as one quoted string.
    pub fn to_command_string(&self) -> String {
        quote::to_command_string(self.program.as_deref(), &self.to_command_tokens())
    }
}
