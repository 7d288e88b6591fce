//! Stream specifiers: references from a consumer (an output, or a filter
//! chain's input) to a producer (an input file's stream, or a filter chain's
//! output pad).

use std::fmt;

use uuid::Uuid;

use ffweave_core::{Error, Result};

use crate::filter::FilterChain;
use crate::input::InputFile;

/// The entity a specifier is built against.
#[derive(Debug, Clone, Copy)]
pub enum SpecifierOwner<'a> {
    Input(&'a InputFile),
    FilterChain(&'a FilterChain),
}

impl<'a> From<&'a InputFile> for SpecifierOwner<'a> {
    fn from(input: &'a InputFile) -> Self {
        SpecifierOwner::Input(input)
    }
}

impl<'a> From<&'a FilterChain> for SpecifierOwner<'a> {
    fn from(chain: &'a FilterChain) -> Self {
        SpecifierOwner::FilterChain(chain)
    }
}

impl SpecifierOwner<'_> {
    fn describe(&self) -> String {
        match self {
            SpecifierOwner::Input(input) => input.describe(),
            SpecifierOwner::FilterChain(chain) => chain.describe(),
        }
    }
}

/// What a specifier resolved to, captured at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOwner {
    /// A stream of an input file, addressed by the input's label.
    Input { label: String },
    /// An output pad of a filter chain.
    FilterChain {
        graph: Uuid,
        position: usize,
        pad: String,
    },
}

/// A resolved stream reference.
///
/// Construction resolves the reference immediately, so structural errors
/// (an unlabelled input, a detached chain, a pad that does not exist) are
/// reported here and rendering can never fail.
///
/// # Example
///
/// ```
/// use ffweave_graph::{FfmpegCommand, InputFile, StreamSpecifier};
///
/// let mut cmd = FfmpegCommand::new();
/// let input = cmd.add_input(InputFile::new("in.mp4")?);
/// let audio = StreamSpecifier::new(input, "a:0")?;
/// assert_eq!(audio.to_string(), "0:a:0");
/// # Ok::<(), ffweave_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpecifier {
    owner: StreamOwner,
    raw: String,
}

impl StreamSpecifier {
    /// Build and resolve a specifier against `owner`.
    ///
    /// For inputs `raw` is an ffmpeg stream specifier (`v`, `a:1`, `0`, ...);
    /// an empty `raw` selects every stream of the input. For filter chains
    /// `raw` is an output pad index or label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] naming both the specifier and the owner
    /// if the reference cannot be resolved.
    pub fn new<'a>(owner: impl Into<SpecifierOwner<'a>>, raw: impl fmt::Display) -> Result<Self> {
        let owner = owner.into();
        let raw = raw.to_string();

        let resolved = Self::resolve(&owner, &raw)
            .map_err(|message| Error::resolution(&raw, owner.describe(), message))?;

        let spec = Self {
            owner: resolved,
            raw,
        };
        tracing::debug!("Resolved stream specifier '{}' to {}", spec.raw, spec.render());
        Ok(spec)
    }

    fn resolve(owner: &SpecifierOwner<'_>, raw: &str) -> std::result::Result<StreamOwner, String> {
        match owner {
            SpecifierOwner::Input(input) => {
                let label = input.label().ok_or_else(|| {
                    "input has no label; register it with a command first".to_string()
                })?;
                Ok(StreamOwner::Input {
                    label: label.to_string(),
                })
            }
            SpecifierOwner::FilterChain(chain) => {
                let pad = chain.resolve_output_pad(raw)?;
                let attachment = chain
                    .attachment()
                    .ok_or_else(|| "filter chain is not attached to a filter graph".to_string())?;
                Ok(StreamOwner::FilterChain {
                    graph: attachment.graph,
                    position: attachment.position,
                    pad,
                })
            }
        }
    }

    /// The specifier as supplied by the caller.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn owner(&self) -> &StreamOwner {
        &self.owner
    }

    /// Repoint a chain-pad reference from graph `from` to graph `to`.
    pub(crate) fn retarget(&mut self, from: Uuid, to: Uuid) {
        if let StreamOwner::FilterChain { graph, .. } = &mut self.owner {
            if *graph == from {
                *graph = to;
            }
        }
    }

    /// The form used after `-map`: `<label>:<raw>` for inputs, `[<pad>]` for
    /// filter chains.
    pub fn render(&self) -> String {
        match &self.owner {
            StreamOwner::Input { label } if self.raw.is_empty() => label.clone(),
            StreamOwner::Input { label } => format!("{}:{}", label, self.raw),
            StreamOwner::FilterChain { pad, .. } => format!("[{pad}]"),
        }
    }

    /// The form used as a filter chain input link, always bracketed.
    pub fn to_link(&self) -> String {
        match &self.owner {
            StreamOwner::Input { .. } => format!("[{}]", self.render()),
            StreamOwner::FilterChain { .. } => self.render(),
        }
    }
}

impl fmt::Display for StreamSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
