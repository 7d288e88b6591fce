//! Output files: `[options...] [-map <spec>]... <url>`.

use ffweave_core::{Error, Result};

use crate::option::{Arg, CommandOption, Options};
use crate::stream::StreamSpecifier;

use uuid::Uuid;

/// One output file with its options and mapped streams.
///
/// Stream order is significant: each specifier becomes its own `-map`
/// directive, which fixes the output's stream index order. Duplicates are
/// kept.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFile {
    url: String,
    options: Options,
    streams: Vec<StreamSpecifier>,
}

impl OutputFile {
    /// # Errors
    ///
    /// Returns [`Error::RequiredFieldMissing`] if `url` is empty.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::missing("output", "url"));
        }
        Ok(Self {
            url,
            options: Options::new(),
            streams: Vec::new(),
        })
    }

    /// Append an output option (builder style).
    pub fn option(mut self, name: impl Into<String>, arg: impl Into<Arg>) -> Result<Self> {
        self.options.add(name, arg)?;
        Ok(self)
    }

    /// Append an already-built option.
    pub fn push_option(&mut self, option: CommandOption) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Map one stream (builder style).
    pub fn map(mut self, spec: StreamSpecifier) -> Self {
        self.streams.push(spec);
        self
    }

    /// Append streams in order, without de-duplication.
    pub fn add_streams(&mut self, specs: impl IntoIterator<Item = StreamSpecifier>) -> &mut Self {
        self.streams.extend(specs);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn streams(&self) -> &[StreamSpecifier] {
        &self.streams
    }

    pub(crate) fn retarget_streams(&mut self, from: Uuid, to: Uuid) {
        for spec in &mut self.streams {
            spec.retarget(from, to);
        }
    }

    /// Options, then one `-map` pair per stream, then the url.
    ///
    /// ffmpeg applies options and maps to the next output file named on the
    /// command line, so the url has to come last.
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = self.options.to_tokens();
        for spec in &self.streams {
            tokens.push("-map".to_string());
            tokens.push(spec.render());
        }
        tokens.push(self.url.clone());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFile;
    use assert_matches::assert_matches;

    #[test]
    fn options_maps_then_url() {
        let input = InputFile::new("in.mp4").unwrap().with_label("0");
        let video = StreamSpecifier::new(&input, "v").unwrap();

        let output = OutputFile::new("out.mp4")
            .unwrap()
            .option("c:v", "libx264")
            .unwrap()
            .option("an", Arg::Null)
            .unwrap()
            .map(video);

        assert_eq!(
            output.to_tokens(),
            vec!["-c:v", "libx264", "-an", "-map", "0:v", "out.mp4"]
        );
    }

    #[test]
    fn duplicate_streams_each_get_a_map() {
        let input = InputFile::new("in.mp4").unwrap().with_label("0");
        let s0 = StreamSpecifier::new(&input, "v:0").unwrap();
        let s1 = StreamSpecifier::new(&input, "a:0").unwrap();

        let mut output = OutputFile::new("out.mkv").unwrap();
        output.add_streams([s0, s1.clone(), s1]);

        assert_eq!(
            output.to_tokens(),
            vec!["-map", "0:v:0", "-map", "0:a:0", "-map", "0:a:0", "out.mkv"]
        );
        assert_eq!(output.streams().len(), 3);
    }

    #[test]
    fn empty_url_rejected() {
        assert_matches!(
            OutputFile::new(""),
            Err(Error::RequiredFieldMissing { entity, .. }) if entity == "output"
        );
    }

    #[test]
    fn collection_option_rejected() {
        let result = OutputFile::new("out.mp4").unwrap().option("metadata", vec!["a", "b"]);
        assert_matches!(result, Err(Error::InvalidArgument(_)));
    }
}
