//! Input files: `[options...] -i <url>`.

use ffweave_core::{Error, Result};

use crate::option::{Arg, CommandOption, Options};

/// One `-i` input with its input options.
///
/// The label is what stream specifiers use to address the input. It is
/// normally assigned by [`FfmpegCommand::add_input`](crate::FfmpegCommand::add_input)
/// as the input's ordinal position.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFile {
    url: String,
    options: Options,
    label: Option<String>,
}

impl InputFile {
    /// # Errors
    ///
    /// Returns [`Error::RequiredFieldMissing`] if `url` is empty.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::missing("input", "url"));
        }
        Ok(Self {
            url,
            options: Options::new(),
            label: None,
        })
    }

    /// Append an input option (builder style).
    pub fn option(mut self, name: impl Into<String>, arg: impl Into<Arg>) -> Result<Self> {
        self.options.add(name, arg)?;
        Ok(self)
    }

    /// Append an already-built option.
    pub fn push_option(&mut self, option: CommandOption) -> &mut Self {
        self.options.push(option);
        self
    }

    /// Set the label explicitly.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("input #{} '{}'", label, self.url),
            None => format!("input '{}'", self.url),
        }
    }

    /// Input options in order, then `-i <url>`.
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = self.options.to_tokens();
        tokens.push("-i".to_string());
        tokens.push(self.url.clone());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn options_precede_input_flag() {
        let input = InputFile::new("/media/in.mkv")
            .unwrap()
            .option("threads", 8)
            .unwrap()
            .option("ss", "6234.0182917")
            .unwrap();

        assert_eq!(
            input.to_tokens(),
            vec!["-threads", "8", "-ss", "6234.0182917", "-i", "/media/in.mkv"]
        );
    }

    #[test]
    fn empty_url_rejected() {
        assert_matches!(
            InputFile::new("  "),
            Err(Error::RequiredFieldMissing { entity, field }) if entity == "input" && field == "url"
        );
    }

    #[test]
    fn describe_includes_label_once_assigned() {
        let input = InputFile::new("a.wav").unwrap();
        assert_eq!(input.describe(), "input 'a.wav'");
        let input = input.with_label("2");
        assert_eq!(input.describe(), "input #2 'a.wav'");
    }
}
