//! Rendering of token sequences into a single shell-style command string.
//!
//! The leading element (the program name, or the first token when no program
//! is given) is written verbatim. After that every token is double-quoted,
//! except option flags: tokens that start with `-` and contain no whitespace.

/// Whether `token` renders as a bare option flag.
pub fn is_flag(token: &str) -> bool {
    token.starts_with('-') && !token.chars().any(char::is_whitespace)
}

/// Wrap `token` in double quotes, escaping characters a POSIX shell
/// interprets inside double quotes.
pub fn quote(token: &str) -> String {
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for c in token.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Join `tokens` into one command string, optionally led by `program`.
///
/// # Example
///
/// ```
/// use ffweave_graph::quote::to_command_string;
///
/// let tokens = ["-y", "-r", "23.976", "-f", "lavfi"];
/// assert_eq!(
///     to_command_string(Some("ffmpeg"), &tokens),
///     r#"ffmpeg -y -r "23.976" -f "lavfi""#
/// );
/// ```
pub fn to_command_string<S: AsRef<str>>(program: Option<&str>, tokens: &[S]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(tokens.len() + 1);
    let mut rest = tokens.iter().map(AsRef::as_ref);

    match program {
        Some(program) => parts.push(program.to_string()),
        None => {
            if let Some(first) = rest.next() {
                parts.push(first.to_string());
            }
        }
    }

    for token in rest {
        if is_flag(token) {
            parts.push(token.to_string());
        } else {
            parts.push(quote(token));
        }
    }

    parts.join(" ")
}
