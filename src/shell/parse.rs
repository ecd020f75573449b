//! Splitting an input line into argument words.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum ParseError {
    UnterminatedQuote,
    MissingRedirectTarget(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedQuote => write!(f, "unterminated quote"),
            ParseError::MissingRedirectTarget(op) => write!(f, "missing file name after '{op}'"),
        }
    }
}

/// One parsed input line, ready to dispatch or launch.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct CommandLine {
    /// The command words, starting with the program name. Never empty.
    pub(super) arguments: Vec<String>,
    /// Whether the line ended in a `&` word.
    pub(super) background: bool,
    pub(super) stdin_redirect: Option<PathBuf>,
    pub(super) stdout_redirect: Option<PathBuf>,
    /// The trimmed input text, kept verbatim for the job listing.
    pub(super) text: String,
}

impl CommandLine {
    /// Parse a raw input line. Lines containing no command words parse to
    /// `None`.
    ///
    /// Words are separated by whitespace; a pair of single quotes groups one
    /// word with embedded whitespace. A trailing `&` word marks the command
    /// as background. The words `<` and `>` attach the following word as an
    /// input or output redirection instead of an argument.
    pub(super) fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = split_words(line)?;

        let background = words.last().is_some_and(|word| word == "&");
        if background {
            words.pop();
        }

        let mut arguments = Vec::with_capacity(words.len());
        let mut stdin_redirect = None;
        let mut stdout_redirect = None;

        let mut words = words.into_iter();
        while let Some(word) = words.next() {
            match word.as_str() {
                "<" => {
                    let target = words.next().ok_or(ParseError::MissingRedirectTarget("<"))?;
                    stdin_redirect = Some(PathBuf::from(target));
                }
                ">" => {
                    let target = words.next().ok_or(ParseError::MissingRedirectTarget(">"))?;
                    stdout_redirect = Some(PathBuf::from(target));
                }
                _ => arguments.push(word),
            }
        }

        if arguments.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            arguments,
            background,
            stdin_redirect,
            stdout_redirect,
            text: line.trim().to_string(),
        }))
    }
}

fn split_words(line: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&first) = chars.peek() {
        if first.is_whitespace() {
            chars.next();
        } else if first == '\'' {
            chars.next();
            let mut word = String::new();
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(ch) => word.push(ch),
                    None => return Err(ParseError::UnterminatedQuote),
                }
            }
            words.push(word);
        } else {
            let mut word = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
            words.push(word);
        }
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::{CommandLine, ParseError};

    fn args(command: &CommandLine) -> Vec<&str> {
        command.arguments.iter().map(String::as_str).collect()
    }

    #[test]
    fn plain_words() {
        let command = CommandLine::parse("ls -l /tmp\n").unwrap().unwrap();
        assert_eq!(args(&command), ["ls", "-l", "/tmp"]);
        assert!(!command.background);
        assert_eq!(command.text, "ls -l /tmp");
    }

    #[test]
    fn trailing_ampersand_marks_background() {
        let command = CommandLine::parse("sleep 100 &\n").unwrap().unwrap();
        assert_eq!(args(&command), ["sleep", "100"]);
        assert!(command.background);
        // the listing text keeps the ampersand
        assert_eq!(command.text, "sleep 100 &");
    }

    #[test]
    fn single_quotes_group_one_word() {
        let command = CommandLine::parse("echo 'hello   world' done\n")
            .unwrap()
            .unwrap();
        assert_eq!(args(&command), ["echo", "hello   world", "done"]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert_eq!(
            CommandLine::parse("echo 'oops\n"),
            Err(ParseError::UnterminatedQuote)
        );
    }

    #[test]
    fn redirections_are_not_arguments() {
        let command = CommandLine::parse("sort < input.txt > output.txt\n")
            .unwrap()
            .unwrap();
        assert_eq!(args(&command), ["sort"]);
        assert_eq!(command.stdin_redirect, Some(PathBuf::from("input.txt")));
        assert_eq!(command.stdout_redirect, Some(PathBuf::from("output.txt")));
    }

    #[test]
    fn redirection_without_target_is_an_error() {
        assert_eq!(
            CommandLine::parse("sort <\n"),
            Err(ParseError::MissingRedirectTarget("<"))
        );
    }

    #[test]
    fn blank_lines_parse_to_none() {
        assert_eq!(CommandLine::parse("").unwrap(), None);
        assert_eq!(CommandLine::parse("   \n").unwrap(), None);
        // a lone ampersand launches nothing
        assert_eq!(CommandLine::parse("&\n").unwrap(), None);
    }
}
