//! Error and warning types, grounded on the donor's `HtmlProcessorError`
//! shape: plain enums with a `Display` impl instead of exception-style
//! control flow.

use std::fmt;

/// Recoverable scanner conditions: the document is still tokenized, but the
/// input deviated from well-formed markup in a way worth surfacing.
#[derive(Clone, Debug, PartialEq)]
pub enum ScannerWarning {
    AbruptlyClosedComment,
    BogusComment,
    FunkyComment,
    PresumptuousTag,
    DuplicateAttribute { name: Box<str> },
    UnterminatedTag,
}

impl fmt::Display for ScannerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbruptlyClosedComment => f.write_str("abruptly closed comment"),
            Self::BogusComment => f.write_str("bogus comment"),
            Self::FunkyComment => f.write_str("funky comment"),
            Self::PresumptuousTag => f.write_str("presumptuous tag `</>`"),
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute `{name}`"),
            Self::UnterminatedTag => f.write_str("tag not closed before end of input"),
        }
    }
}

impl std::error::Error for ScannerWarning {}

/// Recoverable tree-construction conditions raised while balancing tags.
#[derive(Clone, Debug, PartialEq)]
pub enum BalancerNotice {
    IgnoredStartTag { name: Box<str> },
    IgnoredEndTag { name: Box<str> },
    SynthesizedStartTag { name: Box<str> },
    SynthesizedEndTag { name: Box<str> },
    MisnestedEndTag { name: Box<str> },
    /// Whitespace-only text relocated from directly inside a table-section
    /// element to just before the enclosing `<table>` (see `doc_tree`).
    FosterParented,
}

impl fmt::Display for BalancerNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IgnoredStartTag { name } => write!(f, "ignored start tag <{name}>"),
            Self::IgnoredEndTag { name } => write!(f, "ignored end tag </{name}>"),
            Self::SynthesizedStartTag { name } => write!(f, "synthesized start tag <{name}>"),
            Self::SynthesizedEndTag { name } => write!(f, "synthesized end tag </{name}>"),
            Self::MisnestedEndTag { name } => write!(f, "misnested end tag </{name}>"),
            Self::FosterParented => f.write_str("foster-parented whitespace text before table"),
        }
    }
}

impl std::error::Error for BalancerNotice {}

/// Errors returned from `ParserConfig` construction and mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NotRecognized { name: Box<str> },
    NotSupported { name: Box<str> },
    IncompatibleValue { name: Box<str>, reason: Box<str> },
    NotSupportedWhileParsing { name: Box<str> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRecognized { name } => write!(f, "unrecognized config property `{name}`"),
            Self::NotSupported { name } => write!(f, "unsupported config property `{name}`"),
            Self::IncompatibleValue { name, reason } => {
                write!(f, "incompatible value for `{name}`: {reason}")
            }
            Self::NotSupportedWhileParsing { name } => {
                write!(f, "cannot change `{name}` while parsing is in progress")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level parse errors: things that stop the pipeline rather than just
/// annotating a token or node.
#[derive(Debug)]
pub enum ParseError {
    Io(std::io::Error),
    EncodingSwitchTooLate,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::EncodingSwitchTooLate => {
                f.write_str("encoding declaration appeared after the prolog window closed")
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::EncodingSwitchTooLate => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
