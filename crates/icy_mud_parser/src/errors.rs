//! Parser error types and error level definitions

use std::fmt::Display;

use thiserror::Error;

/// Error severity level for diagnostic reporting
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorLevel {
    /// Informational message (e.g., unrecognized but harmless sequences)
    Info = 0,
    /// Warning about potentially problematic input (parsing continues)
    Warning = 1,
    /// Error in parsing that may cause incorrect behavior
    Error = 2,
}

impl ErrorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for ErrorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorLevel> for log::Level {
    fn from(level: ErrorLevel) -> Self {
        match level {
            ErrorLevel::Info => log::Level::Info,
            ErrorLevel::Warning => log::Level::Warn,
            ErrorLevel::Error => log::Level::Error,
        }
    }
}

/// Faults found while scanning a MUD stream.
///
/// None of these stop the parser: the offending input is replayed as text or
/// ignored and scanning continues with the next character.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An escape, tag, entity or comment was cut short and replayed literally
    #[error("malformed {kind}: {sequence:?}")]
    MalformedSequence { kind: &'static str, sequence: String },

    /// A markup attribute carried a value that could not be used (bad color, non numeric field)
    #[error("invalid value {value:?} for {tag}.{attribute}")]
    InvalidAttributeValue { tag: String, attribute: String, value: String },

    /// A close tag had no matching open frame
    #[error("unbalanced markup: </{tag}> without matching open tag")]
    UnbalancedMarkup { tag: String },

    /// A line ended while captured output was still pending
    #[error("line ended with {depth} open capture(s)")]
    CaptureImbalance { depth: usize },

    /// Recognized but unsupported sequence or tag
    #[error("unsupported: {description}")]
    UnsupportedFeature { description: String },

    /// Scanner invariant broken; the current pass was abandoned
    #[error("internal parser error: {0}")]
    Internal(String),
}

impl ParseError {
    /// Returns the suggested error level for this error type
    pub fn level(&self) -> ErrorLevel {
        match self {
            Self::MalformedSequence { .. } => ErrorLevel::Warning,
            Self::InvalidAttributeValue { .. } => ErrorLevel::Warning,
            Self::UnbalancedMarkup { .. } => ErrorLevel::Warning,
            Self::CaptureImbalance { .. } => ErrorLevel::Warning,
            Self::UnsupportedFeature { .. } => ErrorLevel::Info,
            Self::Internal(_) => ErrorLevel::Error,
        }
    }

    pub(crate) fn malformed(kind: &'static str, sequence: impl Into<String>) -> Self {
        Self::MalformedSequence {
            kind,
            sequence: sequence.into(),
        }
    }

    pub(crate) fn invalid_value(tag: &str, attribute: &str, value: &str) -> Self {
        Self::InvalidAttributeValue {
            tag: tag.to_string(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    pub(crate) fn unsupported(description: impl Into<String>) -> Self {
        Self::UnsupportedFeature {
            description: description.into(),
        }
    }
}

/// Format a character for human readable diagnostics.
///
/// Control characters are printed with their mnemonic, e.g. "0x1B (ESC)".
pub fn print_char_value(ch: char) -> String {
    let name = match ch {
        '\x00' => "NUL",
        '\x07' => "BEL",
        '\x08' => "BS",
        '\x09' => "TAB",
        '\x0A' => "LF",
        '\x0D' => "CR",
        '\x1B' => "ESC",
        '\x7F' => "DEL",
        c if (c as u32) < 0x20 => "",
        c => return format!("0x{:02X} ('{}')", c as u32, c),
    };
    if name.is_empty() {
        format!("0x{:02X}", ch as u32)
    } else {
        format!("0x{:02X} ({})", ch as u32, name)
    }
}
