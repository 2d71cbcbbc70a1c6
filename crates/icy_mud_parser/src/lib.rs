//! Incremental MUD stream parser.
//!
//! Turns arbitrarily chunked server output into styled lines. ANSI SGR colors
//! (including xterm 256 color and truecolor), MXP markup with its per line
//! security model, MSP sound triggers, URL detection and legacy control code
//! emulation are handled by [`MudParser`]; results and side channel events are
//! delivered to a [`ParserSink`].

mod color;
pub use color::{COLOR_SLOTS, ColorCode, ColorTable, Rgb, decrease_color, increase_color, ui};

mod errors;
pub use errors::{ErrorLevel, ParseError, print_char_value};

mod format;
pub use format::{FontStyle, FormatKind, ImageFormat, LineFormat, LinkFormat, ParsedLine, TextStyle, prune_formats};

pub mod mxp;

mod registry;
pub use registry::{Element, Entity, LineTag, Origin, Registries, Registry, RegistryEntry};

mod style;
pub use style::{FramePayload, FrameTag, StyleFrame, StyleStack};

mod security;
pub use security::{LineSecurity, LineType};

mod msp;
pub use msp::{SoundKind, SoundRequest};

mod lines;
pub use lines::{LineId, LineStore};

mod queue;
pub use queue::{ParseQueue, ParseRequest};

mod options;
pub use options::{ConfigError, ParserOptions, WindowSize};

mod oem;

mod parser;
pub use parser::MudParser;

/// Value of a `<GAUGE>` or `<STAT>` field: a number, or the raw text when it is not numeric.
#[derive(Debug, Clone, PartialEq)]
pub enum GaugeValue {
    Number(f64),
    Text(String),
}

impl GaugeValue {
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => GaugeValue::Number(n),
            _ => GaugeValue::Text(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    /// Entity the gauge tracks.
    pub entity: String,
    pub value: GaugeValue,
    pub max: GaugeValue,
    pub caption: String,
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub entity: String,
    pub value: GaugeValue,
    pub max: GaugeValue,
    pub caption: String,
}

/// Receives parsed lines and side channel events.
///
/// Every method has an empty default so a sink only implements what it cares about.
pub trait ParserSink {
    /// A completed line, or a soft line (`line.fragment`) that replaces the previous soft line.
    fn add_line(&mut self, _line: &ParsedLine) {}

    /// A stored line was rewritten, e.g. by link expiry.
    fn line_changed(&mut self, _id: LineId, _line: &ParsedLine) {}

    fn bell(&mut self) {}

    fn set_title(&mut self, _title: &str, _kind: u32) {}

    fn music(&mut self, _request: &SoundRequest) {}

    fn sound(&mut self, _request: &SoundRequest) {}

    /// Reply owed to the server, e.g. for `<VERSION>` or `<SUPPORT>`.
    fn tag_reply(&mut self, _tag: &str, _args: &[String]) {}

    /// A line with a non Open line type was terminated.
    fn tag_end(&mut self, _line_type: LineType, _text: &str) {}

    fn expire_links(&mut self, _args: &[String]) {}

    fn gauge(&mut self, _gauge: &Gauge) {}

    fn stat(&mut self, _stat: &Stat) {}

    /// A flagged custom element was closed with the text it enclosed.
    fn mxp_flag(&mut self, _flag: &str, _value: &str) {}

    fn set_variable(&mut self, _name: &str, _value: &str) {}

    fn debug(&mut self, _message: &str) {}

    fn report_error(&mut self, _error: ParseError) {}
}

/// Sink that drops everything.
pub struct NullSink;

impl ParserSink for NullSink {}
