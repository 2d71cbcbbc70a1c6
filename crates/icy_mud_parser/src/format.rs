//! Styled line model: format fragments, parsed lines and fragment pruning.

use bitflags::bitflags;

use crate::Rgb;

bitflags! {
    /// Text attribute bits carried by a [`TextStyle`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u16 {
        const BOLD = 0b0000_0000_0001;
        const FAINT = 0b0000_0000_0010;
        const ITALIC = 0b0000_0000_0100;
        const UNDERLINE = 0b0000_0000_1000;
        const SLOW_BLINK = 0b0000_0001_0000;
        const RAPID_BLINK = 0b0000_0010_0000;
        const INVERSE = 0b0000_0100_0000;
        const HIDDEN = 0b0000_1000_0000;
        const STRIKEOUT = 0b0001_0000_0000;
        const DOUBLE_UNDERLINE = 0b0010_0000_0000;
        const OVERLINE = 0b0100_0000_0000;
    }
}

impl FontStyle {
    pub const BLINK: FontStyle = FontStyle::SLOW_BLINK.union(FontStyle::RAPID_BLINK);
}

/// Resolved look of a run of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub fore: Rgb,
    pub back: Rgb,
    pub style: FontStyle,
    pub font: Option<String>,
    pub size: Option<String>,
    /// The run contains characters outside Latin-1 and needs real width measurement.
    pub unicode: bool,
    /// The run is a horizontal rule.
    pub hr: bool,
}

impl TextStyle {
    fn same_look(&self, other: &TextStyle) -> bool {
        self.fore == other.fore && self.back == other.back && self.style == other.style && self.font == other.font && self.size == other.size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkFormat {
    pub href: String,
    /// `href` split on `|`; a SEND with several commands opens a menu.
    pub commands: Vec<String>,
    pub hint: String,
    pub expire: Option<String>,
    pub prompt: bool,
    /// Menu captions, one per command, when the hint listed them.
    pub tooltip: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFormat {
    pub name: String,
    pub url: String,
    pub kind: String,
    pub height: Option<String>,
    pub width: Option<String>,
    pub hspace: Option<String>,
    pub vspace: Option<String>,
    pub align: String,
    pub ismap: bool,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            kind: String::new(),
            height: None,
            width: None,
            hspace: None,
            vspace: None,
            align: "bottom".to_string(),
            ismap: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatKind {
    Normal(TextStyle),
    /// Detected URL.
    Link(LinkFormat),
    LinkEnd,
    MxpLink(LinkFormat),
    MxpLinkEnd,
    Image(ImageFormat),
    MxpSend(LinkFormat),
    MxpSendEnd,
    /// An MXP link or send that was retired by `<EXPIRE>`.
    MxpExpired(LinkFormat),
    /// The closer of an expired link, ignored when rendering.
    MxpSkip,
}

impl FormatKind {
    /// Discriminant without payload, used when comparing neighbouring fragments.
    pub fn kind_id(&self) -> u8 {
        match self {
            FormatKind::Normal(_) => 0,
            FormatKind::Link(_) => 1,
            FormatKind::LinkEnd => 2,
            FormatKind::MxpLink(_) => 3,
            FormatKind::MxpLinkEnd => 4,
            FormatKind::Image(_) => 5,
            FormatKind::MxpSend(_) => 6,
            FormatKind::MxpSendEnd => 7,
            FormatKind::MxpExpired(_) => 8,
            FormatKind::MxpSkip => 9,
        }
    }

    pub fn link(&self) -> Option<&LinkFormat> {
        match self {
            FormatKind::Link(link) | FormatKind::MxpLink(link) | FormatKind::MxpSend(link) | FormatKind::MxpExpired(link) => Some(link),
            _ => None,
        }
    }
}

/// One fragment of a line: `kind` applies from `offset` (in characters) up to the next fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    pub offset: usize,
    pub kind: FormatKind,
}

impl LineFormat {
    pub fn new(offset: usize, kind: FormatKind) -> Self {
        Self { offset, kind }
    }

    pub fn style(&self) -> Option<&TextStyle> {
        match &self.kind {
            FormatKind::Normal(style) => Some(style),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    pub text: String,
    /// Wire characters that produced this line, tags and escapes included.
    pub raw: String,
    pub formats: Vec<LineFormat>,
    /// The line has not seen its terminator yet and will be replaced by a later emission.
    pub fragment: bool,
    pub gagged: bool,
    pub remote: bool,
}

impl ParsedLine {
    /// Returns the `[start, end)` character span each fragment covers.
    pub fn spans(&self) -> Vec<(usize, usize, &LineFormat)> {
        let len = self.text.chars().count();
        self.formats
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let end = self.formats.get(i + 1).map(|n| n.offset).unwrap_or(len);
                (f.offset, end.max(f.offset), f)
            })
            .collect()
    }

    /// Text covered by the fragment at `index`.
    pub fn fragment_text(&self, index: usize) -> Option<String> {
        let (start, end, _) = *self.spans().get(index)?;
        Some(self.text.chars().skip(start).take(end - start).collect())
    }
}

/// Removes fragments that can never style anything.
///
/// A fragment immediately superseded by one of the same kind at the same
/// offset is dropped, neighbouring runs with an identical look are merged,
/// zero width link pairs vanish and a trailing zero width fragment on a
/// terminated line is removed.
pub fn prune_formats(formats: Vec<LineFormat>, text_len: usize, fragment: bool) -> Vec<LineFormat> {
    if formats.len() < 2 {
        return formats;
    }
    let formats = collapse_superseded(drop_zero_width_links(collapse_superseded(formats)));
    let count = formats.len();
    let mut result: Vec<LineFormat> = Vec::with_capacity(count);
    for (i, format) in formats.into_iter().enumerate() {
        if i == count - 1 && !fragment && text_len != 0 && format.offset == text_len {
            let droppable = match &format.kind {
                FormatKind::Normal(style) => !style.hr,
                FormatKind::Link(_) | FormatKind::MxpSend(_) | FormatKind::MxpLink(_) => true,
                _ => false,
            };
            if droppable {
                continue;
            }
        }
        if let (Some(FormatKind::Normal(prev)), FormatKind::Normal(style)) = (result.last_mut().map(|f| &mut f.kind), &format.kind) {
            if !prev.hr && !style.hr && prev.same_look(style) {
                prev.unicode |= style.unicode;
                continue;
            }
        }
        result.push(format);
    }
    result
}

fn is_plain_normal(format: &LineFormat) -> bool {
    matches!(&format.kind, FormatKind::Normal(style) if !style.hr)
}

/// Of consecutive normal fragments at one offset only the last one counts.
fn collapse_superseded(formats: Vec<LineFormat>) -> Vec<LineFormat> {
    let mut result: Vec<LineFormat> = Vec::with_capacity(formats.len());
    for format in formats {
        if let Some(last) = result.last() {
            if last.offset == format.offset && is_plain_normal(last) && matches!(format.kind, FormatKind::Normal(_)) {
                result.pop();
            }
        }
        result.push(format);
    }
    result
}

fn closes(opener: &FormatKind, closer: &FormatKind) -> bool {
    matches!(
        (opener, closer),
        (FormatKind::Link(_), FormatKind::LinkEnd) | (FormatKind::MxpLink(_), FormatKind::MxpLinkEnd) | (FormatKind::MxpSend(_), FormatKind::MxpSendEnd)
    )
}

/// Drops a link opener whose closer follows at the same offset, looking past
/// the normal fragments pushed in between.
fn drop_zero_width_links(formats: Vec<LineFormat>) -> Vec<LineFormat> {
    let mut dropped = vec![false; formats.len()];
    for (i, opener) in formats.iter().enumerate() {
        let next = formats[i + 1..]
            .iter()
            .position(|f| f.offset != opener.offset || !is_plain_normal(f))
            .map(|p| i + 1 + p);
        if let Some(j) = next {
            let closer = &formats[j];
            if !dropped[i] && closer.offset == opener.offset && closes(&opener.kind, &closer.kind) {
                dropped[i] = true;
                dropped[j] = true;
            }
        }
    }
    formats.into_iter().zip(dropped).filter(|(_, dropped)| !dropped).map(|(format, _)| format).collect()
}
