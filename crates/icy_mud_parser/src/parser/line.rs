use std::mem;

use crate::{FontStyle, FormatKind, FramePayload, LineFormat, ParsedLine, ParserSink, TextStyle, prune_formats};

use super::{MudParser, ParserState};

/// The line being assembled.
#[derive(Debug, Default)]
pub(super) struct LineBuilder {
    pub text: String,
    /// Length of `text` in characters.
    pub len: usize,
    pub raw: String,
    pub formats: Vec<LineFormat>,
    pub gagged: bool,
}

impl LineBuilder {
    pub fn reset(&mut self) {
        self.text.clear();
        self.len = 0;
        self.raw.clear();
        self.formats.clear();
        self.gagged = false;
    }

    pub fn push_format(&mut self, kind: FormatKind) {
        self.formats.push(LineFormat::new(self.len, kind));
    }

    /// Removes the last character. Fragments past the new end are pulled back.
    pub fn pop_char(&mut self) -> bool {
        if self.text.pop().is_none() {
            return false;
        }
        self.len -= 1;
        for format in &mut self.formats {
            format.offset = format.offset.min(self.len);
        }
        true
    }

    fn mark_unicode(&mut self) {
        if let Some(style) = self.formats.iter_mut().rev().find_map(|f| match &mut f.kind {
            FormatKind::Normal(style) => Some(style),
            _ => None,
        }) {
            style.unicode = true;
        }
    }

    fn snapshot(&self, formats: Vec<LineFormat>, remote: bool) -> ParsedLine {
        ParsedLine {
            text: self.text.clone(),
            raw: self.raw.clone(),
            formats,
            fragment: true,
            gagged: self.gagged,
            remote,
        }
    }
}

impl MudParser {
    pub(super) fn put_char(&mut self, ch: char) {
        let ch = if self.sgr.attributes.contains(FontStyle::HIDDEN) { ' ' } else { ch };
        self.line.text.push(ch);
        self.line.len += 1;
        self.text_length += 1;
        if ch as u32 > 0xFF {
            self.line.mark_unicode();
        }
        let mut buf = [0u8; 4];
        self.security.capture(ch.encode_utf8(&mut buf));
        self.security.no_break = false;
    }

    pub(super) fn put_literal(&mut self, text: &str) {
        for ch in text.chars() {
            self.put_char(ch);
        }
    }

    /// Effective look: SGR state with the top MXP frame's overrides applied.
    fn current_style(&self) -> TextStyle {
        let frame = self.styles.top();
        let attributes = self.sgr.attributes;
        let bold = attributes.contains(FontStyle::BOLD);
        let faint = attributes.contains(FontStyle::FAINT);
        let mut fore = match frame.fore {
            Some(rgb) if bold => rgb.increase(0.5),
            Some(rgb) if faint => rgb.decrease(0.5),
            Some(rgb) => rgb,
            None => self.colors.foreground(&self.sgr.fore, bold, faint),
        };
        if frame.high {
            fore = fore.increase(0.25);
        }
        let mut back = frame.back.unwrap_or_else(|| self.colors.resolve(&self.sgr.back));
        // ANSI bold is rendered as a brighter color, not a heavier font
        let mut style = frame.style | attributes.difference(FontStyle::BOLD);
        if style.contains(FontStyle::INVERSE) {
            mem::swap(&mut fore, &mut back);
            style.remove(FontStyle::INVERSE);
        }
        if !self.options.enable_flashing {
            style.remove(FontStyle::BLINK);
        }
        TextStyle {
            fore,
            back,
            style,
            font: frame.font.clone(),
            size: frame.size.clone(),
            unicode: false,
            hr: false,
        }
    }

    /// Starts a new Normal fragment with the current look at the end of the line.
    pub(super) fn push_style_block(&mut self) {
        let style = self.current_style();
        let offset = self.line.len;
        if let Some(LineFormat {
            offset: last_offset,
            kind: FormatKind::Normal(last),
        }) = self.line.formats.last_mut()
        {
            if *last_offset == offset {
                *last = style;
                return;
            }
        }
        self.line.formats.push(LineFormat::new(offset, FormatKind::Normal(style)));
    }

    pub(super) fn push_hr(&mut self) {
        let style = TextStyle {
            hr: true,
            ..self.current_style()
        };
        self.line.push_format(FormatKind::Normal(style));
    }

    /// Resets the builder and reopens the links still open on the style stack.
    pub(super) fn start_line(&mut self) {
        self.line.reset();
        if self.options.enable_links {
            let reopened: Vec<FormatKind> = self
                .styles
                .open_links()
                .filter_map(|payload| match payload {
                    FramePayload::Link(link) => Some(FormatKind::MxpLink(link.clone())),
                    FramePayload::Send(link) => Some(FormatKind::MxpSend(link.clone())),
                    _ => None,
                })
                .collect();
            for kind in reopened {
                self.line.push_format(kind);
            }
        }
        self.push_style_block();
    }

    fn link_ends(&self) -> Vec<FormatKind> {
        if !self.options.enable_links {
            return Vec::new();
        }
        self.styles
            .open_links()
            .rev()
            .filter_map(|payload| match payload {
                FramePayload::Link(_) => Some(FormatKind::MxpLinkEnd),
                FramePayload::Send(_) => Some(FormatKind::MxpSendEnd),
                _ => None,
            })
            .collect()
    }

    /// Ends every open link at the current position, innermost first.
    pub(super) fn close_link_blocks(&mut self) {
        for end in self.link_ends() {
            self.line.push_format(end);
        }
    }

    /// Emits the line being built as a terminated line.
    pub(super) fn finish_line(&mut self, sink: &mut dyn ParserSink) {
        let formats = prune_formats(mem::take(&mut self.line.formats), self.line.len, false);
        let line = ParsedLine {
            text: mem::take(&mut self.line.text),
            raw: mem::take(&mut self.line.raw),
            formats,
            fragment: false,
            gagged: self.line.gagged,
            remote: self.remote,
        };
        self.lines.push(line);
        if let Some(line) = self.lines.last() {
            sink.add_line(line);
        }
        self.end_of_line = true;
        self.start_line();
    }

    /// Forced line break from markup or a screen clear.
    pub(super) fn break_line(&mut self, sink: &mut dyn ParserSink) {
        self.security.capture("\n");
        self.close_link_blocks();
        self.finish_line(sink);
        self.text_length += 1;
    }

    /// Emits the unterminated line as a soft line. The builder is left untouched
    /// so the next chunk continues it as if the input had never been split.
    pub(super) fn flush_soft(&mut self, sink: &mut dyn ParserSink) {
        if self.line.text.is_empty() {
            return;
        }
        let mut formats = self.line.formats.clone();
        if self.state == ParserState::UrlFound {
            if let Some((start, end, link)) = self.pending_url() {
                super::url::insert_link(&mut formats, start, end, link);
            }
        }
        for end in self.link_ends() {
            formats.push(LineFormat::new(self.line.len, end));
        }
        let formats = prune_formats(formats, self.line.len, true);
        self.lines.push(self.line.snapshot(formats, self.remote));
        if let Some(line) = self.lines.last() {
            sink.add_line(line);
        }
        self.end_of_line = false;
    }
}
